//! Selectors and the element locator.
//!
//! # Design Philosophy
//!
//! - **Auto-Waiting**: lookup polls the driver through the retry engine
//!   until the selector matches or the timeout elapses
//! - **Opaque selectors**: the locator never interprets selector syntax; the
//!   driver decides what matches
//! - **First match wins**: several matches are not an error

use crate::clock::{millis_between, Clock};
use crate::driver::{ElementHandle, PageDriver};
use crate::result::{SpecError, SpecResult};
use crate::retry::{retry, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest selector accepted
pub const MAX_SELECTOR_LEN: usize = 4096;

/// Opaque selector string (CSS-like path, attribute match or structural path).
///
/// Identity is the trimmed string, so two selectors compare equal exactly
/// when the driver would be asked the same question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector(String);

impl Selector {
    /// Create a selector, rejecting empty or oversized input
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidSelector`] for blank or too-long selectors
    pub fn new(raw: impl AsRef<str>) -> SpecResult<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SpecError::InvalidSelector {
                selector: raw.as_ref().to_string(),
                reason: "selector is empty".to_string(),
            });
        }
        if trimmed.len() > MAX_SELECTOR_LEN {
            return Err(SpecError::InvalidSelector {
                selector: format!("{}...", trimmed.chars().take(32).collect::<String>()),
                reason: format!("selector exceeds {MAX_SELECTOR_LEN} bytes"),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Selector text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Selector {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = SpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.0
    }
}

/// A selector bound to its retry settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    config: RetryConfig,
}

impl Locator {
    /// Create a locator with the default retry settings
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            config: RetryConfig::default(),
        }
    }

    /// Override the retry settings
    #[must_use]
    pub const fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Override only the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the retry settings
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Resolve to the first matching element
    ///
    /// # Errors
    ///
    /// See [`locate`]
    pub fn locate(&self, driver: &dyn PageDriver, clock: &dyn Clock) -> SpecResult<ElementHandle> {
        locate(driver, &self.selector, &self.config, clock)
    }

    /// Resolve to every matching element
    ///
    /// # Errors
    ///
    /// See [`locate_all`]
    pub fn locate_all(
        &self,
        driver: &dyn PageDriver,
        clock: &dyn Clock,
    ) -> SpecResult<Vec<ElementHandle>> {
        locate_all(driver, &self.selector, &self.config, clock)
    }
}

/// Poll the driver until `selector` matches at least one element.
///
/// Transient [`SpecError::Detached`] reports are swallowed until the timeout.
///
/// # Errors
///
/// Returns [`SpecError::NotFound`] with the elapsed time when nothing matched
/// before the timeout, or any non-retryable driver error as-is.
pub fn locate_all(
    driver: &dyn PageDriver,
    selector: &Selector,
    config: &RetryConfig,
    clock: &dyn Clock,
) -> SpecResult<Vec<ElementHandle>> {
    let start = clock.now();
    tracing::debug!(%selector, timeout_ms = config.timeout_ms(), "locating");

    let result = retry(clock, config, || {
        let found = driver.find_all(selector)?;
        if found.is_empty() {
            Err(SpecError::NotFound {
                selector: selector.to_string(),
                elapsed_ms: millis_between(start, clock.now()),
            })
        } else {
            Ok(found)
        }
    });

    match result {
        Ok(found) => {
            tracing::debug!(%selector, matches = found.len(), "located");
            Ok(found)
        }
        Err(SpecError::Timeout { ms, .. }) => Err(SpecError::NotFound {
            selector: selector.to_string(),
            elapsed_ms: ms,
        }),
        Err(other) => Err(other),
    }
}

/// Poll the driver until `selector` matches and return the first match.
///
/// # Errors
///
/// Same as [`locate_all`]
pub fn locate(
    driver: &dyn PageDriver,
    selector: &Selector,
    config: &RetryConfig,
    clock: &dyn Clock,
) -> SpecResult<ElementHandle> {
    let mut found = locate_all(driver, selector, config, clock)?;
    Ok(found.swap_remove(0))
}
