//! Retrying expectations.
//!
//! Each check polls through the retry engine, the same way the locator does,
//! instead of carrying its own loop.

use crate::clock::Clock;
use crate::driver::{Actionability, PageDriver};
use crate::locator::Selector;
use crate::result::{SpecError, SpecResult};
use crate::retry::{retry, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An expectation about the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Expectation {
    /// At least one element matches
    Exists {
        /// Target selector
        selector: Selector,
    },
    /// The first match is visible with a non-zero box
    Visible {
        /// Target selector
        selector: Selector,
    },
    /// The first match's text equals `text`
    TextEquals {
        /// Target selector
        selector: Selector,
        /// Expected text
        text: String,
    },
    /// The first match's text contains `text`
    TextContains {
        /// Target selector
        selector: Selector,
        /// Expected substring
        text: String,
    },
    /// The current URL contains `fragment`
    UrlContains {
        /// Expected substring
        fragment: String,
    },
}

impl Expectation {
    /// Selector the expectation targets, if any
    #[must_use]
    pub const fn selector(&self) -> Option<&Selector> {
        match self {
            Self::Exists { selector }
            | Self::Visible { selector }
            | Self::TextEquals { selector, .. }
            | Self::TextContains { selector, .. } => Some(selector),
            Self::UrlContains { .. } => None,
        }
    }

    fn check_once(&self, driver: &dyn PageDriver) -> SpecResult<()> {
        let Some(selector) = self.selector() else {
            let Self::UrlContains { fragment } = self else {
                return Ok(());
            };
            let url = driver.current_url().unwrap_or_default();
            return if url.contains(fragment.as_str()) {
                Ok(())
            } else {
                Err(SpecError::assertion(format!(
                    "expected url '{url}' to contain '{fragment}'"
                )))
            };
        };

        let found = driver.find_all(selector)?;
        let Some(first) = found.first() else {
            return Err(SpecError::NotFound {
                selector: selector.to_string(),
                elapsed_ms: 0,
            });
        };

        match self {
            Self::Exists { .. } | Self::UrlContains { .. } => Ok(()),
            Self::Visible { .. } => {
                let check = Actionability::of(first);
                if matches!(check, Actionability::Hidden | Actionability::ZeroSize { .. }) {
                    Err(SpecError::assertion_on(
                        selector.as_str(),
                        format!("expected {selector} to be visible, but it {}", check.reason()),
                    ))
                } else {
                    Ok(())
                }
            }
            Self::TextEquals { text, .. } => {
                let actual = driver.text_of(first)?;
                if actual == *text {
                    Ok(())
                } else {
                    Err(SpecError::assertion_on(
                        selector.as_str(),
                        format!("expected {selector} to have text '{text}', but the text was '{actual}'"),
                    ))
                }
            }
            Self::TextContains { text, .. } => {
                let actual = driver.text_of(first)?;
                if actual.contains(text.as_str()) {
                    Ok(())
                } else {
                    Err(SpecError::assertion_on(
                        selector.as_str(),
                        format!("expected {selector} to contain '{text}', but the text was '{actual}'"),
                    ))
                }
            }
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists { selector } => write!(f, "get({selector}).should('exist')"),
            Self::Visible { selector } => write!(f, "get({selector}).should('be.visible')"),
            Self::TextEquals { selector, text } => {
                write!(f, "get({selector}).should('have.text', {text:?})")
            }
            Self::TextContains { selector, text } => {
                write!(f, "get({selector}).should('contain', {text:?})")
            }
            Self::UrlContains { fragment } => write!(f, "url().should('include', {fragment:?})"),
        }
    }
}

/// Poll until `expectation` holds.
///
/// # Errors
///
/// - [`SpecError::NotFound`] when the target never appeared
/// - [`SpecError::Assertion`] when the target appeared but the expectation
///   stayed false until the timeout
/// - non-retryable driver errors as-is
pub fn verify(
    driver: &dyn PageDriver,
    expectation: &Expectation,
    config: &RetryConfig,
    clock: &dyn Clock,
) -> SpecResult<()> {
    tracing::debug!(%expectation, "verifying");
    match retry(clock, config, || expectation.check_once(driver)) {
        Ok(()) => Ok(()),
        Err(SpecError::Timeout { ms, last, .. }) => Err(match *last {
            SpecError::Assertion { selector, message } => SpecError::Assertion {
                selector,
                message: format!("Timed out retrying after {ms}ms: {message}"),
            },
            SpecError::NotFound { selector, .. } | SpecError::Detached { selector } => {
                SpecError::NotFound {
                    selector,
                    elapsed_ms: ms,
                }
            }
            other => other,
        }),
        Err(other) => Err(other),
    }
}
