//! Action executor: type and click against resolved elements.

use crate::clock::Clock;
use crate::driver::{Actionability, ElementHandle, PageDriver};
use crate::locator::{locate, Selector};
use crate::result::{SpecError, SpecResult};
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Type text into the element
    Type {
        /// Text to type
        text: String,
    },
    /// Click the element
    Click,
}

impl ActionKind {
    /// Command name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Type { .. } => "type",
            Self::Click => "click",
        }
    }
}

/// Per-action options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOptions {
    /// Skip the actionability check (element must still exist)
    #[serde(default)]
    pub force: bool,
}

/// A single interaction request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    selector: Selector,
    kind: ActionKind,
    #[serde(default)]
    options: ActionOptions,
}

impl ActionRequest {
    /// Click request
    #[must_use]
    pub const fn click(selector: Selector) -> Self {
        Self {
            selector,
            kind: ActionKind::Click,
            options: ActionOptions { force: false },
        }
    }

    /// Type request
    #[must_use]
    pub fn type_text(selector: Selector, text: impl Into<String>) -> Self {
        Self {
            selector,
            kind: ActionKind::Type { text: text.into() },
            options: ActionOptions::default(),
        }
    }

    /// Same request with the force override set
    #[must_use]
    pub const fn forced(mut self, force: bool) -> Self {
        self.options.force = force;
        self
    }

    /// Target selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Interaction kind
    #[must_use]
    pub const fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Options
    #[must_use]
    pub const fn options(&self) -> ActionOptions {
        self.options
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ActionKind::Type { text } => write!(f, "get({}).type({text:?})", self.selector)?,
            ActionKind::Click => write!(f, "get({}).click()", self.selector)?,
        }
        if self.options.force {
            f.write_str(" {force: true}")?;
        }
        Ok(())
    }
}

/// Perform `request` against an already-resolved element.
///
/// Unless `force` is set, the element must pass the driver's actionability
/// check first. `force` skips only that check.
///
/// # Errors
///
/// Returns [`SpecError::NotActionable`] when the check fails, or whatever
/// the driver reports for the interaction itself.
pub fn perform(
    driver: &mut dyn PageDriver,
    handle: &ElementHandle,
    request: &ActionRequest,
) -> SpecResult<()> {
    if request.options.force {
        tracing::debug!(selector = %request.selector, "force set, skipping actionability");
    } else if !driver.is_actionable(handle)? {
        let check = Actionability::of(handle);
        let reason = if check.is_actionable() {
            "was rejected by the page driver".to_string()
        } else {
            check.reason()
        };
        return Err(SpecError::NotActionable {
            selector: request.selector.to_string(),
            reason,
        });
    }

    tracing::debug!(action = %request, element = %handle.id, "performing");
    match &request.kind {
        ActionKind::Type { text } => driver.type_into(handle, text),
        ActionKind::Click => driver.click(handle),
    }
}

/// Locate the request's target with retry, then perform the action.
///
/// # Errors
///
/// Propagates locator failures ([`SpecError::NotFound`]) and [`perform`]
/// failures.
pub fn execute(
    driver: &mut dyn PageDriver,
    request: &ActionRequest,
    config: &RetryConfig,
    clock: &dyn Clock,
) -> SpecResult<()> {
    let handle = locate(&*driver, &request.selector, config, clock)?;
    perform(driver, &handle, request)
}
