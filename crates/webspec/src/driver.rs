//! Page driver abstraction.
//!
//! The runner never talks to a browser directly. Everything it needs from a
//! page (element lookup, actionability, typing, clicking, navigation) goes
//! through [`PageDriver`], passed explicitly into every call. Implementations
//! include the in-memory [`crate::site::SiteDriver`] and [`MockDriver`].

use crate::locator::Selector;
use crate::result::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Bounding box for an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box with the given size at the origin
    #[must_use]
    pub const fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Whether either dimension collapses to zero
    #[must_use]
    pub fn is_zero_size(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Snapshot of a located element.
///
/// Not guaranteed valid across navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identity, stable while the page is loaded
    pub id: String,
    /// Selector the element was located with
    pub selector: Selector,
    /// Element tag name
    pub tag: String,
    /// Text content
    pub text: Option<String>,
    /// Layout box, if the element is rendered
    pub bounding_box: Option<BoundingBox>,
    /// Whether the element is visible
    pub visible: bool,
    /// Whether another element covers it
    pub obscured: bool,
}

impl ElementHandle {
    /// Create a visible handle with no layout information
    #[must_use]
    pub fn new(id: impl Into<String>, selector: Selector, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selector,
            tag: tag.into(),
            text: None,
            bounding_box: None,
            visible: true,
            obscured: false,
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the layout box
    #[must_use]
    pub const fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Mark as covered by another element
    #[must_use]
    pub const fn with_obscured(mut self, obscured: bool) -> Self {
        self.obscured = obscured;
        self
    }

    /// Size of the layout box as `(width, height)`, zero when unrendered
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        self.bounding_box
            .map_or((0.0, 0.0), |b| (b.width.max(0.0), b.height.max(0.0)))
    }
}

/// Result of an actionability check
#[derive(Debug, Clone, PartialEq)]
pub enum Actionability {
    /// Element can receive a genuine interaction
    Actionable,
    /// Element is hidden
    Hidden,
    /// Element has no area
    ZeroSize {
        /// Effective width
        width: f32,
        /// Effective height
        height: f32,
    },
    /// Element is covered by another element
    Obscured,
}

impl Actionability {
    /// Evaluate a handle: visible, non-zero bounding box, not obscured
    #[must_use]
    pub fn of(handle: &ElementHandle) -> Self {
        if !handle.visible {
            return Self::Hidden;
        }
        match handle.bounding_box {
            Some(b) if !b.is_zero_size() => {}
            _ => {
                let (width, height) = handle.size();
                return Self::ZeroSize { width, height };
            }
        }
        if handle.obscured {
            return Self::Obscured;
        }
        Self::Actionable
    }

    /// Whether the check passed
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self, Self::Actionable)
    }

    /// Human-readable reason, phrased to follow "it ..."
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Actionable => "is actionable".to_string(),
            Self::Hidden => "is not visible".to_string(),
            Self::ZeroSize { width, height } => format!(
                "has an effective width and height of {width}px x {height}px"
            ),
            Self::Obscured => "is being covered by another element".to_string(),
        }
    }
}

/// Capability-abstracted page driver.
///
/// Read-only queries take `&self` so the locator can poll without exclusive
/// access; interactions take `&mut self`.
pub trait PageDriver {
    /// Short driver name for reports
    fn name(&self) -> &str {
        "page"
    }

    /// All elements currently matching `selector`, possibly none.
    ///
    /// Transient "not attached yet" conditions are reported as
    /// [`SpecError::Detached`] so the locator can retry them.
    fn find_all(&self, selector: &Selector) -> SpecResult<Vec<ElementHandle>>;

    /// Whether the element can receive a genuine user interaction
    fn is_actionable(&self, handle: &ElementHandle) -> SpecResult<bool> {
        Ok(Actionability::of(handle).is_actionable())
    }

    /// Type text into the element
    fn type_into(&mut self, handle: &ElementHandle, text: &str) -> SpecResult<()>;

    /// Click the element
    fn click(&mut self, handle: &ElementHandle) -> SpecResult<()>;

    /// Load a URL
    fn navigate(&mut self, url: &str) -> SpecResult<()>;

    /// URL of the loaded page
    fn current_url(&self) -> Option<String>;

    /// Current text (or typed value) of the element
    fn text_of(&self, handle: &ElementHandle) -> SpecResult<String> {
        Ok(handle.text.clone().unwrap_or_default())
    }

    /// Return to a blank page with no state left from earlier interactions.
    ///
    /// Called before every executed case.
    fn reset(&mut self) -> SpecResult<()> {
        Ok(())
    }
}

/// Scripted driver for unit tests.
///
/// Elements are registered per selector; every call is appended to a call
/// history for verification.
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Current URL
    pub current_url: Option<String>,
    /// Registered elements
    pub elements: Vec<ElementHandle>,
    /// Call history, e.g. `click:#submit`
    pub call_history: Vec<String>,
    /// Number of `find_all` calls that report the page as detached
    pub detached_polls: Cell<u32>,
    /// Selector whose click panics, to simulate a crashing case body
    pub panic_on_click: Option<String>,
}

impl MockDriver {
    /// Create a new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element
    pub fn add_element(&mut self, element: ElementHandle) {
        self.elements.push(element);
    }

    /// Register a visible 100x20 element with the given selector
    ///
    /// # Panics
    ///
    /// Panics if `selector` is blank.
    #[must_use]
    pub fn with_element(mut self, selector: &str) -> Self {
        let selector = Selector::new(selector).expect("valid selector");
        let id = format!("mock-{}", self.elements.len());
        self.add_element(
            ElementHandle::new(id, selector, "div")
                .with_bounding_box(BoundingBox::sized(100.0, 20.0)),
        );
        self
    }

    /// Check if a call with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(prefix))
    }
}

impl PageDriver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn find_all(&self, selector: &Selector) -> SpecResult<Vec<ElementHandle>> {
        let remaining = self.detached_polls.get();
        if remaining > 0 {
            self.detached_polls.set(remaining - 1);
            return Err(SpecError::Detached {
                selector: selector.to_string(),
            });
        }
        Ok(self
            .elements
            .iter()
            .filter(|e| &e.selector == selector)
            .cloned()
            .collect())
    }

    fn type_into(&mut self, handle: &ElementHandle, text: &str) -> SpecResult<()> {
        self.call_history
            .push(format!("type:{}:{text}", handle.selector));
        Ok(())
    }

    fn click(&mut self, handle: &ElementHandle) -> SpecResult<()> {
        if self.panic_on_click.as_deref() == Some(handle.selector.as_str()) {
            panic!("driver crashed clicking {}", handle.selector);
        }
        self.call_history.push(format!("click:{}", handle.selector));
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> SpecResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        self.current_url = Some(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.current_url.clone()
    }

    fn reset(&mut self) -> SpecResult<()> {
        self.current_url = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn handle(selector: &str) -> ElementHandle {
        ElementHandle::new("e1", Selector::new(selector).unwrap(), "button")
    }

    mod actionability_tests {
        use super::*;

        #[test]
        fn test_visible_sized_element_is_actionable() {
            let h = handle("#ok").with_bounding_box(BoundingBox::sized(80.0, 24.0));
            assert_eq!(Actionability::of(&h), Actionability::Actionable);
        }

        #[test]
        fn test_zero_size_element() {
            let h = handle("#contact-us").with_bounding_box(BoundingBox::sized(0.0, 0.0));
            let check = Actionability::of(&h);
            assert!(!check.is_actionable());
            assert_eq!(
                check.reason(),
                "has an effective width and height of 0px x 0px"
            );
        }

        #[test]
        fn test_unrendered_element_counts_as_zero_size() {
            let check = Actionability::of(&handle("#ghost"));
            assert!(matches!(check, Actionability::ZeroSize { .. }));
        }

        #[test]
        fn test_hidden_and_obscured() {
            let sized = BoundingBox::sized(10.0, 10.0);
            let hidden = handle("#h").with_bounding_box(sized).with_visible(false);
            let covered = handle("#c").with_bounding_box(sized).with_obscured(true);
            assert_eq!(Actionability::of(&hidden), Actionability::Hidden);
            assert_eq!(Actionability::of(&covered), Actionability::Obscured);
            assert!(Actionability::of(&covered).reason().contains("covered"));
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[test]
        fn test_find_all_filters_by_selector() {
            let driver = MockDriver::new().with_element("#a").with_element("#b");
            let found = driver.find_all(&Selector::new("#b").unwrap()).unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].selector.as_str(), "#b");
        }

        #[test]
        fn test_detached_polls_count_down() {
            let driver = MockDriver::new().with_element("#a");
            driver.detached_polls.set(1);
            let sel = Selector::new("#a").unwrap();
            assert!(matches!(
                driver.find_all(&sel),
                Err(SpecError::Detached { .. })
            ));
            assert_eq!(driver.find_all(&sel).unwrap().len(), 1);
        }

        #[test]
        fn test_call_history() {
            let mut driver = MockDriver::new().with_element("#a");
            driver.navigate("http://localhost/").unwrap();
            let h = driver.find_all(&Selector::new("#a").unwrap()).unwrap()[0].clone();
            driver.click(&h).unwrap();
            assert!(driver.was_called("navigate:http://localhost/"));
            assert!(driver.was_called("click:#a"));
            assert_eq!(driver.current_url().as_deref(), Some("http://localhost/"));
        }
    }
}
