//! Static site driver.
//!
//! An in-memory page model loaded from YAML that implements [`PageDriver`].
//! It lets spec files run without a browser:
//!
//! ```yaml
//! pages:
//!   http://localhost/contact:
//!     elements:
//!       - selectors: ['[name="first_name"]']
//!         tag: input
//!       - selectors: ['#contact-us']
//!         width: 0
//!         height: 0
//!         navigates_to: http://localhost/thank-you
//!   http://localhost/thank-you:
//!     elements:
//!       - selectors: ['#contact_reply h1']
//!         text: Thank You for your Message!
//!         appears_after_ms: 300
//! ```
//!
//! Time for `appears_after_ms` and `detached_until_ms` is measured from the
//! last navigation, read through the shared [`Clock`](crate::clock::Clock).

use crate::clock::SharedClock;
use crate::driver::{BoundingBox, ElementHandle, PageDriver};
use crate::locator::Selector;
use crate::result::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

fn default_tag() -> String {
    "div".to_string()
}

const fn default_width() -> f32 {
    100.0
}

const fn default_height() -> f32 {
    20.0
}

const fn default_true() -> bool {
    true
}

/// Element description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementSpec {
    /// Selectors this element answers to
    pub selectors: Vec<String>,
    /// Tag name
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Initial text
    #[serde(default)]
    pub text: String,
    /// Rendered width in px
    #[serde(default = "default_width")]
    pub width: f32,
    /// Rendered height in px
    #[serde(default = "default_height")]
    pub height: f32,
    /// Visible
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Covered by another element
    #[serde(default)]
    pub obscured: bool,
    /// Not matched until this long after page load
    #[serde(default)]
    pub appears_after_ms: u64,
    /// Reported as detached until this long after page load
    #[serde(default)]
    pub detached_until_ms: u64,
    /// Clicking loads this URL
    #[serde(default)]
    pub navigates_to: Option<String>,
}

/// Page description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Elements in document order
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

/// Whole site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSpec {
    /// Pages keyed by URL
    #[serde(default)]
    pub pages: BTreeMap<String, PageSpec>,
}

/// URLs compare without a trailing slash
fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Driver backed by a [`SiteSpec`]
#[derive(Debug)]
pub struct SiteDriver {
    pages: BTreeMap<String, PageSpec>,
    clock: SharedClock,
    current: Option<String>,
    loaded_at: Duration,
    values: HashMap<usize, String>,
    history: Vec<String>,
}

impl SiteDriver {
    /// Build a driver from a parsed site
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Config`] when an element has no selectors or
    /// links to an unknown page.
    pub fn new(site: SiteSpec, clock: SharedClock) -> SpecResult<Self> {
        let pages: BTreeMap<String, PageSpec> = site
            .pages
            .into_iter()
            .map(|(url, page)| (normalize_url(&url), page))
            .collect();

        for (url, page) in &pages {
            for (index, element) in page.elements.iter().enumerate() {
                if element.selectors.iter().all(|s| s.trim().is_empty()) {
                    return Err(SpecError::config(format!(
                        "site page {url}: element {} has no selectors",
                        index + 1
                    )));
                }
                if let Some(target) = &element.navigates_to {
                    if !pages.contains_key(&normalize_url(target)) {
                        return Err(SpecError::config(format!(
                            "site page {url}: element {} links to unknown page {target}",
                            index + 1
                        )));
                    }
                }
            }
        }

        Ok(Self {
            pages,
            clock,
            current: None,
            loaded_at: Duration::ZERO,
            values: HashMap::new(),
            history: Vec::new(),
        })
    }

    /// Parse a YAML site description
    ///
    /// # Errors
    ///
    /// Returns a YAML error for malformed input, otherwise see [`Self::new`].
    pub fn from_yaml(yaml: &str, clock: SharedClock) -> SpecResult<Self> {
        let site: SiteSpec = serde_yaml_ng::from_str(yaml)?;
        Self::new(site, clock)
    }

    /// Load a YAML site description from disk
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise see
    /// [`Self::from_yaml`].
    pub fn load(path: &Path, clock: SharedClock) -> SpecResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        let driver = Self::from_yaml(&yaml, clock)?;
        tracing::debug!(path = %path.display(), pages = driver.pages.len(), "loaded site");
        Ok(driver)
    }

    /// Number of pages
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Title of the loaded page
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        let url = self.current.as_ref()?;
        self.pages.get(url).map(|p| p.title.as_str())
    }

    /// Interactions performed so far, e.g. `click:#contact-us`
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn page(&self) -> SpecResult<(&str, &PageSpec)> {
        let url = self
            .current
            .as_deref()
            .ok_or_else(|| SpecError::driver("no page loaded; visit a URL first"))?;
        let page = self
            .pages
            .get(url)
            .ok_or_else(|| SpecError::driver(format!("loaded page {url} vanished")))?;
        Ok((url, page))
    }

    fn since_load(&self) -> Duration {
        self.clock.now().saturating_sub(self.loaded_at)
    }

    /// Resolve a handle to an element index on the loaded page
    fn element_index(&self, handle: &ElementHandle) -> SpecResult<usize> {
        let (url, page) = self.page()?;
        let detached = || SpecError::Detached {
            selector: handle.selector.to_string(),
        };
        let (index, page_url) = handle
            .id
            .strip_prefix('e')
            .and_then(|rest| rest.split_once('@'))
            .ok_or_else(detached)?;
        let index: usize = index.parse().map_err(|_| detached())?;
        if page_url != url || index >= page.elements.len() {
            return Err(detached());
        }
        Ok(index)
    }

    fn current_text(&self, index: usize, element: &ElementSpec) -> String {
        self.values
            .get(&index)
            .cloned()
            .unwrap_or_else(|| element.text.clone())
    }
}

impl PageDriver for SiteDriver {
    fn name(&self) -> &str {
        "static"
    }

    fn find_all(&self, selector: &Selector) -> SpecResult<Vec<ElementHandle>> {
        let (url, page) = self.page()?;
        let since_load = self.since_load();
        let mut found = Vec::new();

        for (index, element) in page.elements.iter().enumerate() {
            if !element.selectors.iter().any(|s| s.trim() == selector.as_str()) {
                continue;
            }
            if since_load < Duration::from_millis(element.appears_after_ms) {
                continue;
            }
            if since_load < Duration::from_millis(element.detached_until_ms) {
                return Err(SpecError::Detached {
                    selector: selector.to_string(),
                });
            }
            found.push(
                ElementHandle::new(format!("e{index}@{url}"), selector.clone(), &element.tag)
                    .with_text(self.current_text(index, element))
                    .with_bounding_box(BoundingBox::sized(element.width, element.height))
                    .with_visible(element.visible)
                    .with_obscured(element.obscured),
            );
        }
        Ok(found)
    }

    fn type_into(&mut self, handle: &ElementHandle, text: &str) -> SpecResult<()> {
        let index = self.element_index(handle)?;
        let (_, page) = self.page()?;
        let mut value = self.current_text(index, &page.elements[index]);
        value.push_str(text);
        self.values.insert(index, value);
        self.history.push(format!("type:{}:{text}", handle.selector));
        Ok(())
    }

    fn click(&mut self, handle: &ElementHandle) -> SpecResult<()> {
        let index = self.element_index(handle)?;
        let (_, page) = self.page()?;
        let target = page.elements[index].navigates_to.clone();
        self.history.push(format!("click:{}", handle.selector));
        if let Some(target) = target {
            self.navigate(&target)?;
        }
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> SpecResult<()> {
        let key = normalize_url(url);
        if !self.pages.contains_key(&key) {
            return Err(SpecError::Navigation {
                url: url.to_string(),
                message: "no such page in the site description".to_string(),
            });
        }
        tracing::debug!(url = %key, "navigating");
        self.history.push(format!("navigate:{key}"));
        self.current = Some(key);
        self.loaded_at = self.clock.now();
        self.values.clear();
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.current.clone()
    }

    fn text_of(&self, handle: &ElementHandle) -> SpecResult<String> {
        let index = self.element_index(handle)?;
        let (_, page) = self.page()?;
        Ok(self.current_text(index, &page.elements[index]))
    }

    fn reset(&mut self) -> SpecResult<()> {
        self.current = None;
        self.loaded_at = self.clock.now();
        self.values.clear();
        self.history.push("reset".to_string());
        Ok(())
    }
}
