//! YAML spec files.
//!
//! A spec file holds one group document, or a list of them:
//!
//! ```yaml
//! describe: contact form
//! cases:
//!   - it: submits a message
//!     steps:
//!       - visit: http://localhost/contact
//!       - get: '[name="first_name"]'
//!         type: "{{user.first_name}}"
//!       - get: '#contact-us'
//!         click: { force: true }
//!       - expect: { selector: '#contact_reply h1', contains: Thank You }
//!       - url_contains: thank-you
//!       - wait: 100
//! groups:
//!   - describe: nested
//!     only: true
//!     cases: []
//! ```
//!
//! Within a group, cases register before nested groups. Files are discovered
//! with a glob pattern that may contain `{a,b}` alternatives.

use crate::action::ActionRequest;
use crate::expect::Expectation;
use crate::fixture::Fixtures;
use crate::locator::Selector;
use crate::registry::{Node, Registry, Step, TestCase, TestGroup};
use crate::result::{SpecError, SpecResult};
use globset::GlobBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Group document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    /// Group name
    pub describe: String,
    /// Exclusive group
    #[serde(default)]
    pub only: bool,
    /// Skipped group
    #[serde(default)]
    pub skip: bool,
    /// Cases
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
    /// Nested groups
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

/// Case document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    /// Case name
    pub it: String,
    /// Exclusive case
    #[serde(default)]
    pub only: bool,
    /// Skipped case
    #[serde(default)]
    pub skip: bool,
    /// Retry timeout override
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Steps
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// `click: true` or `click: { force: true }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClickSpec {
    /// Bare flag
    Flag(bool),
    /// With options
    Options {
        /// Skip the actionability check
        #[serde(default)]
        force: bool,
    },
}

/// `expect:` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectSpec {
    /// Target selector
    pub selector: String,
    /// Exact text
    #[serde(default)]
    pub text: Option<String>,
    /// Substring
    #[serde(default)]
    pub contains: Option<String>,
    /// Must be visible
    #[serde(default)]
    pub visible: Option<bool>,
    /// Must exist
    #[serde(default)]
    pub exists: Option<bool>,
}

/// One step. Exactly one verb key must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    /// Load a URL
    #[serde(default)]
    pub visit: Option<String>,
    /// Target selector for `type` / `click`
    #[serde(default)]
    pub get: Option<String>,
    /// Text to type
    #[serde(default, rename = "type")]
    pub type_text: Option<String>,
    /// Click
    #[serde(default)]
    pub click: Option<ClickSpec>,
    /// Force flag for `type`, or for `click: true`
    #[serde(default)]
    pub force: bool,
    /// Expectation on an element
    #[serde(default)]
    pub expect: Option<ExpectSpec>,
    /// Expectation on the URL
    #[serde(default)]
    pub url_contains: Option<String>,
    /// Pause in milliseconds
    #[serde(default)]
    pub wait: Option<u64>,
}

/// Converts parsed documents into registry nodes for one file
struct Converter<'a> {
    origin: &'a str,
    fixtures: &'a Fixtures,
}

impl Converter<'_> {
    fn error(&self, message: impl Into<String>) -> SpecError {
        SpecError::SpecFile {
            path: self.origin.to_string(),
            message: message.into(),
        }
    }

    fn selector(&self, raw: &str) -> SpecResult<Selector> {
        Selector::new(raw).map_err(|e| self.error(e.to_string()))
    }

    fn text(&self, raw: &str) -> SpecResult<String> {
        self.fixtures
            .render(raw)
            .map_err(|e| self.error(e.to_string()))
    }

    fn group(&self, spec: &GroupSpec) -> SpecResult<TestGroup> {
        let mut group = TestGroup::new(spec.describe.clone());
        group.exclusive = spec.only;
        group.skipped = spec.skip;
        for case in &spec.cases {
            group.children.push(Node::Case(self.case(case)?));
        }
        for nested in &spec.groups {
            group.children.push(Node::Group(self.group(nested)?));
        }
        Ok(group)
    }

    fn case(&self, spec: &CaseSpec) -> SpecResult<TestCase> {
        let mut case = TestCase::new(spec.it.clone());
        case.exclusive = spec.only;
        case.skipped = spec.skip;
        case.timeout_ms = spec.timeout_ms;
        for (index, step) in spec.steps.iter().enumerate() {
            let step = self.step(step).map_err(|e| match e {
                SpecError::SpecFile { path, message } => SpecError::SpecFile {
                    path,
                    message: format!("case '{}', step {}: {message}", spec.it, index + 1),
                },
                other => other,
            })?;
            case.body.push(step);
        }
        Ok(case)
    }

    fn step(&self, spec: &StepSpec) -> SpecResult<Step> {
        let verbs = [
            spec.visit.is_some(),
            spec.type_text.is_some(),
            spec.click.is_some(),
            spec.expect.is_some(),
            spec.url_contains.is_some(),
            spec.wait.is_some(),
        ]
        .iter()
        .filter(|v| **v)
        .count();
        if verbs != 1 {
            return Err(self.error(format!(
                "expected exactly one of visit, type, click, expect, url_contains, wait (found {verbs})"
            )));
        }

        let needs_target = spec.type_text.is_some() || spec.click.is_some();
        if needs_target != spec.get.is_some() {
            return Err(self.error(if needs_target {
                "type and click need a 'get' selector"
            } else {
                "'get' is only valid with type or click"
            }));
        }

        if let Some(url) = &spec.visit {
            return Ok(Step::visit(self.text(url)?));
        }
        if let Some(ms) = spec.wait {
            return Ok(Step::wait(ms));
        }
        if let Some(fragment) = &spec.url_contains {
            return Ok(Step::expect(Expectation::UrlContains {
                fragment: self.text(fragment)?,
            }));
        }
        if let Some(expect) = &spec.expect {
            return self.expectation(expect).map(Step::expect);
        }

        let selector = self.selector(spec.get.as_deref().unwrap_or_default())?;
        if let Some(text) = &spec.type_text {
            let request = ActionRequest::type_text(selector, self.text(text)?).forced(spec.force);
            return Ok(Step::action(request));
        }
        let force = match spec.click {
            Some(ClickSpec::Flag(false)) => {
                return Err(self.error("'click: false' is not a step"));
            }
            Some(ClickSpec::Options { force }) => force || spec.force,
            _ => spec.force,
        };
        Ok(Step::action(ActionRequest::click(selector).forced(force)))
    }

    fn expectation(&self, spec: &ExpectSpec) -> SpecResult<Expectation> {
        let selector = self.selector(&spec.selector)?;
        let checks = [
            spec.text.is_some(),
            spec.contains.is_some(),
            spec.visible.is_some(),
            spec.exists.is_some(),
        ]
        .iter()
        .filter(|v| **v)
        .count();
        if checks > 1 {
            return Err(self.error("expect takes one of text, contains, visible, exists"));
        }
        if spec.visible == Some(false) || spec.exists == Some(false) {
            return Err(self.error("negative expectations are not supported"));
        }

        Ok(if let Some(text) = &spec.text {
            Expectation::TextEquals {
                selector,
                text: self.text(text)?,
            }
        } else if let Some(text) = &spec.contains {
            Expectation::TextContains {
                selector,
                text: self.text(text)?,
            }
        } else if spec.visible.is_some() {
            Expectation::Visible { selector }
        } else {
            Expectation::Exists { selector }
        })
    }
}

/// Parse a spec document. `origin` names the source in errors.
///
/// # Errors
///
/// Returns [`SpecError::SpecFile`] for malformed YAML, invalid steps or
/// unresolved fixture placeholders.
pub fn load_str(yaml: &str, origin: &str, fixtures: &Fixtures) -> SpecResult<Registry> {
    let parse_error = |e: serde_yaml_ng::Error| SpecError::SpecFile {
        path: origin.to_string(),
        message: e.to_string(),
    };
    // Decide the document shape first so field errors keep their detail.
    let document: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml).map_err(parse_error)?;
    let groups: Vec<GroupSpec> = if document.is_sequence() {
        serde_yaml_ng::from_value(document).map_err(parse_error)?
    } else {
        vec![serde_yaml_ng::from_value(document).map_err(parse_error)?]
    };

    let converter = Converter { origin, fixtures };
    let nodes = groups
        .iter()
        .map(|g| converter.group(g).map(Node::Group))
        .collect::<SpecResult<Vec<_>>>()?;
    Ok(Registry::from_nodes(nodes))
}

/// Load one spec file
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, otherwise see [`load_str`].
pub fn load_file(path: &Path, fixtures: &Fixtures) -> SpecResult<Registry> {
    let yaml = std::fs::read_to_string(path)?;
    let registry = load_str(&yaml, &path.display().to_string(), fixtures)?;
    tracing::debug!(path = %path.display(), cases = registry.len(), "loaded spec file");
    Ok(registry)
}

/// Leading components of `pattern` that contain no glob syntax
fn literal_root(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| {
            !c.as_os_str()
                .to_string_lossy()
                .contains(|ch| matches!(ch, '*' | '?' | '[' | '{'))
        })
        .collect()
}

/// Find spec files matching `pattern` under `base`, sorted.
///
/// The pattern is a glob relative to `base` (or absolute) and may use
/// `**` and `{a,b}` alternatives. Only the directory below the pattern's
/// literal prefix is walked.
///
/// # Errors
///
/// Returns [`SpecError::Config`] for an invalid pattern and an I/O error for
/// unreadable directories.
pub fn discover(pattern: &str, base: &Path) -> SpecResult<Vec<PathBuf>> {
    let pattern = pattern.trim().trim_start_matches("./");
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| SpecError::config(format!("invalid spec pattern '{pattern}': {e}")))?
        .compile_matcher();

    let root = base.join(literal_root(pattern));
    let mut found = Vec::new();
    if !root.exists() {
        tracing::debug!(pattern, root = %root.display(), "spec root does not exist");
        return Ok(found);
    }

    let absolute = Path::new(pattern).is_absolute();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let candidate = if absolute {
            entry.path()
        } else {
            match entry.path().strip_prefix(base) {
                Ok(relative) => relative,
                Err(_) => continue,
            }
        };
        if matcher.is_match(candidate) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    tracing::debug!(pattern, files = found.len(), "discovered spec files");
    Ok(found)
}

/// Discover and load every spec file matching `pattern`, merged in path order
///
/// # Errors
///
/// See [`discover`] and [`load_file`].
pub fn load_pattern(
    pattern: &str,
    base: &Path,
    fixtures: &Fixtures,
) -> SpecResult<(Registry, Vec<PathBuf>)> {
    let files = discover(pattern, base)?;
    let mut registry = Registry::new();
    for file in &files {
        registry = registry.merge(load_file(file, fixtures)?);
    }
    Ok((registry, files))
}
