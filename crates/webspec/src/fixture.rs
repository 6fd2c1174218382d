//! Fixtures: static JSON data fed into case bodies.
//!
//! Each `*.json` file in the fixtures folder is registered under its file
//! stem. Step text may reference values with `{{stem.path.to.value}}`
//! placeholders, resolved once when a spec file is loaded. Fixture contents
//! are otherwise opaque to the runner.

use crate::result::{SpecError, SpecResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Named fixture documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixtures {
    documents: BTreeMap<String, Value>,
}

impl Fixtures {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir`. A missing directory yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Fixture`] naming the file that failed to read or
    /// parse.
    pub fn load_dir(dir: &Path) -> SpecResult<Self> {
        let mut fixtures = Self::new();
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "no fixtures folder");
            return Ok(fixtures);
        }

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = std::fs::read_to_string(&path).map_err(|e| SpecError::Fixture {
                message: format!("{}: {e}", path.display()),
            })?;
            let value: Value = serde_json::from_str(&raw).map_err(|e| SpecError::Fixture {
                message: format!("{}: {e}", path.display()),
            })?;
            tracing::debug!(fixture = stem, "loaded fixture");
            fixtures.insert(stem, value);
        }
        Ok(fixtures)
    }

    /// Register a document under `name`, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.documents.insert(name.into(), value);
    }

    /// Whole document by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.documents.get(name)
    }

    /// Number of documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no fixture is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Resolve a dotted path such as `user.emails.0`.
    ///
    /// Numeric segments index into arrays.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.documents.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Replace every `{{path}}` placeholder in `text`.
    ///
    /// Strings are inserted as-is, other values as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Fixture`] for an unknown path or an unclosed
    /// placeholder.
    pub fn render(&self, text: &str) -> SpecResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after.find("}}").ok_or_else(|| SpecError::Fixture {
                message: format!("unclosed placeholder in '{text}'"),
            })?;
            let path = after[..close].trim();
            let value = self.lookup(path).ok_or_else(|| SpecError::Fixture {
                message: format!("unknown fixture value '{path}'"),
            })?;
            match value {
                Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
            rest = &after[close + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_fixtures() -> Fixtures {
        let mut fixtures = Fixtures::new();
        fixtures.insert(
            "user",
            json!({
                "first_name": "Joe",
                "last_name": "Blogs",
                "emails": ["joe@example.com", "joe@work.example"],
                "age": 42
            }),
        );
        fixtures
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_lookup_nested_and_indexed() {
            let fixtures = user_fixtures();
            assert_eq!(fixtures.lookup("user.first_name"), Some(&json!("Joe")));
            assert_eq!(
                fixtures.lookup("user.emails.1"),
                Some(&json!("joe@work.example"))
            );
            assert_eq!(fixtures.lookup("user.emails.9"), None);
            assert_eq!(fixtures.lookup("nobody.first_name"), None);
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_render_placeholders() {
            let fixtures = user_fixtures();
            assert_eq!(
                fixtures
                    .render("{{ user.first_name }} {{user.last_name}} ({{user.age}})")
                    .unwrap(),
                "Joe Blogs (42)"
            );
            assert_eq!(fixtures.render("no placeholders").unwrap(), "no placeholders");
        }

        #[test]
        fn test_unknown_and_unclosed_placeholders() {
            let fixtures = user_fixtures();
            assert!(matches!(
                fixtures.render("{{user.middle_name}}"),
                Err(SpecError::Fixture { .. })
            ));
            assert!(fixtures.render("{{user.first_name").is_err());
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_load_dir_by_stem() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("user.json"), r#"{"email": "a@b.c"}"#).unwrap();
            std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
            let fixtures = Fixtures::load_dir(dir.path()).unwrap();
            assert_eq!(fixtures.len(), 1);
            assert_eq!(fixtures.lookup("user.email"), Some(&json!("a@b.c")));
        }

        #[test]
        fn test_missing_dir_is_empty() {
            let dir = tempfile::tempdir().unwrap();
            assert!(Fixtures::load_dir(&dir.path().join("nope")).unwrap().is_empty());
        }

        #[test]
        fn test_bad_json_names_file() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("broken.json"), "{").unwrap();
            let err = Fixtures::load_dir(dir.path()).unwrap_err();
            assert!(err.to_string().contains("broken.json"));
        }
    }
}
