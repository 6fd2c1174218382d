//! Init command handler

use crate::commands::InitArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::ProgressReporter;
use std::path::{Path, PathBuf};
use webspec::{RunnerConfig, DEFAULT_CONFIG_FILE};

const EXAMPLE_SITE: &str = r##"pages:
  http://localhost/contact:
    title: Contact Us
    elements:
      - selectors: ['[name="first_name"]']
        tag: input
      - selectors: ['[name="email"]']
        tag: input
      - selectors: ['#contact-us']
        tag: a
        width: 0
        height: 0
        navigates_to: http://localhost/thank-you
  http://localhost/thank-you:
    title: Thank You
    elements:
      - selectors: ['#contact_reply h1']
        tag: h1
        text: Thank You for your Message!
        appears_after_ms: 200
"##;

const EXAMPLE_SPEC: &str = r##"describe: contact form
cases:
  - it: fills in the form
    steps:
      - visit: http://localhost/contact
      - get: '[name="first_name"]'
        type: "{{user.first_name}}"
      - expect: { selector: '[name="first_name"]', text: "{{user.first_name}}" }
  - it: reaches the thank-you page
    steps:
      - visit: http://localhost/contact
      - get: '#contact-us'
        click: { force: true }
      - expect: { selector: '#contact_reply h1', contains: Thank You }
      - url_contains: thank-you
"##;

const EXAMPLE_FIXTURE: &str = r#"{
  "first_name": "Joe",
  "email": "joe@example.com"
}
"#;

/// Default configuration written by `init`
#[must_use]
pub fn default_project_config() -> RunnerConfig {
    RunnerConfig {
        site: Some(PathBuf::from("site.yaml")),
        ..RunnerConfig::default()
    }
}

/// Scaffold a project; returns the files written.
///
/// Existing files are kept unless `--force` is set.
pub fn execute_init(config: &CliConfig, args: &InitArgs) -> CliResult<Vec<PathBuf>> {
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.info(&format!(
        "Initializing webspec project in: {}",
        args.path.display()
    ));
    if !args.force && !is_valid_init_path(&args.path) {
        reporter.warning("Directory is not empty; existing files are kept (use --force to overwrite)");
    }

    let project = default_project_config();
    std::fs::create_dir_all(&args.path)?;
    for dir in [&project.downloads_folder, &project.fixtures_folder] {
        std::fs::create_dir_all(args.path.join(dir))?;
    }
    std::fs::create_dir_all(args.path.join("specs"))?;

    let files = [
        (PathBuf::from(DEFAULT_CONFIG_FILE), project.to_yaml()?),
        (PathBuf::from("site.yaml"), EXAMPLE_SITE.to_string()),
        (PathBuf::from("specs/contact.yaml"), EXAMPLE_SPEC.to_string()),
        (
            project.fixtures_folder.join("user.json"),
            EXAMPLE_FIXTURE.to_string(),
        ),
    ];

    let mut written = Vec::new();
    for (relative, content) in files {
        let path = args.path.join(relative);
        if path.exists() && !args.force {
            reporter.warning(&format!("Kept existing: {}", path.display()));
            continue;
        }
        std::fs::write(&path, content)?;
        reporter.success(&format!("Created: {}", path.display()));
        written.push(path);
    }

    reporter.info("Run `webspec run` to execute the example spec");
    Ok(written)
}

/// Check if a path is a valid init target
#[must_use]
pub fn is_valid_init_path(path: &Path) -> bool {
    // Path should either not exist or be an empty directory
    if !path.exists() {
        return true;
    }

    if !path.is_dir() {
        return false;
    }

    // Check if directory is empty (except for hidden files)
    match std::fs::read_dir(path) {
        Ok(entries) => entries
            .flatten()
            .all(|entry| entry.file_name().to_string_lossy().starts_with('.')),
        Err(_) => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Verbosity;
    use crate::handlers::Project;
    use tempfile::TempDir;
    use webspec::{ManualClock, SiteDriver};

    fn quiet() -> CliConfig {
        CliConfig::new().with_verbosity(Verbosity::Quiet)
    }

    #[test]
    fn test_is_valid_init_path_nonexistent() {
        let temp = TempDir::new().unwrap();
        assert!(is_valid_init_path(&temp.path().join("new_project")));
    }

    #[test]
    fn test_is_valid_init_path_dir_with_hidden_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".gitignore"), "downloads/").unwrap();
        assert!(is_valid_init_path(temp.path()));
        std::fs::write(temp.path().join("notes.txt"), "x").unwrap();
        assert!(!is_valid_init_path(temp.path()));
    }

    #[test]
    fn test_execute_init_creates_layout() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("new_project");
        let args = InitArgs {
            path: project_path.clone(),
            force: false,
        };

        let written = execute_init(&quiet(), &args).unwrap();

        assert_eq!(written.len(), 4);
        assert!(project_path.join("downloads").is_dir());
        assert!(project_path.join("fixtures/user.json").is_file());
        assert!(project_path.join(DEFAULT_CONFIG_FILE).is_file());
    }

    #[test]
    fn test_scaffold_loads_and_parses() {
        let temp = TempDir::new().unwrap();
        let args = InitArgs {
            path: temp.path().to_path_buf(),
            force: false,
        };
        execute_init(&quiet(), &args).unwrap();

        let project = Project::load(&temp.path().join(DEFAULT_CONFIG_FILE), None).unwrap();
        assert_eq!(project.config, default_project_config());
        assert_eq!(project.registry.len(), 2);
        let site = temp.path().join("site.yaml");
        assert!(SiteDriver::load(&site, ManualClock::new().shared()).is_ok());
    }

    #[test]
    fn test_execute_init_keeps_existing_without_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("site.yaml"), "pages: {}\n").unwrap();
        let mut args = InitArgs {
            path: temp.path().to_path_buf(),
            force: false,
        };

        let written = execute_init(&quiet(), &args).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("site.yaml")).unwrap(),
            "pages: {}\n"
        );

        args.force = true;
        execute_init(&quiet(), &args).unwrap();
        assert!(std::fs::read_to_string(temp.path().join("site.yaml"))
            .unwrap()
            .contains("thank-you"));
    }
}
