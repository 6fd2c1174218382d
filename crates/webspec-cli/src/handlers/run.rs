//! Run command handler

use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::handlers::{project_root, Project};
use crate::output::{render_json, OutputFormat, ProgressReporter};
use std::path::{Path, PathBuf};
use webspec::{RunReport, RunnerConfig, SiteDriver, SpecRunner, SystemClock};

/// Page drivers this build can run against
pub const SUPPORTED_BROWSERS: &[&str] = &["static"];

/// Check the `--browser` value
pub fn validate_browser(name: &str) -> CliResult<()> {
    if SUPPORTED_BROWSERS.contains(&name) {
        Ok(())
    } else {
        Err(CliError::invalid_argument(format!(
            "browser '{name}' is not available (supported: {})",
            SUPPORTED_BROWSERS.join(", ")
        )))
    }
}

/// Apply command-line overrides on top of the file configuration
pub fn apply_overrides(mut config: RunnerConfig, args: &RunArgs) -> CliResult<RunnerConfig> {
    if let Some(timeout) = args.timeout {
        config.default_timeout_ms = timeout;
        config.poll_interval_ms = config.poll_interval_ms.min(timeout.max(1));
    }
    config.validate()?;
    Ok(config)
}

/// Site description path: `--site` relative to the working directory, the
/// configured one relative to the project root
fn site_path(project: &Project, args: &RunArgs) -> CliResult<PathBuf> {
    if let Some(site) = &args.site {
        return Ok(site.clone());
    }
    project
        .config
        .site
        .as_deref()
        .map(|site| RunnerConfig::resolve(&project.root, site))
        .ok_or_else(|| {
            CliError::config("no site description; set `site` in the config file or pass --site")
        })
}

fn prepare_downloads(root: &Path, config: &RunnerConfig) -> CliResult<()> {
    let downloads = RunnerConfig::resolve(root, &config.downloads_folder);
    std::fs::create_dir_all(&downloads)?;
    tracing::debug!(path = %downloads.display(), "downloads folder ready");
    Ok(())
}

/// Execute the run command and return the report.
///
/// Case failures are part of the report, not an `Err`.
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<RunReport> {
    validate_browser(&args.browser)?;

    let file_config = RunnerConfig::load_or_default(&args.config)?;
    let file_config = apply_overrides(file_config, args)?;
    let root = project_root(&args.config);
    let project = Project::with_config(root, file_config, args.spec.as_deref())?;
    prepare_downloads(&project.root, &project.config)?;

    let clock = SystemClock::shared();
    let site = site_path(&project, args)?;
    let mut driver = SiteDriver::load(&site, clock.clone())?;
    let runner = SpecRunner::new(clock).with_retry(project.config.retry_config());

    let text = args.format == OutputFormat::Text;
    let mut reporter = ProgressReporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet() || !text,
    );
    reporter.header(&format!(
        "Running {} cases from {} files",
        project.registry.len(),
        project.files.len()
    ));
    reporter.start_progress(project.registry.len() as u64, "cases");

    let report = runner.run_with(&project.registry, &mut driver, |result| {
        if text {
            reporter.case_result(result);
        }
        reporter.increment(1);
    });
    reporter.finish();

    if text {
        reporter.summary(&report);
    } else {
        println!("{}", render_json(&report)?);
    }
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            spec: None,
            browser: "static".to_string(),
            config: PathBuf::from(webspec::DEFAULT_CONFIG_FILE),
            site: None,
            timeout: None,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_validate_browser() {
        assert!(validate_browser("static").is_ok());
        let err = validate_browser("chrome").unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
        assert!(err.to_string().contains("supported: static"));
    }

    #[test]
    fn test_timeout_override() {
        let mut run_args = args();
        run_args.timeout = Some(20);
        let config = apply_overrides(RunnerConfig::default(), &run_args).unwrap();
        assert_eq!(config.default_timeout_ms, 20);
        assert_eq!(config.poll_interval_ms, 20);
        assert_eq!(
            apply_overrides(RunnerConfig::default(), &args()).unwrap(),
            RunnerConfig::default()
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut run_args = args();
        run_args.timeout = Some(0);
        assert!(apply_overrides(RunnerConfig::default(), &run_args).is_err());
    }
}
