//! webspec: run declarative UI test suites
//!
//! ## Usage
//!
//! ```bash
//! webspec init                        # Scaffold config, site, specs, fixtures
//! webspec run                         # Run specs matching specPattern
//! webspec run --spec "specs/a.yaml"   # Run one file
//! webspec list                        # Show groups and cases
//! ```
//!
//! Exit codes: 0 when every executed case passed, 1 when a case failed or
//! timed out, 2 for usage, configuration and loading errors.

use clap::Parser;
use std::process::ExitCode;
use webspec_cli::{handlers, logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity};

/// Exit code for failed or timed-out cases
const EXIT_CASES_FAILED: u8 = 1;

/// Exit code for everything that stops a run from happening
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run() -> CliResult<u8> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(config.verbosity);

    match cli.command {
        Commands::Run(args) => {
            let report = handlers::execute_run(&config, &args)?;
            Ok(if report.all_passed() {
                0
            } else {
                EXIT_CASES_FAILED
            })
        }
        Commands::List(args) => handlers::execute_list(&config, &args).map(|()| 0),
        Commands::Init(args) => handlers::execute_init(&config, &args).map(|_| 0),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}
