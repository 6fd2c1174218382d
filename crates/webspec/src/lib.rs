//! webspec: a declarative UI-interaction test runner.
//!
//! Suites are trees of named cases. Each case is a list of steps (visit,
//! type, click, expect, wait) executed against a [`PageDriver`] with
//! retry-until-timeout element lookup.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ spec files   │──►│  Registry    │──►│  SpecRunner  │
//! │ (YAML)       │   │ describe/it  │   │ fail-fast    │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │
//!                    ┌──────────────┐   ┌──────▼───────┐
//!                    │ retry engine │◄──│ locate / act │
//!                    │ (Clock)      │   │ / expect     │
//!                    └──────────────┘   └──────┬───────┘
//!                                              │
//!                                       ┌──────▼───────┐
//!                                       │  PageDriver  │
//!                                       └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use webspec::{ActionRequest, ManualClock, Registry, Selector, SiteDriver, SpecRunner, Step};
//!
//! let clock = ManualClock::new();
//! let mut site = SiteDriver::from_yaml(
//!     "pages:\n  http://localhost/:\n    elements:\n      - selectors: ['#go']\n",
//!     clock.shared(),
//! )?;
//!
//! let go = Selector::new("#go")?;
//! let registry = Registry::build(|r| {
//!     r.describe("home", |g| {
//!         g.it("clicks go", [
//!             Step::visit("http://localhost/"),
//!             Step::action(ActionRequest::click(go)),
//!         ]);
//!     });
//! });
//!
//! let report = SpecRunner::new(clock.shared()).run(&registry, &mut site);
//! assert!(report.all_passed());
//! # Ok::<(), webspec::SpecError>(())
//! ```

#![warn(missing_docs)]

pub mod action;
pub mod clock;
pub mod config;
pub mod driver;
pub mod expect;
pub mod fixture;
pub mod locator;
pub mod registry;
mod result;
pub mod retry;
pub mod runner;
pub mod site;
pub mod spec_file;

pub use action::{ActionKind, ActionOptions, ActionRequest};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{RunnerConfig, DEFAULT_CONFIG_FILE};
pub use driver::{Actionability, BoundingBox, ElementHandle, MockDriver, PageDriver};
pub use expect::Expectation;
pub use fixture::Fixtures;
pub use locator::{Locator, Selector};
pub use registry::{Node, Registry, Scope, Step, TestCase, TestGroup};
pub use result::{FailureKind, SpecError, SpecResult};
pub use retry::{retry, RetryConfig};
pub use runner::{CaseStatus, FailureDetail, RunReport, RunResult, SpecRunner};
pub use site::SiteDriver;
