//! Test execution driver.
//!
//! Walks a [`Registry`] in registration order, runs each selected case's
//! steps in order against one [`PageDriver`], and stops a case at its first
//! failing step. A case that panics is recorded as failed and the run goes on.

use crate::action;
use crate::clock::{millis_between, SharedClock, SystemClock};
use crate::driver::PageDriver;
use crate::expect;
use crate::registry::{PlannedCase, Registry, Step, TestCase};
use crate::result::{FailureKind, SpecError, SpecResult};
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Lifecycle status of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Registered, not started
    Pending,
    /// Executing
    Running,
    /// Every step succeeded
    Passed,
    /// A step failed or the body panicked
    Failed,
    /// A selector or retry timed out
    TimedOut,
    /// Filtered out because other cases are exclusive
    NotRun,
    /// Skipped explicitly
    Skipped,
}

impl CaseStatus {
    /// Whether no further transition is allowed
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    /// Stable lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::NotRun => "not_run",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-case state machine.
///
/// `Pending -> Running -> {Passed, Failed, TimedOut}`, or straight from
/// `Pending` to `NotRun` / `Skipped`. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseState {
    status: CaseStatus,
}

impl Default for CaseState {
    fn default() -> Self {
        Self {
            status: CaseStatus::Pending,
        }
    }
}

impl CaseState {
    /// Fresh pending state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> CaseStatus {
        self.status
    }

    /// Move to `next`
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidState`] for a transition the lifecycle
    /// does not allow.
    pub fn advance(&mut self, next: CaseStatus) -> SpecResult<()> {
        use CaseStatus::{Failed, NotRun, Passed, Pending, Running, Skipped, TimedOut};
        let allowed = matches!(
            (self.status, next),
            (Pending, Running | NotRun | Skipped) | (Running, Passed | Failed | TimedOut)
        );
        if !allowed {
            return Err(SpecError::InvalidState {
                message: format!("cannot move case from {} to {next}", self.status),
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Why a case did not pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Failure category
    pub kind: FailureKind,
    /// Error message
    pub message: String,
    /// Selector involved, if any
    pub selector: Option<String>,
    /// Step that failed, if known
    pub action: Option<String>,
    /// Time spent in the case when it failed
    pub elapsed_ms: u64,
}

impl FailureDetail {
    /// Detail for a step error
    #[must_use]
    pub fn from_error(error: &SpecError, action: Option<String>, elapsed_ms: u64) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            selector: error.selector().map(str::to_string),
            action,
            elapsed_ms,
        }
    }

    /// Detail for a panicking case body
    #[must_use]
    pub fn panic(message: impl Into<String>, action: Option<String>, elapsed_ms: u64) -> Self {
        Self {
            kind: FailureKind::Panic,
            message: message.into(),
            selector: None,
            action,
            elapsed_ms,
        }
    }
}

/// Outcome of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Group names followed by the case name
    pub path: Vec<String>,
    /// Final status
    pub status: CaseStatus,
    /// Failure detail for failed or timed-out cases
    pub error: Option<FailureDetail>,
    /// Time spent executing
    pub elapsed_ms: u64,
}

impl RunResult {
    /// Case name (last path segment)
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }

    /// Path joined with `" > "`
    #[must_use]
    pub fn full_name(&self) -> String {
        self.path.join(" > ")
    }

    /// Whether the case was executed
    #[must_use]
    pub const fn executed(&self) -> bool {
        matches!(
            self.status,
            CaseStatus::Passed | CaseStatus::Failed | CaseStatus::TimedOut
        )
    }
}

/// Results of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// One result per registered case, in registration order
    pub results: Vec<RunResult>,
    /// Wall time of the run
    pub elapsed_ms: u64,
    /// Driver the run used
    pub driver: String,
}

impl RunReport {
    fn count(&self, status: CaseStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Passed cases
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(CaseStatus::Passed)
    }

    /// Failed cases
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(CaseStatus::Failed)
    }

    /// Timed-out cases
    #[must_use]
    pub fn timed_out(&self) -> usize {
        self.count(CaseStatus::TimedOut)
    }

    /// Cases excluded by `only`
    #[must_use]
    pub fn not_run(&self) -> usize {
        self.count(CaseStatus::NotRun)
    }

    /// Explicitly skipped cases
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(CaseStatus::Skipped)
    }

    /// Number of cases executed
    #[must_use]
    pub fn executed(&self) -> usize {
        self.results.iter().filter(|r| r.executed()).count()
    }

    /// Every executed case passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0 && self.timed_out() == 0
    }

    /// Failed and timed-out results
    #[must_use]
    pub fn failures(&self) -> Vec<&RunResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, CaseStatus::Failed | CaseStatus::TimedOut))
            .collect()
    }

    /// Process exit code: 0 when every executed case passed, 1 otherwise
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.all_passed())
    }

    /// Statuses in registration order
    #[must_use]
    pub fn statuses(&self) -> Vec<CaseStatus> {
        self.results.iter().map(|r| r.status).collect()
    }
}

/// Sequential case runner
#[derive(Debug, Clone)]
pub struct SpecRunner {
    clock: SharedClock,
    retry: RetryConfig,
}

impl Default for SpecRunner {
    fn default() -> Self {
        Self::new(SystemClock::shared())
    }
}

impl SpecRunner {
    /// Create a runner with default retry settings
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            retry: RetryConfig::default(),
        }
    }

    /// Set the retry settings used by every case without an override
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Retry settings
    #[must_use]
    pub const fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run every selected case of `registry`
    pub fn run(&self, registry: &Registry, driver: &mut dyn PageDriver) -> RunReport {
        self.run_with(registry, driver, |_| {})
    }

    /// Run `registry`, calling `on_result` as each case reaches a terminal state
    pub fn run_with<F>(
        &self,
        registry: &Registry,
        driver: &mut dyn PageDriver,
        mut on_result: F,
    ) -> RunReport
    where
        F: FnMut(&RunResult),
    {
        let start = self.clock.now();
        let plan = registry.plan();
        let exclusive_mode = plan.iter().any(|c| c.exclusive && !c.skipped);
        tracing::info!(
            cases = plan.len(),
            exclusive_mode,
            driver = driver.name(),
            "starting run"
        );

        let mut results = Vec::with_capacity(plan.len());
        for planned in &plan {
            let result = self.run_planned(planned, exclusive_mode, driver);
            on_result(&result);
            results.push(result);
        }

        RunReport {
            results,
            elapsed_ms: millis_between(start, self.clock.now()),
            driver: driver.name().to_string(),
        }
    }

    fn run_planned(
        &self,
        planned: &PlannedCase<'_>,
        exclusive_mode: bool,
        driver: &mut dyn PageDriver,
    ) -> RunResult {
        let mut state = CaseState::new();
        let path = planned.path.clone();

        if !planned.should_run(exclusive_mode) {
            let status = if planned.skipped {
                CaseStatus::Skipped
            } else {
                CaseStatus::NotRun
            };
            transition(&mut state, status);
            tracing::debug!(case = %path.join(" > "), %status, "not executing");
            return RunResult {
                path,
                status: state.status(),
                error: None,
                elapsed_ms: 0,
            };
        }

        transition(&mut state, CaseStatus::Running);
        tracing::info!(case = %path.join(" > "), "running");
        let start = self.clock.now();

        let mut current_step: Option<String> = None;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_steps(planned.case, driver, &mut current_step)
        }));
        let elapsed_ms = millis_between(start, self.clock.now());

        let (status, error) = match outcome {
            Ok(Ok(())) => (CaseStatus::Passed, None),
            Ok(Err(err)) => {
                let status = if err.kind().is_timeout() {
                    CaseStatus::TimedOut
                } else {
                    CaseStatus::Failed
                };
                let detail = FailureDetail::from_error(&err, current_step, elapsed_ms);
                (status, Some(detail))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(case = %path.join(" > "), %message, "case panicked");
                let detail = FailureDetail::panic(message, current_step, elapsed_ms);
                (CaseStatus::Failed, Some(detail))
            }
        };

        transition(&mut state, status);
        tracing::info!(case = %path.join(" > "), %status, elapsed_ms, "finished");
        RunResult {
            path,
            status: state.status(),
            error,
            elapsed_ms,
        }
    }

    fn run_steps(
        &self,
        case: &TestCase,
        driver: &mut dyn PageDriver,
        current_step: &mut Option<String>,
    ) -> SpecResult<()> {
        let retry = case.timeout_ms.map_or(self.retry, |ms| {
            self.retry.with_timeout(Duration::from_millis(ms))
        });
        let clock = self.clock.as_ref();

        driver.reset()?;
        for step in &case.body {
            *current_step = Some(step.to_string());
            tracing::debug!(%step, "step");
            match step {
                Step::Visit { url } => driver.navigate(url)?,
                Step::Action(request) => action::execute(driver, request, &retry, clock)?,
                Step::Expect(expectation) => expect::verify(&*driver, expectation, &retry, clock)?,
                Step::Wait { ms } => clock.sleep(Duration::from_millis(*ms)),
            }
        }
        Ok(())
    }
}

fn transition(state: &mut CaseState, next: CaseStatus) {
    if let Err(err) = state.advance(next) {
        tracing::warn!(%err, "ignoring illegal case transition");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "case panicked".to_string()
    }
}
