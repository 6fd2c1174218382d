//! Test registry: groups, cases and their steps.
//!
//! Registration is a synchronous build phase. [`Registry::build`] hands a
//! [`Scope`] to a closure, `describe` bodies run immediately, and the result
//! is an immutable tree that the runner walks later.
//!
//! ```
//! use webspec::{Registry, Step};
//!
//! let registry = Registry::build(|r| {
//!     r.describe("contact form", |g| {
//!         g.it("opens", [Step::visit("http://localhost/")]);
//!         g.only("submits", [Step::wait(10)]);
//!     });
//! });
//! assert_eq!(registry.len(), 2);
//! assert!(registry.has_exclusive());
//! ```

use crate::action::ActionRequest;
use crate::expect::Expectation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of a case body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Load a URL
    Visit {
        /// Target URL
        url: String,
    },
    /// Locate an element and interact with it
    Action(ActionRequest),
    /// Poll until an expectation holds
    Expect(Expectation),
    /// Pause for a fixed time
    Wait {
        /// Milliseconds to wait
        ms: u64,
    },
}

impl Step {
    /// Visit step
    #[must_use]
    pub fn visit(url: impl Into<String>) -> Self {
        Self::Visit { url: url.into() }
    }

    /// Action step
    #[must_use]
    pub const fn action(request: ActionRequest) -> Self {
        Self::Action(request)
    }

    /// Expectation step
    #[must_use]
    pub const fn expect(expectation: Expectation) -> Self {
        Self::Expect(expectation)
    }

    /// Wait step
    #[must_use]
    pub const fn wait(ms: u64) -> Self {
        Self::Wait { ms }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visit { url } => write!(f, "visit({url})"),
            Self::Action(request) => fmt::Display::fmt(request, f),
            Self::Expect(expectation) => fmt::Display::fmt(expectation, f),
            Self::Wait { ms } => write!(f, "wait({ms})"),
        }
    }
}

/// A single test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Case name
    pub name: String,
    /// Steps, executed in order
    pub body: Vec<Step>,
    /// Marked `only`
    pub exclusive: bool,
    /// Marked `skip`
    pub skipped: bool,
    /// Retry timeout override for this case
    pub timeout_ms: Option<u64>,
}

impl TestCase {
    /// Create a case with no steps
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: Vec::new(),
            exclusive: false,
            skipped: false,
            timeout_ms: None,
        }
    }

    /// Set the body
    #[must_use]
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.body = steps.into_iter().collect();
        self
    }

    /// Mark exclusive
    #[must_use]
    pub const fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Mark skipped
    #[must_use]
    pub const fn skipped(mut self) -> Self {
        self.skipped = true;
        self
    }

    /// Override the retry timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

/// A named group of cases and nested groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestGroup {
    /// Group name
    pub name: String,
    /// Marked `only`
    pub exclusive: bool,
    /// Marked `skip`
    pub skipped: bool,
    /// Children in registration order
    pub children: Vec<Node>,
}

impl TestGroup {
    /// Create an empty group
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exclusive: false,
            skipped: false,
            children: Vec::new(),
        }
    }

    /// Number of cases in this group, recursively
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.children.iter().map(Node::case_count).sum()
    }
}

/// Registry tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Nested group
    Group(TestGroup),
    /// Leaf case
    Case(TestCase),
}

impl Node {
    fn case_count(&self) -> usize {
        match self {
            Self::Group(group) => group.case_count(),
            Self::Case(_) => 1,
        }
    }
}

/// Registration scope handed to build closures
#[derive(Debug, Default)]
pub struct Scope {
    nodes: Vec<Node>,
}

impl Scope {
    fn group(&mut self, mut group: TestGroup, body: impl FnOnce(&mut Self)) -> &mut Self {
        let mut inner = Self::default();
        body(&mut inner);
        group.children = inner.nodes;
        self.nodes.push(Node::Group(group));
        self
    }

    /// Register a group and run its body now
    pub fn describe(&mut self, name: impl Into<String>, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.group(TestGroup::new(name), body)
    }

    /// Register an exclusive group
    pub fn describe_only(
        &mut self,
        name: impl Into<String>,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        let mut group = TestGroup::new(name);
        group.exclusive = true;
        self.group(group, body)
    }

    /// Register a skipped group
    pub fn describe_skip(
        &mut self,
        name: impl Into<String>,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        let mut group = TestGroup::new(name);
        group.skipped = true;
        self.group(group, body)
    }

    /// Register a case
    pub fn it(
        &mut self,
        name: impl Into<String>,
        steps: impl IntoIterator<Item = Step>,
    ) -> &mut Self {
        self.case(TestCase::new(name).with_steps(steps))
    }

    /// Register an exclusive case
    pub fn only(
        &mut self,
        name: impl Into<String>,
        steps: impl IntoIterator<Item = Step>,
    ) -> &mut Self {
        self.case(TestCase::new(name).with_steps(steps).exclusive())
    }

    /// Register a skipped case
    pub fn skip(
        &mut self,
        name: impl Into<String>,
        steps: impl IntoIterator<Item = Step>,
    ) -> &mut Self {
        self.case(TestCase::new(name).with_steps(steps).skipped())
    }

    /// Register a prebuilt case
    pub fn case(&mut self, case: TestCase) -> &mut Self {
        self.nodes.push(Node::Case(case));
        self
    }

    /// Register a prebuilt group
    pub fn node(&mut self, node: Node) -> &mut Self {
        self.nodes.push(node);
        self
    }
}

/// A case together with the flags it inherits from its ancestors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCase<'a> {
    /// Group names followed by the case name
    pub path: Vec<String>,
    /// The case
    pub case: &'a TestCase,
    /// Exclusive itself or via an ancestor
    pub exclusive: bool,
    /// Skipped itself or via an ancestor
    pub skipped: bool,
}

impl PlannedCase<'_> {
    /// Whether the case runs, given whether the registry has an exclusive set.
    ///
    /// Skip beats only.
    #[must_use]
    pub const fn should_run(&self, exclusive_mode: bool) -> bool {
        !self.skipped && (!exclusive_mode || self.exclusive)
    }
}

/// Immutable tree of registered groups and cases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    roots: Vec<Node>,
}

impl Registry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a registration closure and freeze the result
    #[must_use]
    pub fn build(body: impl FnOnce(&mut Scope)) -> Self {
        let mut scope = Scope::default();
        body(&mut scope);
        Self { roots: scope.nodes }
    }

    /// Registry from already-built nodes
    #[must_use]
    pub fn from_nodes(roots: Vec<Node>) -> Self {
        Self { roots }
    }

    /// Append another registry's nodes after this one's
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.roots.extend(other.roots);
        self
    }

    /// Top-level nodes
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.roots
    }

    /// Total number of cases
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.iter().map(Node::case_count).sum()
    }

    /// Whether no case is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every case in registration order, with inherited flags resolved
    #[must_use]
    pub fn plan(&self) -> Vec<PlannedCase<'_>> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        for node in &self.roots {
            collect(node, &mut path, false, false, &mut out);
        }
        out
    }

    /// Whether any case is effectively exclusive and not skipped
    #[must_use]
    pub fn has_exclusive(&self) -> bool {
        self.plan().iter().any(|c| c.exclusive && !c.skipped)
    }
}

fn collect<'a>(
    node: &'a Node,
    path: &mut Vec<String>,
    exclusive: bool,
    skipped: bool,
    out: &mut Vec<PlannedCase<'a>>,
) {
    match node {
        Node::Group(group) => {
            path.push(group.name.clone());
            for child in &group.children {
                collect(
                    child,
                    path,
                    exclusive || group.exclusive,
                    skipped || group.skipped,
                    out,
                );
            }
            path.pop();
        }
        Node::Case(case) => {
            let mut full = path.clone();
            full.push(case.name.clone());
            out.push(PlannedCase {
                path: full,
                case,
                exclusive: exclusive || case.exclusive,
                skipped: skipped || case.skipped,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(plan: &[PlannedCase<'_>]) -> Vec<String> {
        plan.iter().map(|c| c.path.join(" > ")).collect()
    }

    mod build_tests {
        use super::*;

        #[test]
        fn test_registration_order_is_preserved() {
            let registry = Registry::build(|r| {
                r.describe("outer", |g| {
                    g.it("first", []);
                    g.describe("inner", |g| {
                        g.it("second", []);
                    });
                    g.it("third", []);
                });
                r.it("top level", []);
            });
            assert_eq!(
                names(&registry.plan()),
                vec![
                    "outer > first",
                    "outer > inner > second",
                    "outer > third",
                    "top level"
                ]
            );
            assert_eq!(registry.len(), 4);
        }

        #[test]
        fn test_duplicate_names_allowed() {
            let registry = Registry::build(|r| {
                r.it("same", []).it("same", []);
            });
            assert_eq!(registry.len(), 2);
        }

        #[test]
        fn test_steps_are_kept() {
            let registry = Registry::build(|r| {
                r.it("visits", [Step::visit("http://localhost/"), Step::wait(5)]);
            });
            let plan = registry.plan();
            assert_eq!(plan[0].case.body.len(), 2);
            assert_eq!(plan[0].case.body[0].to_string(), "visit(http://localhost/)");
        }

        #[test]
        fn test_merge_appends() {
            let a = Registry::build(|r| {
                r.it("a", []);
            });
            let b = Registry::build(|r| {
                r.only("b", []);
            });
            let merged = a.merge(b);
            assert_eq!(names(&merged.plan()), vec!["a", "b"]);
            assert!(merged.has_exclusive());
            assert!(Registry::new().is_empty());
        }
    }

    mod flag_tests {
        use super::*;

        #[test]
        fn test_group_only_marks_children_exclusive() {
            let registry = Registry::build(|r| {
                r.describe_only("focused", |g| {
                    g.it("a", []);
                });
                r.it("b", []);
            });
            let plan = registry.plan();
            assert!(plan[0].exclusive);
            assert!(!plan[1].exclusive);
            assert!(plan[0].should_run(true));
            assert!(!plan[1].should_run(true));
        }

        #[test]
        fn test_skip_beats_only() {
            let registry = Registry::build(|r| {
                r.describe_skip("parked", |g| {
                    g.only("focused but skipped", []);
                });
                r.it("plain", []);
            });
            let plan = registry.plan();
            assert!(plan[0].exclusive && plan[0].skipped);
            assert!(!plan[0].should_run(true));
            assert!(!registry.has_exclusive());
            assert!(plan[1].should_run(registry.has_exclusive()));
        }

        #[test]
        fn test_no_exclusive_runs_everything_not_skipped() {
            let registry = Registry::build(|r| {
                r.it("a", []).skip("b", []).it("c", []);
            });
            let runs: Vec<bool> = registry
                .plan()
                .iter()
                .map(|c| c.should_run(registry.has_exclusive()))
                .collect();
            assert_eq!(runs, vec![true, false, true]);
        }
    }
}
