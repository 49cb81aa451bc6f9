//! Runner configuration.

use std::sync::Arc;

use crate::runner::ordering::{DeclarationOrder, MemberOrdering};

/// How a [`SpecRunner`](crate::runner::SpecRunner) selects and orders behaviors.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Order of scenarios and behaviors within their parent
    pub ordering: Arc<dyn MemberOrdering>,
    /// Substring a behavior's qualified name (`Spec::Scenario::behavior`) must contain to run
    pub filter: Option<String>,
    /// Stop after the first behavior that does not pass
    pub fail_fast: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            ordering: Arc::new(DeclarationOrder),
            filter: None,
            fail_fast: false,
        }
    }
}

impl RunnerConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the member ordering
    pub fn with_ordering(mut self, ordering: impl MemberOrdering + 'static) -> Self {
        self.ordering = Arc::new(ordering);
        self
    }

    /// Only run behaviors whose qualified name contains `filter`
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Stop after the first failure
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Whether the behavior with this qualified name passes the filter.
    pub fn selects(&self, qualified_name: &str) -> bool {
        self.filter.as_deref().is_none_or(|filter| qualified_name.contains(filter))
    }
}
