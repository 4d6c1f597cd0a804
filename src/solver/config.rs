//! Solver configuration.

use serde::{Deserialize, Serialize};

/// Order in which unbound tasks are picked for branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VariableOrder {
    /// Ascending task id.
    #[default]
    Lexicographic,
    /// Precedence order, ties broken by ascending task id.
    Topological,
    /// Fewest remaining candidate values first, ties broken by ascending
    /// task id.
    SmallestDomain,
}

/// Configuration for [`RcpspSolver`](super::RcpspSolver).
///
/// # Examples
/// ```
/// use u_rcpsp::solver::{SolverConfig, VariableOrder};
///
/// let config = SolverConfig::default()
///     .with_variable_order(VariableOrder::Topological)
///     .with_node_limit(10_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Branching order over tasks.
    pub variable_order: VariableOrder,

    /// Prune values of unbound tasks that no longer fit the resource
    /// profile after each bind.
    pub resource_forward_checking: bool,

    /// Propagate precedence bounds to a fixpoint before searching.
    pub initial_propagation: bool,

    /// Maximum number of search nodes (per worker). `None` = unlimited.
    pub node_limit: Option<u64>,

    /// Maximum wall-clock time in milliseconds. `None` = unlimited.
    pub time_limit_ms: Option<i64>,

    /// Number of parallel workers (only used with the `parallel` feature).
    pub num_workers: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            variable_order: VariableOrder::Lexicographic,
            resource_forward_checking: true,
            initial_propagation: true,
            node_limit: None,
            time_limit_ms: None,
            num_workers: 1,
        }
    }
}

impl SolverConfig {
    pub fn with_variable_order(mut self, order: VariableOrder) -> Self {
        self.variable_order = order;
        self
    }

    pub fn with_resource_forward_checking(mut self, enabled: bool) -> Self {
        self.resource_forward_checking = enabled;
        self
    }

    pub fn with_initial_propagation(mut self, enabled: bool) -> Self {
        self.initial_propagation = enabled;
        self
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: i64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1".into());
        }
        if let Some(ms) = self.time_limit_ms {
            if ms <= 0 {
                return Err(format!("time_limit_ms must be positive, got {ms}"));
            }
        }
        if self.node_limit == Some(0) {
            return Err("node_limit must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.variable_order, VariableOrder::Lexicographic);
        assert!(config.resource_forward_checking);
        assert!(config.initial_propagation);
        assert_eq!(config.node_limit, None);
        assert_eq!(config.time_limit_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SolverConfig::default()
            .with_variable_order(VariableOrder::SmallestDomain)
            .with_resource_forward_checking(false)
            .with_initial_propagation(false)
            .with_node_limit(50)
            .with_time_limit_ms(1_000)
            .with_num_workers(4);
        assert_eq!(config.variable_order, VariableOrder::SmallestDomain);
        assert!(!config.resource_forward_checking);
        assert!(!config.initial_propagation);
        assert_eq!(config.node_limit, Some(50));
        assert_eq!(config.time_limit_ms, Some(1_000));
        assert_eq!(config.num_workers, 4);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(SolverConfig::default().with_num_workers(0).validate().is_err());
        assert!(SolverConfig::default().with_time_limit_ms(0).validate().is_err());
        assert!(SolverConfig::default().with_node_limit(0).validate().is_err());
    }
}
