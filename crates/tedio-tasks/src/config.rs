//! Run configuration: how many tasks and how long each one takes.

use std::time::Duration;

use crate::error::ConfigError;
use crate::task::TaskSpec;

/// How many `unit`s task `index` out of `tasks` waits for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DelayPolicy {
    /// `tasks - index`: the first task submitted is the last to finish.
    #[default]
    Descending,
    /// `index + 1`.
    Ascending,
    /// The same number of units for every task.
    Fixed(u32),
    /// One entry per task, in submission order.
    Explicit(Vec<u32>),
}

impl DelayPolicy {
    pub fn units(&self, tasks: usize, index: usize) -> u32 {
        let saturate = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        match self {
            DelayPolicy::Descending => saturate(tasks.saturating_sub(index)),
            DelayPolicy::Ascending => saturate(index.saturating_add(1)),
            DelayPolicy::Fixed(units) => *units,
            DelayPolicy::Explicit(units) => units.get(index).copied().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Number of tasks started concurrently.
    pub tasks: usize,
    /// Length of one delay unit.
    pub unit: Duration,
    pub delays: DelayPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            tasks: 3,
            unit: Duration::from_secs(1),
            delays: DelayPolicy::Descending,
        }
    }
}

impl ManagerConfig {
    pub fn new(tasks: usize) -> Self {
        Self::default().with_tasks(tasks)
    }

    /// One task per entry of `units`, waiting that many units each.
    pub fn explicit(units: impl IntoIterator<Item = u32>) -> Self {
        let units: Vec<u32> = units.into_iter().collect();
        Self::new(units.len()).with_delays(DelayPolicy::Explicit(units))
    }

    pub fn with_tasks(mut self, tasks: usize) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_delays(mut self, delays: DelayPolicy) -> Self {
        self.delays = delays;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let DelayPolicy::Explicit(units) = &self.delays {
            if units.len() != self.tasks {
                return Err(ConfigError::DelayCount {
                    expected: self.tasks,
                    found: units.len(),
                });
            }
        }
        Ok(())
    }

    /// Task descriptors in submission order.
    pub fn task_specs(&self) -> Vec<TaskSpec> {
        (0..self.tasks)
            .map(|index| {
                let units = self.delays.units(self.tasks, index);
                TaskSpec::new(index, self.unit.saturating_mul(units))
            })
            .collect()
    }
}
