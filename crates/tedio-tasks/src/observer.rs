//! Sinks for what the manager and monitor report while tasks run.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Something worth reporting while tasks run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// A task started its work.
    Started { name: String },
    /// The monitor saw the running count change.
    Running(usize),
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Started { name } => write!(f, "Running \"{name}\""),
            Observation::Running(count) => write!(f, "[{count} running tasks]"),
        }
    }
}

pub trait Observer {
    fn observe(&self, observation: Observation);
}

impl<F> Observer for F
where
    F: Fn(Observation),
{
    fn observe(&self, observation: Observation) {
        self(observation)
    }
}

/// Prints each observation on its own line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Observer for Stdout {
    fn observe(&self, observation: Observation) {
        println!("{observation}");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Observer for Discard {
    fn observe(&self, _observation: Observation) {}
}

/// Keeps every observation in order. Clones share the same record.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    seen: Rc<RefCell<Vec<Observation>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.seen.borrow().clone()
    }

    /// Running counts reported by the monitor, in order.
    pub fn running_counts(&self) -> Vec<usize> {
        self.seen
            .borrow()
            .iter()
            .filter_map(|observation| match observation {
                Observation::Running(count) => Some(*count),
                Observation::Started { .. } => None,
            })
            .collect()
    }

    /// Names of started tasks, in start order.
    pub fn started(&self) -> Vec<String> {
        self.seen
            .borrow()
            .iter()
            .filter_map(|observation| match observation {
                Observation::Started { name } => Some(name.clone()),
                Observation::Running(_) => None,
            })
            .collect()
    }
}

impl Observer for Recorder {
    fn observe(&self, observation: Observation) {
        self.seen.borrow_mut().push(observation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_lines() {
        assert_eq!(
            Observation::Started {
                name: "Task 1".into()
            }
            .to_string(),
            "Running \"Task 1\""
        );
        assert_eq!(Observation::Running(3).to_string(), "[3 running tasks]");
    }

    #[test]
    fn recorder_splits_kinds() {
        let recorder = Recorder::new();
        let shared = recorder.clone();
        shared.observe(Observation::Running(0));
        shared.observe(Observation::Started {
            name: "Task 0".into(),
        });
        shared.observe(Observation::Running(1));

        assert_eq!(recorder.running_counts(), [0, 1]);
        assert_eq!(recorder.started(), ["Task 0"]);
        assert_eq!(recorder.observations().len(), 3);
    }

    #[test]
    fn closures_are_observers() {
        let lines = RefCell::new(Vec::new());
        let observer = |observation: Observation| lines.borrow_mut().push(observation.to_string());
        observer.observe(Observation::Running(2));
        assert_eq!(*lines.borrow(), ["[2 running tasks]"]);
    }
}
