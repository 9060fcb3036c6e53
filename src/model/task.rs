//! Task identity and scheduler states.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Scheduler state of a task, as printed by `sched_switch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Running,
    Runnable,
    Sleeping,
    Uninterruptible,
    Stopped,
    Traced,
    ExitZombie,
    ExitDead,
    TaskDead,
    Wakekill,
    Waking,
    Parked,
    Unknown,
}

impl std::str::FromStr for TaskState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "R" => Self::Running,
            "R+" => Self::Runnable,
            "S" => Self::Sleeping,
            "D" => Self::Uninterruptible,
            "T" => Self::Stopped,
            "t" => Self::Traced,
            "Z" => Self::ExitZombie,
            "X" => Self::ExitDead,
            "x" => Self::TaskDead,
            "K" => Self::Wakekill,
            "W" => Self::Waking,
            "P" => Self::Parked,
            _ => Self::Unknown,
        })
    }
}

/// A runnable thread, identified by pid
///
/// Name and priority change over a task's life (renames after fork,
/// priority boosting), so equality and hashing look at `pid` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub pid: u32,
    pub prio: Option<i32>,
    pub tgid: Option<u32>,
    pub ppid: Option<u32>,
}

impl Task {
    pub fn new(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
            prio: None,
            tgid: None,
            ppid: None,
        }
    }

    pub fn with_prio(mut self, prio: i32) -> Self {
        self.prio = Some(prio);
        self
    }

    pub fn with_tgid(mut self, tgid: Option<u32>) -> Self {
        self.tgid = tgid;
        self
    }

    /// True for the per-CPU idle task
    pub fn is_idle(&self) -> bool {
        self.pid == 0
    }

    /// CPU a per-CPU kernel thread is bound to, e.g. `ksoftirqd/3` -> 3
    pub fn affinity(&self) -> Option<u32> {
        let (_, suffix) = self.name.rsplit_once('/')?;
        suffix.chars().next()?.to_digit(10)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_by_pid_only() {
        let before = Task::new("zygote", 42).with_prio(120);
        let after = Task::new("com.example.app", 42).with_prio(110);
        assert_eq!(before, after);

        let mut seen = HashSet::new();
        seen.insert(before);
        assert!(seen.contains(&after));
        assert!(!seen.contains(&Task::new("zygote", 43)));
    }

    #[test]
    fn test_task_state_mapping() {
        assert_eq!("R".parse::<TaskState>().unwrap(), TaskState::Running);
        assert_eq!("R+".parse::<TaskState>().unwrap(), TaskState::Runnable);
        assert_eq!("D".parse::<TaskState>().unwrap(), TaskState::Uninterruptible);
        assert_eq!("D|W".parse::<TaskState>().unwrap(), TaskState::Unknown);
    }

    #[test]
    fn test_affinity() {
        assert_eq!(Task::new("ksoftirqd/3", 20).affinity(), Some(3));
        assert_eq!(Task::new("kworker/1:2", 21).affinity(), Some(1));
        assert_eq!(Task::new("surfaceflinger", 500).affinity(), None);
    }
}
