//! Scheduler record kinds: `sched_switch`, `sched_wakeup`, `sched_migrate_task`.

use super::{captures, field, text, Payload};
use crate::model::{Task, TaskState};
use crate::utils::error::DecodeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static SCHED_SWITCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^prev_comm=(?P<prev_comm>.*?)\s+prev_pid=(?P<prev_pid>\d+)\s+prev_prio=(?P<prev_prio>-?\d+)\s+prev_state=(?P<prev_state>\S+)\s+==>\s+next_comm=(?P<next_comm>.*?)\s+next_pid=(?P<next_pid>\d+)\s+next_prio=(?P<next_prio>-?\d+)",
    )
    .expect("Invalid sched_switch regex pattern")
});

static SCHED_WAKEUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^comm=(?P<comm>.*?)\s+pid=(?P<pid>\d+)\s+prio=(?P<prio>-?\d+)(?:\s+success=(?P<success>\d+))?\s+target_cpu=(?P<target_cpu>\d+)",
    )
    .expect("Invalid sched_wakeup regex pattern")
});

static SCHED_MIGRATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^comm=(?P<comm>.*?)\s+pid=(?P<pid>\d+)\s+prio=(?P<prio>-?\d+)\s+(?:load=(?P<load>\d+)\s+)?orig_cpu=(?P<orig_cpu>\d+)\s+dest_cpu=(?P<dest_cpu>\d+)",
    )
    .expect("Invalid sched_migrate_task regex pattern")
});

/// A context switch on one CPU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedSwitch {
    pub prev_comm: String,
    pub prev_pid: u32,
    pub prev_prio: i32,
    pub prev_state: TaskState,
    pub next_comm: String,
    pub next_pid: u32,
    pub next_prio: i32,
}

impl SchedSwitch {
    /// Task being switched out
    pub fn prev_task(&self) -> Task {
        Task::new(self.prev_comm.clone(), self.prev_pid).with_prio(self.prev_prio)
    }

    /// Task being switched in
    pub fn next_task(&self) -> Task {
        Task::new(self.next_comm.clone(), self.next_pid).with_prio(self.next_prio)
    }
}

/// A task placed on a run queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedWakeup {
    pub comm: String,
    pub pid: u32,
    pub prio: i32,
    /// Absent on kernels newer than 4.3
    pub success: Option<u32>,
    pub target_cpu: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedMigrateTask {
    pub comm: String,
    pub pid: u32,
    pub prio: i32,
    pub load: Option<u64>,
    pub orig_cpu: u32,
    pub dest_cpu: u32,
}

pub fn decode_sched_switch(payload: &str) -> Result<Payload, DecodeError> {
    const KIND: &str = "sched_switch";
    let caps = captures(&SCHED_SWITCH_RE, KIND, payload)?;
    let prev_state: String = text(&caps, "prev_state");

    Ok(Payload::SchedSwitch(SchedSwitch {
        prev_comm: text(&caps, "prev_comm"),
        prev_pid: field(&caps, KIND, "prev_pid")?,
        prev_prio: field(&caps, KIND, "prev_prio")?,
        prev_state: prev_state.parse().unwrap_or(TaskState::Unknown),
        next_comm: text(&caps, "next_comm"),
        next_pid: field(&caps, KIND, "next_pid")?,
        next_prio: field(&caps, KIND, "next_prio")?,
    }))
}

pub fn decode_sched_wakeup(payload: &str) -> Result<Payload, DecodeError> {
    const KIND: &str = "sched_wakeup";
    let caps = captures(&SCHED_WAKEUP_RE, KIND, payload)?;
    let success = match caps.name("success") {
        Some(_) => Some(field(&caps, KIND, "success")?),
        None => None,
    };

    Ok(Payload::SchedWakeup(SchedWakeup {
        comm: text(&caps, "comm"),
        pid: field(&caps, KIND, "pid")?,
        prio: field(&caps, KIND, "prio")?,
        success,
        target_cpu: field(&caps, KIND, "target_cpu")?,
    }))
}

pub fn decode_sched_migrate_task(payload: &str) -> Result<Payload, DecodeError> {
    const KIND: &str = "sched_migrate_task";
    let caps = captures(&SCHED_MIGRATE_RE, KIND, payload)?;
    let load = match caps.name("load") {
        Some(_) => Some(field(&caps, KIND, "load")?),
        None => None,
    };

    Ok(Payload::SchedMigrateTask(SchedMigrateTask {
        comm: text(&caps, "comm"),
        pid: field(&caps, KIND, "pid")?,
        prio: field(&caps, KIND, "prio")?,
        load,
        orig_cpu: field(&caps, KIND, "orig_cpu")?,
        dest_cpu: field(&caps, KIND, "dest_cpu")?,
    }))
}
