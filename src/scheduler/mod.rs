//! Compliance review scheduler: periodic rules that notify role holders
//! about covenants needing attention.

use thiserror::Error;

use crate::database::manager::DatabaseError;

pub mod audience;
pub mod clock;
pub mod cron;
pub mod engine;
pub mod rules;
pub mod runner;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cron::{CronError, CronSchedule};
pub use engine::{ScheduleEntry, SchedulerEngine};
pub use rules::{AlertKind, Rule};
pub use runner::{ComplianceScheduler, FanoutReport, RunReport};
pub use store::{ComplianceStore, PgComplianceStore};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("unknown scheduler rule '{0}'")]
    UnknownRule(String),

    #[error("invalid scheduler UTC offset {0}s")]
    InvalidOffset(i32),

    #[error(transparent)]
    Cron(#[from] CronError),

    #[error("compliance store read failed: {0}")]
    Store(#[from] DatabaseError),
}
