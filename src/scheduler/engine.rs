use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::clock::SystemClock;
use super::cron::CronSchedule;
use super::rules::Rule;
use super::runner::ComplianceScheduler;
use super::store::PgComplianceStore;
use super::SchedulerError;
use crate::config::SchedulerConfig;

/// One row of the schedule listing
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    pub rule: Rule,
    pub cron: String,
    pub next_fire: Option<DateTime<FixedOffset>>,
}

/// Cron-driven dispatcher: one timer task per rule
pub struct SchedulerEngine {
    scheduler: Arc<ComplianceScheduler>,
    schedules: Vec<(Rule, CronSchedule)>,
    offset: FixedOffset,
}

impl SchedulerEngine {
    pub fn from_config(scheduler: Arc<ComplianceScheduler>, settings: &SchedulerConfig) -> Result<Self, SchedulerError> {
        let offset = FixedOffset::east_opt(settings.utc_offset_secs)
            .ok_or_else(|| SchedulerError::InvalidOffset(settings.utc_offset_secs))?;

        let schedules = Rule::ALL
            .into_iter()
            .map(|rule| -> Result<(Rule, CronSchedule), SchedulerError> {
                Ok((rule, CronSchedule::parse(rule.cron_expression(settings))?))
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;

        Ok(Self {
            scheduler,
            schedules,
            offset,
        })
    }

    /// Engine over the Postgres store and the system clock
    pub fn with_postgres(settings: &SchedulerConfig) -> Result<Self, SchedulerError> {
        let scheduler = ComplianceScheduler::new(Arc::new(PgComplianceStore), Arc::new(SystemClock), settings);
        Self::from_config(Arc::new(scheduler), settings)
    }

    pub fn scheduler(&self) -> &Arc<ComplianceScheduler> {
        &self.scheduler
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn schedule(&self, rule: Rule) -> Option<&CronSchedule> {
        self.schedules.iter().find(|(r, _)| *r == rule).map(|(_, cron)| cron)
    }

    /// Every rule with its expression and next fire time after `now`
    pub fn describe(&self, now: DateTime<Utc>) -> Vec<ScheduleEntry> {
        let local = now.with_timezone(&self.offset);
        self.schedules
            .iter()
            .map(|(rule, cron)| ScheduleEntry {
                rule: *rule,
                cron: cron.expression().to_string(),
                next_fire: cron.next_after(&local),
            })
            .collect()
    }

    /// Spawn one timer task per rule. Rules never wait on each other.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        self.schedules
            .iter()
            .map(|(rule, cron)| {
                let scheduler = Arc::clone(&self.scheduler);
                tokio::spawn(run_rule_loop(scheduler, *rule, cron.clone(), self.offset))
            })
            .collect()
    }
}

async fn run_rule_loop(scheduler: Arc<ComplianceScheduler>, rule: Rule, cron: CronSchedule, offset: FixedOffset) {
    info!("Scheduler rule {} armed with '{}'", rule, cron);
    let mut after = scheduler.clock().now().with_timezone(&offset);

    loop {
        let Some(next) = cron.next_after(&after) else {
            warn!("Scheduler rule {} has no future fire time, stopping", rule);
            return;
        };

        let wait = (next.with_timezone(&Utc) - scheduler.clock().now())
            .to_std()
            .unwrap_or_default();
        tokio::time::sleep(wait).await;

        // Errors were already logged by the runner; the next firing is the retry
        if let Err(e) = scheduler.run(rule).await {
            error!("Scheduler rule {} failed: {}", rule, e);
        }

        // Skip any firings missed while the run was in progress
        after = next.max(scheduler.clock().now().with_timezone(&offset));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{covenant, user, MemoryStore, TokioClock};
    use chrono::TimeZone;
    use std::time::Duration;

    const EVERY_MINUTE: &str = "0 * * * * ?";

    /// One never-reviewed covenant and one finance user: each overdue run
    /// makes two reads and delivers one notification.
    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(
            vec![covenant(1, "VERDE", None)],
            vec![user(1, &["ROLE_FINANCE_HOLDING"])],
        ))
    }

    /// Loop for the overdue rule firing every minute, starting 30s before
    /// the first firing at 09:01:00 UTC
    fn start(store: Arc<MemoryStore>) -> JoinHandle<()> {
        let origin = Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 30).unwrap();
        let scheduler = Arc::new(ComplianceScheduler::new(
            store,
            Arc::new(TokioClock::starting_at(origin)),
            &SchedulerConfig::default(),
        ));
        let cron = CronSchedule::parse(EVERY_MINUTE).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        tokio::spawn(run_rule_loop(scheduler, Rule::OverdueMonitoring, cron, utc))
    }

    async fn advance_to(secs: u64, started: tokio::time::Instant) {
        tokio::time::sleep_until(started + Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn runs_once_per_firing() {
        let store = store();
        let started = tokio::time::Instant::now();
        let handle = start(store.clone());

        advance_to(29, started).await;
        assert!(store.notifications().is_empty());

        advance_to(31, started).await;
        assert_eq!(store.notifications().len(), 1);

        // Firings at +90s, +150s and +210s
        advance_to(211, started).await;
        assert_eq!(store.notifications().len(), 4);
        assert_eq!(store.reads(), 8);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn firings_missed_during_a_long_run_are_skipped() {
        let store = store();
        // Two reads of 75s each: the run fired at 09:01:00 ends at 09:03:00
        store.slow_reads(Duration::from_secs(75));
        let started = tokio::time::Instant::now();
        let handle = start(store.clone());

        advance_to(200, started).await;
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.reads(), 2, "09:02 and 09:03 must not be replayed");

        // Next firing is 09:04:00
        advance_to(239, started).await;
        assert_eq!(store.reads(), 2);
        advance_to(241, started).await;
        assert_eq!(store.reads(), 3);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_failed_runs() {
        let store = store();
        store.fail_reads();
        let started = tokio::time::Instant::now();
        let handle = start(store.clone());

        advance_to(31, started).await;
        assert_eq!(store.reads(), 1);

        advance_to(151, started).await;
        assert_eq!(store.reads(), 3);
        assert!(store.notifications().is_empty());
        assert!(!handle.is_finished());

        handle.abort();
    }
}
