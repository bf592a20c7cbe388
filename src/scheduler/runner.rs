use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::audience::resolve_audience;
use super::clock::Clock;
use super::rules::{overdue_cutoff, AlertKind, Rule};
use super::store::ComplianceStore;
use super::SchedulerError;
use crate::config::SchedulerConfig;
use crate::database::models::NewNotification;

/// Outcome of one alert class within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    pub alert: AlertKind,
    /// Matching covenants; `None` for unconditional alerts
    pub candidates: Option<usize>,
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub rule: Rule,
    pub evaluated_at: DateTime<Utc>,
    pub fanouts: Vec<FanoutReport>,
}

impl RunReport {
    pub fn delivered(&self) -> usize {
        self.fanouts.iter().map(|f| f.delivered).sum()
    }

    pub fn failed(&self) -> usize {
        self.fanouts.iter().map(|f| f.failed).sum()
    }
}

/// Who gets what, computed entirely from reads before anything is written
struct FanoutPlan {
    alert: AlertKind,
    candidates: Option<usize>,
    recipients: BTreeSet<i64>,
}

/// Evaluates review rules against the store and writes the notifications
pub struct ComplianceScheduler {
    store: Arc<dyn ComplianceStore>,
    clock: Arc<dyn Clock>,
    overdue_months: u32,
    fanout_concurrency: usize,
}

impl ComplianceScheduler {
    pub fn new(store: Arc<dyn ComplianceStore>, clock: Arc<dyn Clock>, settings: &SchedulerConfig) -> Self {
        Self {
            store,
            clock,
            overdue_months: settings.overdue_months,
            fanout_concurrency: settings.fanout_concurrency.max(1),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Run one rule now.
    ///
    /// A failed read aborts the run before any notification is written.
    /// A failed insert is logged and counted, and the rest of the audience
    /// is still attempted.
    pub async fn run(&self, rule: Rule) -> Result<RunReport, SchedulerError> {
        let now = self.clock.now();

        let plans = self.plan(rule, now).await.map_err(|e| {
            error!("Scheduler rule {} aborted, store read failed: {}", rule, e);
            e
        })?;

        let mut fanouts = Vec::with_capacity(plans.len());
        for plan in plans {
            fanouts.push(self.fan_out(plan, now).await);
        }

        let report = RunReport {
            rule,
            evaluated_at: now,
            fanouts,
        };
        info!(
            "Scheduler rule {} finished: {} delivered, {} failed",
            rule,
            report.delivered(),
            report.failed()
        );
        Ok(report)
    }

    async fn plan(&self, rule: Rule, now: DateTime<Utc>) -> Result<Vec<FanoutPlan>, SchedulerError> {
        let mut candidates = Vec::new();
        for &alert in rule.alerts() {
            let count = match alert {
                AlertKind::Overdue => {
                    let cutoff = overdue_cutoff(now, self.overdue_months);
                    Some(self.store.covenants_reviewed_before(cutoff).await?.len())
                }
                AlertKind::Quarterly => None,
                AlertKind::AtRisk | AlertKind::Breached => match alert.candidate_status() {
                    Some(status) => Some(self.store.covenants_with_status(&status).await?.len()),
                    None => None,
                },
            };
            candidates.push((alert, count));
        }

        // Nothing to announce, no need to read users
        if candidates.iter().all(|(_, count)| *count == Some(0)) {
            return Ok(candidates
                .into_iter()
                .map(|(alert, count)| FanoutPlan {
                    alert,
                    candidates: count,
                    recipients: BTreeSet::new(),
                })
                .collect());
        }

        let users = self.store.users_with_roles().await?;

        Ok(candidates
            .into_iter()
            .map(|(alert, count)| FanoutPlan {
                alert,
                candidates: count,
                recipients: if count == Some(0) {
                    BTreeSet::new()
                } else {
                    resolve_audience(&users, alert.audience())
                },
            })
            .collect())
    }

    async fn fan_out(&self, plan: FanoutPlan, now: DateTime<Utc>) -> FanoutReport {
        let alert = plan.alert;
        let title = alert.title();
        let message = alert.message(plan.candidates.unwrap_or_default());

        let outcomes: Vec<bool> = stream::iter(plan.recipients.iter().copied())
            .map(|user_id| {
                let store = Arc::clone(&self.store);
                let notification = NewNotification {
                    user_id,
                    title: title.to_string(),
                    message: message.clone(),
                    created_at: now,
                };
                async move {
                    match store.insert_notification(notification).await {
                        Ok(_) => true,
                        Err(e) => {
                            warn!("Failed to notify user {} ({:?}): {}", user_id, alert, e);
                            false
                        }
                    }
                }
            })
            .buffer_unordered(self.fanout_concurrency)
            .collect()
            .await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        let report = FanoutReport {
            alert,
            candidates: plan.candidates,
            recipients: plan.recipients.len(),
            delivered,
            failed: outcomes.len() - delivered,
        };

        info!(
            "Alert {:?}: {} candidates, {} recipients, {} delivered, {} failed",
            report.alert,
            report.candidates.map_or_else(|| "-".to_string(), |c| c.to_string()),
            report.recipients,
            report.delivered,
            report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::clock::FixedClock;
    use crate::testing::{covenant, user, MemoryStore};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()
    }

    fn scheduler(store: Arc<MemoryStore>) -> ComplianceScheduler {
        ComplianceScheduler::new(store, Arc::new(FixedClock(now())), &SchedulerConfig::default())
    }

    fn fanout(report: &RunReport, alert: AlertKind) -> &FanoutReport {
        report.fanouts.iter().find(|f| f.alert == alert).unwrap()
    }

    #[tokio::test]
    async fn overdue_notifies_finance_only() {
        let store = Arc::new(MemoryStore::new(
            vec![
                covenant(1, "VERDE", Some(now() - Duration::days(120))),
                covenant(2, "VERDE", Some(now() - Duration::days(30))),
            ],
            vec![user(1, &["ROLE_FINANCE_HOLDING"]), user(2, &["ROLE_LEGAL_HOLDING"])],
        ));

        let report = scheduler(store.clone()).run(Rule::OverdueMonitoring).await.unwrap();

        let notes = store.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_id, 1);
        assert_eq!(notes[0].title, "Promemoria Monitoraggio Covenant");
        assert_eq!(notes[0].message, "Ci sono 1 covenant che richiedono monitoraggio.");
        assert!(!notes[0].is_read);
        assert_eq!(notes[0].created_at, now());
        assert_eq!(fanout(&report, AlertKind::Overdue).candidates, Some(1));
    }

    #[tokio::test]
    async fn overdue_counts_never_reviewed_and_ignores_other_fields() {
        let cutoff = overdue_cutoff(now(), 3);
        let store = Arc::new(MemoryStore::new(
            vec![
                covenant(1, "ROSSO", None),
                covenant(2, "anything", Some(cutoff - Duration::seconds(1))),
                covenant(3, "PENDING", Some(cutoff)),
                covenant(4, "GIALLO", Some(now())),
            ],
            vec![user(7, &["ROLE_FINANCE_COUNTRY"])],
        ));

        let report = scheduler(store.clone()).run(Rule::OverdueMonitoring).await.unwrap();

        assert_eq!(fanout(&report, AlertKind::Overdue).candidates, Some(2));
        assert_eq!(store.notifications()[0].message, "Ci sono 2 covenant che richiedono monitoraggio.");
    }

    #[tokio::test]
    async fn breached_reaches_admin_and_legal_roles() {
        let store = Arc::new(MemoryStore::new(
            vec![covenant(3, "ROSSO", Some(now()))],
            vec![
                user(3, &["ROLE_ADMIN_COUNTRY"]),
                user(4, &["ROLE_LEGAL_COUNTRY"]),
                user(5, &[]),
            ],
        ));

        let report = scheduler(store.clone()).run(Rule::RiskAlerts).await.unwrap();

        assert_eq!(store.recipients(), vec![3, 4]);
        assert!(store
            .notifications()
            .iter()
            .all(|n| n.title == "URGENTE: Covenant non Rispettati"));
        let at_risk = fanout(&report, AlertKind::AtRisk);
        assert_eq!(at_risk.candidates, Some(0));
        assert_eq!(at_risk.recipients, 0);
        assert_eq!(fanout(&report, AlertKind::Breached).delivered, 2);
    }

    #[tokio::test]
    async fn risk_alerts_with_no_matches_send_nothing() {
        let store = Arc::new(MemoryStore::new(
            vec![covenant(1, "VERDE", None), covenant(2, "rosso", None)],
            vec![user(1, &["ROLE_FINANCE_HOLDING", "ROLE_LEGAL_HOLDING"])],
        ));

        let report = scheduler(store.clone()).run(Rule::RiskAlerts).await.unwrap();

        assert!(store.notifications().is_empty());
        assert_eq!(report.delivered(), 0);
    }

    #[tokio::test]
    async fn user_in_both_risk_audiences_gets_one_per_sub_rule() {
        let store = Arc::new(MemoryStore::new(
            vec![covenant(1, "GIALLO", None), covenant(2, "ROSSO", None), covenant(3, "ROSSO", None)],
            vec![user(1, &["ROLE_FINANCE_HOLDING"]), user(2, &["ROLE_LEGAL_HOLDING"])],
        ));

        scheduler(store.clone()).run(Rule::RiskAlerts).await.unwrap();

        let notes = store.notifications();
        let for_finance: Vec<_> = notes.iter().filter(|n| n.user_id == 1).collect();
        assert_eq!(for_finance.len(), 2);
        assert!(for_finance.iter().any(|n| n.message.starts_with("Ci sono 1 covenant con status GIALLO")));
        assert!(for_finance.iter().any(|n| n.message.starts_with("Ci sono 2 covenant con status ROSSO")));
        assert_eq!(notes.iter().filter(|n| n.user_id == 2).count(), 1);
    }

    #[tokio::test]
    async fn user_holding_every_role_is_notified_once() {
        let names: Vec<String> = crate::types::Role::ALL.iter().map(|r| r.stored_name()).collect();
        let every_role: Vec<&str> = names.iter().map(String::as_str).collect();
        let store = Arc::new(MemoryStore::new(
            vec![],
            vec![user(1, &every_role), user(2, &["ROLE_FINANCE_COUNTRY"])],
        ));

        let report = scheduler(store.clone()).run(Rule::QuarterlyReminder).await.unwrap();

        assert_eq!(store.recipients(), vec![1, 2]);
        let quarterly = fanout(&report, AlertKind::Quarterly);
        assert_eq!(quarterly.candidates, None);
        assert_eq!(quarterly.recipients, 2);
        assert_eq!(
            store.notifications()[0].message,
            "È necessario completare il monitoraggio trimestrale dei covenant entro 5 giorni."
        );
    }

    #[tokio::test]
    async fn repeated_runs_send_duplicate_alerts() {
        let store = Arc::new(MemoryStore::new(
            vec![covenant(1, "VERDE", None)],
            vec![user(1, &["ROLE_FINANCE_HOLDING"]), user(2, &["ROLE_FINANCE_COUNTRY"])],
        ));
        let scheduler = scheduler(store.clone());

        scheduler.run(Rule::OverdueMonitoring).await.unwrap();
        scheduler.run(Rule::OverdueMonitoring).await.unwrap();

        assert_eq!(store.recipients(), vec![1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn read_failure_aborts_without_writes() {
        let store = Arc::new(MemoryStore::new(
            vec![covenant(1, "ROSSO", None)],
            vec![user(1, &["ROLE_FINANCE_HOLDING"])],
        ));
        store.fail_reads();

        let result = scheduler(store.clone()).run(Rule::RiskAlerts).await;

        assert!(matches!(result, Err(SchedulerError::Store(_))));
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_does_not_stop_the_fanout() {
        let store = Arc::new(MemoryStore::new(
            vec![covenant(1, "GIALLO", None)],
            vec![
                user(1, &["ROLE_FINANCE_HOLDING"]),
                user(2, &["ROLE_ADMIN_HOLDING"]),
                user(3, &["ROLE_FINANCE_COUNTRY"]),
            ],
        ));
        store.fail_inserts_for(2);

        let report = scheduler(store.clone()).run(Rule::RiskAlerts).await.unwrap();

        assert_eq!(store.recipients(), vec![1, 3]);
        let at_risk = fanout(&report, AlertKind::AtRisk);
        assert_eq!((at_risk.recipients, at_risk.delivered, at_risk.failed), (3, 2, 1));
        assert_eq!(report.failed(), 1);
    }
}
