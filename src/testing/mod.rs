use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::database::manager::DatabaseError;
use crate::database::models::{Covenant, NewNotification, Notification, UserRoles};
use crate::scheduler::rules::is_overdue;
use crate::scheduler::{Clock, ComplianceStore};
use crate::types::CovenantStatus;

/// In-memory compliance store with injectable failures
#[derive(Default)]
pub struct MemoryStore {
    covenants: Mutex<Vec<Covenant>>,
    users: Mutex<Vec<UserRoles>>,
    notifications: Mutex<Vec<Notification>>,
    fail_reads: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    failing_recipients: Mutex<HashSet<i64>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new(covenants: Vec<Covenant>, users: Vec<UserRoles>) -> Self {
        Self {
            covenants: Mutex::new(covenants),
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    /// Every subsequent read returns an error
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Every subsequent read sleeps for `delay` (tokio time) before answering
    pub fn slow_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    /// Number of read calls made so far, failed ones included
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Inserts addressed to `user_id` fail
    pub fn fail_inserts_for(&self, user_id: i64) {
        self.failing_recipients.lock().unwrap().insert(user_id);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    /// Recipient ids, sorted
    pub fn recipients(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.notifications().iter().map(|n| n.user_id).collect();
        ids.sort();
        ids
    }

    async fn check_reads(&self) -> Result<(), DatabaseError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ComplianceStore for MemoryStore {
    async fn covenants_reviewed_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Covenant>, DatabaseError> {
        self.check_reads().await?;
        Ok(self
            .covenants
            .lock()
            .unwrap()
            .iter()
            .filter(|c| is_overdue(c.last_monitoring_date, cutoff))
            .cloned()
            .collect())
    }

    async fn covenants_with_status(&self, status: &CovenantStatus) -> Result<Vec<Covenant>, DatabaseError> {
        self.check_reads().await?;
        Ok(self
            .covenants
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.status == status.as_str())
            .cloned()
            .collect())
    }

    async fn users_with_roles(&self) -> Result<Vec<UserRoles>, DatabaseError> {
        self.check_reads().await?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, DatabaseError> {
        if self.failing_recipients.lock().unwrap().contains(&notification.user_id) {
            return Err(DatabaseError::Sqlx(sqlx::Error::Protocol(format!(
                "insert rejected for user {}",
                notification.user_id
            ))));
        }

        let row = Notification {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            is_read: false,
            created_at: notification.created_at,
        };
        self.notifications.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

/// Clock that starts at `origin` and advances with tokio time, so paused
/// tests can drive cron timers deterministically
pub struct TokioClock {
    origin: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        self.origin + chrono::Duration::from_std(self.started.elapsed()).unwrap()
    }
}

/// Covenant fixture with the given status and last review time
pub fn covenant(id: i64, status: &str, last_review: Option<DateTime<Utc>>) -> Covenant {
    let created = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    Covenant {
        id,
        contract_id: 1,
        code: format!("COV-{:03}", id),
        title: format!("Covenant {}", id),
        has_cure_period: Some(false),
        contract_article: None,
        status: status.to_string(),
        last_monitoring_date: last_review,
        future_risks: None,
        created_at: created,
        updated_at: created,
    }
}

/// User fixture holding the given stored role names
pub fn user(id: i64, roles: &[&str]) -> UserRoles {
    UserRoles {
        id,
        username: format!("user{}", id),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}
