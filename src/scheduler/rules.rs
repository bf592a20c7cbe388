use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SchedulerError;
use crate::config::SchedulerConfig;
use crate::types::{CovenantStatus, Role};

/// The three independently scheduled review rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    OverdueMonitoring,
    QuarterlyReminder,
    RiskAlerts,
}

impl Rule {
    pub const ALL: [Rule; 3] = [Rule::OverdueMonitoring, Rule::QuarterlyReminder, Rule::RiskAlerts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::OverdueMonitoring => "overdue-monitoring",
            Rule::QuarterlyReminder => "quarterly-reminder",
            Rule::RiskAlerts => "risk-alerts",
        }
    }

    /// Alert classes emitted by one firing, in evaluation order
    pub fn alerts(&self) -> &'static [AlertKind] {
        match self {
            Rule::OverdueMonitoring => &[AlertKind::Overdue],
            Rule::QuarterlyReminder => &[AlertKind::Quarterly],
            Rule::RiskAlerts => &[AlertKind::AtRisk, AlertKind::Breached],
        }
    }

    pub fn cron_expression<'a>(&self, settings: &'a SchedulerConfig) -> &'a str {
        match self {
            Rule::OverdueMonitoring => &settings.overdue_cron,
            Rule::QuarterlyReminder => &settings.quarterly_cron,
            Rule::RiskAlerts => &settings.risk_alert_cron,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rule {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rule::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| SchedulerError::UnknownRule(s.to_string()))
    }
}

const FINANCE: &[Role] = &[Role::FinanceHolding, Role::FinanceCountry];
const AT_RISK_AUDIENCE: &[Role] = &[
    Role::FinanceHolding,
    Role::FinanceCountry,
    Role::AdminHolding,
    Role::AdminCountry,
];
const BREACHED_AUDIENCE: &[Role] = &[
    Role::FinanceHolding,
    Role::FinanceCountry,
    Role::AdminHolding,
    Role::AdminCountry,
    Role::LegalHolding,
    Role::LegalCountry,
];

/// One class of notification, with its audience and wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overdue,
    Quarterly,
    AtRisk,
    Breached,
}

impl AlertKind {
    /// Role union: a user holding any of these receives the alert
    pub fn audience(&self) -> &'static [Role] {
        match self {
            AlertKind::Overdue | AlertKind::Quarterly => FINANCE,
            AlertKind::AtRisk => AT_RISK_AUDIENCE,
            AlertKind::Breached => BREACHED_AUDIENCE,
        }
    }

    /// Status label selecting the candidate covenants, for status-driven alerts
    pub fn candidate_status(&self) -> Option<CovenantStatus> {
        match self {
            AlertKind::AtRisk => Some(CovenantStatus::AtRisk),
            AlertKind::Breached => Some(CovenantStatus::Breached),
            AlertKind::Overdue | AlertKind::Quarterly => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::Overdue => "Promemoria Monitoraggio Covenant",
            AlertKind::Quarterly => "Monitoraggio Trimestrale Covenant",
            AlertKind::AtRisk => "Covenant a Rischio",
            AlertKind::Breached => "URGENTE: Covenant non Rispettati",
        }
    }

    pub fn message(&self, count: usize) -> String {
        match self {
            AlertKind::Overdue => format!("Ci sono {} covenant che richiedono monitoraggio.", count),
            AlertKind::Quarterly => {
                "È necessario completare il monitoraggio trimestrale dei covenant entro 5 giorni.".to_string()
            }
            AlertKind::AtRisk => format!(
                "Ci sono {} covenant con status {} che potrebbero non essere rispettati nei prossimi 12 mesi.",
                count,
                CovenantStatus::AT_RISK
            ),
            AlertKind::Breached => format!(
                "Ci sono {} covenant con status {} che non sono rispettati. È necessaria un'azione immediata.",
                count,
                CovenantStatus::BREACHED
            ),
        }
    }
}

/// Reviews strictly older than this are overdue
pub fn overdue_cutoff(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// A covenant never reviewed is always overdue
pub fn is_overdue(last_review: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    last_review.map_or(true, |reviewed| reviewed < cutoff)
}
