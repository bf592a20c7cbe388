/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named roles recognised by the access policy and the alert audiences.
///
/// Stored in the `roles` table with a `ROLE_` prefix (e.g. `ROLE_FINANCE_HOLDING`).
/// Parsing accepts the name with or without the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    AdminHolding,
    AdminCountry,
    FinanceHolding,
    FinanceCountry,
    LegalHolding,
    LegalCountry,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::AdminHolding,
        Role::AdminCountry,
        Role::FinanceHolding,
        Role::FinanceCountry,
        Role::LegalHolding,
        Role::LegalCountry,
    ];

    /// Bare role name, without the `ROLE_` prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::AdminHolding => "ADMIN_HOLDING",
            Role::AdminCountry => "ADMIN_COUNTRY",
            Role::FinanceHolding => "FINANCE_HOLDING",
            Role::FinanceCountry => "FINANCE_COUNTRY",
            Role::LegalHolding => "LEGAL_HOLDING",
            Role::LegalCountry => "LEGAL_COUNTRY",
        }
    }

    /// Name as stored in the `roles` table
    pub fn stored_name(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }

    /// Parse a stored or bare role name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Role> {
        let bare = name.trim();
        let bare = bare.strip_prefix("ROLE_").unwrap_or(bare);
        Role::ALL.into_iter().find(|role| role.as_str() == bare)
    }

    /// Parse every recognised role out of a list of stored names
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Vec<Role> {
        let mut roles: Vec<Role> = names.iter().filter_map(|n| Role::from_name(n.as_ref())).collect();
        roles.sort();
        roles.dedup();
        roles
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_name(s).ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// Covenant / monitoring result status.
///
/// The column is free text supplied by clients. Known labels map to their
/// variants by exact, case-sensitive match; anything else is kept verbatim in
/// `Other` so existing data round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CovenantStatus {
    #[default]
    Pending,
    Compliant,
    AtRisk,
    Breached,
    Other(String),
}

impl CovenantStatus {
    pub const PENDING: &'static str = "PENDING";
    pub const COMPLIANT: &'static str = "VERDE";
    pub const AT_RISK: &'static str = "GIALLO";
    pub const BREACHED: &'static str = "ROSSO";

    pub fn as_str(&self) -> &str {
        match self {
            CovenantStatus::Pending => Self::PENDING,
            CovenantStatus::Compliant => Self::COMPLIANT,
            CovenantStatus::AtRisk => Self::AT_RISK,
            CovenantStatus::Breached => Self::BREACHED,
            CovenantStatus::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CovenantStatus::Other(_))
    }
}

impl From<&str> for CovenantStatus {
    fn from(label: &str) -> Self {
        match label {
            Self::PENDING => CovenantStatus::Pending,
            Self::COMPLIANT => CovenantStatus::Compliant,
            Self::AT_RISK => CovenantStatus::AtRisk,
            Self::BREACHED => CovenantStatus::Breached,
            other => CovenantStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for CovenantStatus {
    fn from(label: String) -> Self {
        CovenantStatus::from(label.as_str())
    }
}

impl From<CovenantStatus> for String {
    fn from(status: CovenantStatus) -> Self {
        match status {
            CovenantStatus::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CovenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_with_and_without_prefix() {
        assert_eq!(Role::from_name("ROLE_FINANCE_HOLDING"), Some(Role::FinanceHolding));
        assert_eq!(Role::from_name("LEGAL_COUNTRY"), Some(Role::LegalCountry));
        assert_eq!(Role::from_name("ROLE_ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_name("ROLE_AUDITOR"), None);
        assert_eq!(Role::from_name("finance_holding"), None);
    }

    #[test]
    fn admin_is_distinct_from_admin_holding() {
        assert_ne!(Role::from_name("ROLE_ADMIN"), Role::from_name("ROLE_ADMIN_HOLDING"));
    }

    #[test]
    fn parse_all_skips_unknown_and_dedups() {
        let roles = Role::parse_all(&["ROLE_ADMIN", "ADMIN", "ROLE_SOMETHING", "ROLE_LEGAL_HOLDING"]);
        assert_eq!(roles, vec![Role::Admin, Role::LegalHolding]);
    }

    #[test]
    fn stored_name_has_prefix() {
        assert_eq!(Role::AdminCountry.stored_name(), "ROLE_ADMIN_COUNTRY");
    }

    #[test]
    fn status_matches_known_labels_exactly() {
        assert_eq!(CovenantStatus::from("GIALLO"), CovenantStatus::AtRisk);
        assert_eq!(CovenantStatus::from("ROSSO"), CovenantStatus::Breached);
        assert_eq!(CovenantStatus::from("PENDING"), CovenantStatus::Pending);
        // No case folding or trimming: these stay as free-form labels
        assert_eq!(CovenantStatus::from("rosso"), CovenantStatus::Other("rosso".into()));
        assert_eq!(CovenantStatus::from("ROSSO "), CovenantStatus::Other("ROSSO ".into()));
    }

    #[test]
    fn status_round_trips_unknown_labels() {
        let status = CovenantStatus::from("NON-COMPLIANT");
        assert!(!status.is_known());
        assert_eq!(String::from(status), "NON-COMPLIANT");
    }

    #[test]
    fn status_serializes_as_plain_string() {
        let json = serde_json::to_string(&CovenantStatus::Breached).unwrap();
        assert_eq!(json, "\"ROSSO\"");
        let back: CovenantStatus = serde_json::from_str("\"COMPLIANT\"").unwrap();
        assert_eq!(back, CovenantStatus::Other("COMPLIANT".into()));
    }
}
