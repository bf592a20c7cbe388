//! Operation → role table enforced at the request boundary.

use crate::types::Role;

const FINANCE: [Role; 2] = [Role::FinanceHolding, Role::FinanceCountry];

/// Every protected operation that is gated by role membership.
/// Notification access is gated by ownership instead and has no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadContracts,
    WriteContracts,
    WriteCovenants,
    CovenantsDueForMonitoring,
    ReadMonitoringResults,
    WriteMonitoringResults,
    Delete,
    ManageUsers,
    ManageScheduler,
}

impl Operation {
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Operation::ReadContracts => &[
                Role::Admin,
                FINANCE[0],
                FINANCE[1],
                Role::LegalHolding,
                Role::LegalCountry,
            ],
            Operation::WriteContracts | Operation::CovenantsDueForMonitoring | Operation::WriteMonitoringResults => {
                &[Role::Admin, FINANCE[0], FINANCE[1]]
            }
            Operation::WriteCovenants => &[Role::Admin, Role::LegalHolding, Role::LegalCountry],
            Operation::ReadMonitoringResults => &[
                Role::Admin,
                FINANCE[0],
                FINANCE[1],
                Role::AdminHolding,
                Role::AdminCountry,
            ],
            Operation::Delete | Operation::ManageUsers | Operation::ManageScheduler => &[Role::Admin],
        }
    }

    /// True when any of `roles` is allowed to perform this operation
    pub fn permits(&self, roles: &[Role]) -> bool {
        let allowed = self.allowed_roles();
        roles.iter().any(|role| allowed.contains(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_reads_contracts_but_cannot_write_them() {
        let legal = [Role::LegalCountry];
        assert!(Operation::ReadContracts.permits(&legal));
        assert!(!Operation::WriteContracts.permits(&legal));
        assert!(Operation::WriteCovenants.permits(&legal));
    }

    #[test]
    fn admin_holding_reads_results_only() {
        let roles = [Role::AdminHolding];
        assert!(Operation::ReadMonitoringResults.permits(&roles));
        assert!(!Operation::WriteMonitoringResults.permits(&roles));
        assert!(!Operation::ReadContracts.permits(&roles));
        assert!(!Operation::Delete.permits(&roles));
    }

    #[test]
    fn only_admin_deletes() {
        for role in Role::ALL {
            assert_eq!(Operation::Delete.permits(&[role]), role == Role::Admin);
        }
    }

    #[test]
    fn no_roles_permits_nothing() {
        assert!(!Operation::ReadContracts.permits(&[]));
    }
}
