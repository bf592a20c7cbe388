use std::collections::BTreeSet;

use crate::database::models::UserRoles;
use crate::types::Role;

/// Ids of every user holding at least one role in `filter`.
///
/// Stored names are compared exactly against `ROLE_<NAME>`; anything else
/// grants nothing. Row order does not affect the result, and a user holding
/// several qualifying roles appears once.
pub fn resolve_audience(users: &[UserRoles], filter: &[Role]) -> BTreeSet<i64> {
    let wanted: Vec<String> = filter.iter().map(Role::stored_name).collect();
    users
        .iter()
        .filter(|user| user.roles.iter().any(|name| wanted.contains(name)))
        .map(|user| user.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, roles: &[&str]) -> UserRoles {
        UserRoles {
            id,
            username: format!("user{}", id),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn role_union_membership() {
        let users = vec![
            user(1, &["ROLE_FINANCE_HOLDING"]),
            user(2, &["ROLE_LEGAL_HOLDING"]),
            user(3, &["ROLE_FINANCE_COUNTRY", "ROLE_ADMIN"]),
            user(4, &[]),
        ];
        let audience = resolve_audience(&users, &[Role::FinanceHolding, Role::FinanceCountry]);
        assert_eq!(audience, BTreeSet::from([1, 3]));
    }

    #[test]
    fn user_with_every_role_appears_once() {
        let all: Vec<String> = Role::ALL.iter().map(|r| r.stored_name()).collect();
        let users = vec![UserRoles { id: 9, username: "root".into(), roles: all }];
        let audience = resolve_audience(&users, &Role::ALL);
        assert_eq!(audience.len(), 1);
    }

    #[test]
    fn independent_of_row_order() {
        let mut users = vec![
            user(1, &["ROLE_ADMIN_COUNTRY"]),
            user(2, &["ROLE_LEGAL_COUNTRY"]),
            user(3, &["ROLE_FINANCE_HOLDING"]),
            user(4, &["ROLE_UNKNOWN"]),
        ];
        let filter = [Role::AdminCountry, Role::LegalCountry];
        let forward = resolve_audience(&users, &filter);
        users.reverse();
        assert_eq!(forward, resolve_audience(&users, &filter));
        assert_eq!(forward, BTreeSet::from([1, 2]));
    }

    #[test]
    fn only_exact_stored_names_qualify() {
        let users = vec![
            user(1, &["FINANCE_HOLDING"]),
            user(2, &[" ROLE_FINANCE_COUNTRY "]),
            user(3, &["role_finance_holding"]),
            user(4, &["ROLE_FINANCE_COUNTRY"]),
        ];
        let audience = resolve_audience(&users, &[Role::FinanceHolding, Role::FinanceCountry]);
        assert_eq!(audience, BTreeSet::from([4]));
    }

    #[test]
    fn admin_does_not_match_admin_holding() {
        let users = vec![user(1, &["ROLE_ADMIN"])];
        assert!(resolve_audience(&users, &[Role::AdminHolding]).is_empty());
    }
}
