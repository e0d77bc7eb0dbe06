// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account roles.
///
/// ## Role Hierarchy
///
/// - `Admin` - Everything an NGO can do, plus verifying NGO accounts
/// - `Ngo` - Case management on shared reports (once verified)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Registered NGO
    #[default]
    Ngo,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::Ngo, Role::Ngo) => true,
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "ngo" => Some(Role::Ngo),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Ngo => write!(f, "ngo"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::Ngo));
    }

    #[test]
    fn ngo_is_not_admin() {
        assert!(Role::Ngo.has_privilege(Role::Ngo));
        assert!(!Role::Ngo.has_privilege(Role::Admin));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("NGO"), Some(Role::Ngo));
        assert_eq!(Role::parse("client"), None);
    }

    #[test]
    fn default_role_is_ngo() {
        assert_eq!(Role::default(), Role::Ngo);
        assert_eq!(serde_json::to_string(&Role::Ngo).unwrap(), "\"ngo\"");
    }
}
