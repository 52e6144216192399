//! Role hierarchy - a closed set of roles ordered by a single linear rank.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Application role. Higher rank strictly dominates lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    User,
    Viewer,
}

/// A role string outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid role: {0}")]
pub struct InvalidRole(pub String);

impl Role {
    pub const ALL: [Role; 4] = [Role::Superadmin, Role::Admin, Role::User, Role::Viewer];

    pub fn rank(self) -> u8 {
        match self {
            Role::Superadmin => 100,
            Role::Admin => 80,
            Role::User => 50,
            Role::Viewer => 10,
        }
    }

    /// `true` when `self` ranks at or above `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::User => "user",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Exact match only: "Admin" or " admin" are not roles.
impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| InvalidRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_matches_rank_order_for_every_pair() {
        for actual in Role::ALL {
            for required in Role::ALL {
                assert_eq!(
                    actual.satisfies(required),
                    actual.rank() >= required.rank(),
                    "{actual} vs {required}"
                );
            }
        }
    }

    #[test]
    fn satisfies_is_reflexive_and_transitive() {
        for a in Role::ALL {
            assert!(a.satisfies(a));
            for b in Role::ALL {
                for c in Role::ALL {
                    if a.satisfies(b) && b.satisfies(c) {
                        assert!(a.satisfies(c));
                    }
                }
            }
        }
    }

    #[test]
    fn ranks_are_strictly_ordered() {
        assert!(Role::Superadmin.rank() > Role::Admin.rank());
        assert!(Role::Admin.rank() > Role::User.rank());
        assert!(Role::User.rank() > Role::Viewer.rank());
        assert!(!Role::Viewer.satisfies(Role::Admin));
        assert!(Role::Superadmin.satisfies(Role::User));
    }

    #[test]
    fn parses_only_members_of_the_fixed_set() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("viewer".parse::<Role>(), Ok(Role::Viewer));
        assert!("Admin".parse::<Role>().is_err());
        assert!("owner".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn serde_rejects_unknown_roles() {
        assert_eq!(
            serde_json::from_str::<Role>("\"superadmin\"").unwrap(),
            Role::Superadmin
        );
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }
}
