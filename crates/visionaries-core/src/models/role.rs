use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of user roles.
///
/// Every role maps to exactly one navigation target and one permitted-screen
/// set (see [`crate::navigation`]). Adding a variant is a breaking change:
/// both mappings are exhaustive `match`es and will fail to compile until
/// they are updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Parent,
    Staff,
    Driver,
    Admin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::Teacher,
        Role::Parent,
        Role::Staff,
        Role::Driver,
        Role::Admin,
    ];

    /// Wire/route identifier (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::Staff => "staff",
            Role::Driver => "driver",
            Role::Admin => "admin",
        }
    }

    /// Get the display name for this role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Parent => "Parent",
            Role::Staff => "Staff",
            Role::Driver => "Driver",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Exact match on the lowercase wire tag.
    pub fn from_tag(tag: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == tag)
    }
}

/// Lenient parse for human input: ignores case and surrounding whitespace.
impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == lower)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str_case_insensitive() {
        assert_eq!("student".parse::<Role>(), Ok(Role::Student));
        assert_eq!("TEACHER".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
    }

    #[test]
    fn test_role_from_tag_is_exact() {
        assert_eq!(Role::from_tag("staff"), Some(Role::Staff));
        assert_eq!(Role::from_tag("Staff"), None);
        assert_eq!(Role::from_tag(" staff"), None);
        assert_eq!(Role::from_tag("principal"), None);
    }

    #[test]
    fn test_role_from_str_unknown() {
        assert_eq!(
            "principal".parse::<Role>(),
            Err(UnknownRole("principal".to_string()))
        );
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Driver).expect("serialize role");
        assert_eq!(json, "\"driver\"");

        let parsed: Role = serde_json::from_str("\"parent\"").expect("parse role");
        assert_eq!(parsed, Role::Parent);
    }

    #[test]
    fn test_role_display_matches_as_str() {
        for role in Role::ALL {
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
