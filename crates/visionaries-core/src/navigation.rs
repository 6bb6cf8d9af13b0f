//! Role-based navigation and screen permissions.
//!
//! Pure lookups with no I/O. The typed entry points live on [`Role`]; the
//! string-keyed functions take the lowercase wire tag (`"teacher"`) and
//! never fail; any other spelling counts as an unknown role.

use crate::models::Role;

/// Route used when a role tag is not recognized.
pub const DEFAULT_ROUTE: &str = "/(tabs)/student";

impl Role {
    /// Landing route for this role.
    pub fn navigation_target(&self) -> &'static str {
        match self {
            Role::Student => "/(tabs)/student",
            Role::Teacher => "/(tabs)/teacher",
            Role::Parent => "/(tabs)/parent",
            Role::Staff => "/(tabs)/staff",
            Role::Driver => "/(tabs)/driver",
            Role::Admin => "/(tabs)/admin",
        }
    }

    /// Screens this role may open.
    pub fn permitted_screens(&self) -> &'static [&'static str] {
        match self {
            Role::Student => &["dashboard", "assignments", "grades", "schedule", "profile"],
            Role::Teacher => &["dashboard", "classes", "students", "grades", "schedule", "profile"],
            Role::Parent => &["dashboard", "children", "payments", "communications", "profile"],
            Role::Staff => &["dashboard", "users", "reports", "settings", "profile"],
            Role::Driver => &["dashboard", "routes", "students", "schedule", "profile"],
            Role::Admin => &["dashboard", "users", "analytics", "settings", "reports", "profile"],
        }
    }

    pub fn can_access(&self, screen: &str) -> bool {
        self.permitted_screens().contains(&screen)
    }
}

/// Landing route for a role tag, falling back to [`DEFAULT_ROUTE`].
pub fn navigation_target_for_role(role: &str) -> &'static str {
    Role::from_tag(role)
        .map(|r| r.navigation_target())
        .unwrap_or(DEFAULT_ROUTE)
}

/// True iff `screen` is in the permitted set of `role`.
/// Unknown roles and unknown screens are simply not permitted.
pub fn is_screen_permitted(role: &str, screen: &str) -> bool {
    Role::from_tag(role)
        .map(|r| r.can_access(screen))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_route_and_profile() {
        for role in Role::ALL {
            assert!(!role.navigation_target().is_empty());
            assert!(!navigation_target_for_role(role.as_str()).is_empty());
            assert!(is_screen_permitted(role.as_str(), "profile"), "{} lacks profile", role);
            assert!(role.can_access("dashboard"));
        }
    }

    #[test]
    fn test_routes_are_distinct_per_role() {
        let mut routes: Vec<&str> = Role::ALL.iter().map(|r| r.navigation_target()).collect();
        routes.sort_unstable();
        routes.dedup();
        assert_eq!(routes.len(), Role::ALL.len());
    }

    #[test]
    fn test_analytics_admin_only() {
        assert!(!is_screen_permitted("student", "analytics"));
        assert!(is_screen_permitted("admin", "analytics"));
        let with_analytics: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|r| r.can_access("analytics"))
            .collect();
        assert_eq!(with_analytics, vec![Role::Admin]);
    }

    #[test]
    fn test_role_specific_screens() {
        assert!(is_screen_permitted("teacher", "classes"));
        assert!(is_screen_permitted("parent", "payments"));
        assert!(is_screen_permitted("driver", "routes"));
        assert!(is_screen_permitted("staff", "reports"));
        assert!(!is_screen_permitted("driver", "grades"));
        assert!(!is_screen_permitted("parent", "users"));
    }

    #[test]
    fn test_unknown_role_or_screen() {
        assert_eq!(navigation_target_for_role("principal"), DEFAULT_ROUTE);
        assert_eq!(navigation_target_for_role(""), DEFAULT_ROUTE);
        assert!(!is_screen_permitted("principal", "profile"));
        assert!(!is_screen_permitted("admin", "cafeteria"));
        assert!(!is_screen_permitted("admin", ""));
    }

    #[test]
    fn test_role_tags_match_exactly() {
        assert!(is_screen_permitted("admin", "analytics"));
        assert!(!is_screen_permitted("ADMIN", "analytics"));
        assert!(!is_screen_permitted("Teacher", "classes"));
        assert_eq!(navigation_target_for_role("teacher"), "/(tabs)/teacher");
        assert_eq!(navigation_target_for_role("Teacher"), DEFAULT_ROUTE);
        assert_eq!(navigation_target_for_role("ADMIN"), DEFAULT_ROUTE);
    }
}
