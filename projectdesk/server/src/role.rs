//! Role-scoped capabilities, dashboards and navigation.
//!
//! Every role maps to a fixed set of capabilities, exactly one dashboard and a
//! static navigation table. Handlers ask for a [`Capability`] rather than
//! comparing roles directly.

use serde::Serialize;

pub use crate::entities::sea_orm_active_enums::UserRole as Role;

/// An action a role may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    ViewProjects,
    ManageProjects,
    ManageTasks,
    ManageDependencies,
    ManageMilestones,
    ManageRisks,
    ManageResources,
    ManageTeams,
    /// Comments and the attachments that go with them.
    ManageComments,
    LogTime,
    ManageUsers,
}

/// One entry of a role's navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
}

const fn nav(label: &'static str, href: &'static str) -> NavItem {
    NavItem { label, href }
}

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::ViewProjects,
    Capability::ManageProjects,
    Capability::ManageTasks,
    Capability::ManageDependencies,
    Capability::ManageMilestones,
    Capability::ManageRisks,
    Capability::ManageResources,
    Capability::ManageTeams,
    Capability::ManageComments,
    Capability::LogTime,
    Capability::ManageUsers,
];

const PROJECT_MANAGER_CAPABILITIES: &[Capability] = &[
    Capability::ViewProjects,
    Capability::ManageProjects,
    Capability::ManageTasks,
    Capability::ManageDependencies,
    Capability::ManageMilestones,
    Capability::ManageRisks,
    Capability::ManageResources,
    Capability::ManageTeams,
    Capability::ManageComments,
    Capability::LogTime,
];

const TEAM_MEMBER_CAPABILITIES: &[Capability] = &[
    Capability::ViewProjects,
    Capability::ManageTasks,
    Capability::ManageDependencies,
    Capability::ManageComments,
    Capability::LogTime,
];

const CLIENT_CAPABILITIES: &[Capability] = &[Capability::ViewProjects];

const ADMIN_NAVIGATION: &[NavItem] = &[
    nav("Dashboard", "/admin/dashboard"),
    nav("Projects", "/admin/projects"),
    nav("Milestones", "/admin/milestones"),
    nav("Risks", "/admin/risks"),
    nav("Resources", "/admin/resources"),
    nav("Teams", "/admin/teams"),
    nav("Team Members", "/admin/team-members"),
    nav("Comments", "/admin/comments"),
    nav("Attachments", "/admin/attachments"),
    nav("Timesheets", "/admin/timesheets"),
    nav("Users", "/admin/users"),
];

const PROJECT_MANAGER_NAVIGATION: &[NavItem] = &[
    nav("Dashboard", "/manager/dashboard"),
    nav("Projects", "/manager/projects"),
    nav("Tasks", "/manager/tasks"),
    nav("Teams", "/manager/teams"),
];

const TEAM_MEMBER_NAVIGATION: &[NavItem] = &[
    nav("Dashboard", "/team/dashboard"),
    nav("My Tasks", "/team/tasks"),
    nav("New Task", "/team/tasks/new"),
];

const CLIENT_NAVIGATION: &[NavItem] = &[nav("Portal", "/client-portal")];

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::ProjectManager,
        Role::TeamMember,
        Role::Client,
    ];

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Admin => ADMIN_CAPABILITIES,
            Role::ProjectManager => PROJECT_MANAGER_CAPABILITIES,
            Role::TeamMember => TEAM_MEMBER_CAPABILITIES,
            Role::Client => CLIENT_CAPABILITIES,
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Landing page of the role after sign-in.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::ProjectManager => "/manager/dashboard",
            Role::TeamMember => "/team/dashboard",
            Role::Client => "/client-portal",
        }
    }

    /// Path prefix of the area only this role may enter.
    pub fn area_prefix(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::ProjectManager => "/manager",
            Role::TeamMember => "/team",
            Role::Client => "/client-portal",
        }
    }

    pub fn navigation(self) -> &'static [NavItem] {
        match self {
            Role::Admin => ADMIN_NAVIGATION,
            Role::ProjectManager => PROJECT_MANAGER_NAVIGATION,
            Role::TeamMember => TEAM_MEMBER_NAVIGATION,
            Role::Client => CLIENT_NAVIGATION,
        }
    }

    /// Returns the role owning the area `path` belongs to, if any.
    ///
    /// Prefixes match whole path segments, so `/teams` is not part of `/team`.
    pub fn owner_of_path(path: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| {
            let prefix = role.area_prefix();
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Where a user of this role should be sent when requesting `path`.
    ///
    /// `None` means the request may proceed.
    pub fn redirect_for(self, path: &str) -> Option<&'static str> {
        match Role::owner_of_path(path) {
            Some(owner) if owner != self => Some(self.dashboard_path()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_role_has_a_distinct_dashboard() {
        let dashboards: HashSet<_> = Role::ALL.iter().map(|r| r.dashboard_path()).collect();
        assert_eq!(dashboards.len(), Role::ALL.len());
    }

    #[test]
    fn dashboard_lives_inside_the_role_area() {
        for role in Role::ALL {
            assert_eq!(Role::owner_of_path(role.dashboard_path()), Some(role));
            assert_eq!(role.redirect_for(role.dashboard_path()), None);
        }
    }

    #[test]
    fn can_redirect_to_own_dashboard_from_foreign_area() {
        assert_eq!(
            Role::Client.redirect_for("/admin/users"),
            Some("/client-portal")
        );
        assert_eq!(
            Role::TeamMember.redirect_for("/manager/projects/4"),
            Some("/team/dashboard")
        );
        assert_eq!(
            Role::Admin.redirect_for("/team/dashboard"),
            Some("/admin/dashboard")
        );
    }

    #[test]
    fn paths_outside_role_areas_are_not_redirected() {
        assert_eq!(Role::owner_of_path("/teams"), None);
        assert_eq!(Role::owner_of_path("/client-portals"), None);
        assert_eq!(Role::Client.redirect_for("/health"), None);
    }

    #[test]
    fn only_admins_manage_users() {
        for role in Role::ALL {
            assert_eq!(role.can(Capability::ManageUsers), role == Role::Admin);
        }
    }

    #[test]
    fn every_role_can_view_projects() {
        assert!(Role::ALL.iter().all(|r| r.can(Capability::ViewProjects)));
    }

    #[test]
    fn can_list_team_member_capabilities() {
        insta::assert_yaml_snapshot!(Role::TeamMember.capabilities(), @r"
        - VIEW_PROJECTS
        - MANAGE_TASKS
        - MANAGE_DEPENDENCIES
        - MANAGE_COMMENTS
        - LOG_TIME
        ");
    }

    #[test]
    fn navigation_starts_with_dashboard() {
        for role in Role::ALL {
            assert_eq!(role.navigation()[0].href, role.dashboard_path());
        }
    }
}
