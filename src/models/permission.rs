//! Role and permission model.
//!
//! Roles and permissions are closed enumerations; the registry is the
//! single static table mapping one to the other. It is built once at
//! startup and never mutated.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User role enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TeachingAssistant,
    Instructor,
    Admin,
    DepartmentChair,
    Dean,
}

impl Role {
    /// All defined roles.
    pub const ALL: [Role; 5] = [
        Role::TeachingAssistant,
        Role::Instructor,
        Role::Admin,
        Role::DepartmentChair,
        Role::Dean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::TeachingAssistant => "teaching_assistant",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
            Role::DepartmentChair => "department_chair",
            Role::Dean => "dean",
        }
    }

    /// Parse a wire-format role name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|r| r.as_str() == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability token checked by the authorization guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewUsers,
    ManageUsers,
    ViewCourses,
    ManageCourses,
    CreateAssignment,
    ViewAssignments,
    RequestLeave,
    RequestSwap,
    ApproveApplication,
    ViewReports,
    ViewAuditLogs,
    SendNotifications,
}

impl Permission {
    /// All defined permissions.
    pub const ALL: [Permission; 12] = [
        Permission::ViewUsers,
        Permission::ManageUsers,
        Permission::ViewCourses,
        Permission::ManageCourses,
        Permission::CreateAssignment,
        Permission::ViewAssignments,
        Permission::RequestLeave,
        Permission::RequestSwap,
        Permission::ApproveApplication,
        Permission::ViewReports,
        Permission::ViewAuditLogs,
        Permission::SendNotifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewUsers => "view_users",
            Permission::ManageUsers => "manage_users",
            Permission::ViewCourses => "view_courses",
            Permission::ManageCourses => "manage_courses",
            Permission::CreateAssignment => "create_assignment",
            Permission::ViewAssignments => "view_assignments",
            Permission::RequestLeave => "request_leave",
            Permission::RequestSwap => "request_swap",
            Permission::ApproveApplication => "approve_application",
            Permission::ViewReports => "view_reports",
            Permission::ViewAuditLogs => "view_audit_logs",
            Permission::SendNotifications => "send_notifications",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static permission grants for a role. The match is exhaustive, so
/// adding a role without defining its grants fails to compile.
fn grants_for(role: Role) -> HashSet<Permission> {
    use Permission::*;

    let grants: &[Permission] = match role {
        Role::TeachingAssistant => &[ViewCourses, ViewAssignments, RequestLeave, RequestSwap],
        Role::Instructor => &[
            ViewUsers,
            ViewCourses,
            ManageCourses,
            CreateAssignment,
            ViewAssignments,
            ViewReports,
        ],
        Role::Admin => &Permission::ALL,
        Role::DepartmentChair => &[
            ViewUsers,
            ViewCourses,
            ManageCourses,
            CreateAssignment,
            ViewAssignments,
            ApproveApplication,
            ViewReports,
            SendNotifications,
        ],
        Role::Dean => &[
            ViewUsers,
            ViewCourses,
            ViewAssignments,
            ApproveApplication,
            ViewReports,
        ],
    };

    grants.iter().copied().collect()
}

/// Immutable role-to-permission table.
///
/// Built once at process start; read-only afterwards. Every role maps to
/// a defined set, and unknown role names resolve to the empty set.
#[derive(Debug)]
pub struct PermissionRegistry {
    grants: HashMap<Role, HashSet<Permission>>,
    empty: HashSet<Permission>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        let grants = Role::ALL.iter().map(|&r| (r, grants_for(r))).collect();
        Self {
            grants,
            empty: HashSet::new(),
        }
    }

    /// Permission set for a role. Every defined role is present.
    pub fn permissions_for(&self, role: Role) -> &HashSet<Permission> {
        self.grants.get(&role).unwrap_or(&self.empty)
    }

    /// Permission set for a raw role name; empty for unknown names.
    pub fn permissions_for_name(&self, name: &str) -> &HashSet<Permission> {
        match Role::parse(name) {
            Some(role) => self.permissions_for(role),
            None => &self.empty,
        }
    }

    /// Whether a raw role name is a defined role.
    pub fn role_exists(&self, name: &str) -> bool {
        Role::parse(name).is_some()
    }

    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.permissions_for(role).contains(&permission)
    }
}

impl Default for PermissionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
