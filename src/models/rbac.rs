// src/models/rbac.rs
//
// Tabela estática cargo -> permissões. O frontend usa a mesma lista
// (GET /api/users/me/permissions) para esconder ações, e o backend a usa
// no extrator `RequirePermission`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::auth::{User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "leads:read")]
    LeadsRead,
    #[serde(rename = "leads:create")]
    LeadsCreate,
    #[serde(rename = "leads:update")]
    LeadsUpdate,
    #[serde(rename = "leads:delete")]
    LeadsDelete,
    #[serde(rename = "leads:assign")]
    LeadsAssign,
    #[serde(rename = "leads:import")]
    LeadsImport,
    #[serde(rename = "customers:read")]
    CustomersRead,
    #[serde(rename = "customers:create")]
    CustomersCreate,
    #[serde(rename = "customers:update")]
    CustomersUpdate,
    #[serde(rename = "customers:delete")]
    CustomersDelete,
    #[serde(rename = "revenue:read")]
    RevenueRead,
    #[serde(rename = "revenue:create")]
    RevenueCreate,
    #[serde(rename = "revenue:import")]
    RevenueImport,
    #[serde(rename = "targets:read")]
    TargetsRead,
    #[serde(rename = "targets:manage")]
    TargetsManage,
    #[serde(rename = "calendar:read")]
    CalendarRead,
    #[serde(rename = "calendar:manage")]
    CalendarManage,
    #[serde(rename = "analytics:read")]
    AnalyticsRead,
    #[serde(rename = "analytics:team")]
    AnalyticsTeam,
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:manage")]
    UsersManage,
}

use Permission::*;

pub const ALL_PERMISSIONS: &[Permission] = &[
    LeadsRead,
    LeadsCreate,
    LeadsUpdate,
    LeadsDelete,
    LeadsAssign,
    LeadsImport,
    CustomersRead,
    CustomersCreate,
    CustomersUpdate,
    CustomersDelete,
    RevenueRead,
    RevenueCreate,
    RevenueImport,
    TargetsRead,
    TargetsManage,
    CalendarRead,
    CalendarManage,
    AnalyticsRead,
    AnalyticsTeam,
    UsersRead,
    UsersManage,
];

const MANAGER_PERMISSIONS: &[Permission] = &[
    LeadsRead,
    LeadsCreate,
    LeadsUpdate,
    LeadsDelete,
    LeadsAssign,
    LeadsImport,
    CustomersRead,
    CustomersCreate,
    CustomersUpdate,
    CustomersDelete,
    RevenueRead,
    RevenueCreate,
    RevenueImport,
    TargetsRead,
    TargetsManage,
    CalendarRead,
    CalendarManage,
    AnalyticsRead,
    AnalyticsTeam,
    UsersRead,
];

const AGENT_PERMISSIONS: &[Permission] = &[
    LeadsRead,
    LeadsCreate,
    LeadsUpdate,
    CustomersRead,
    CustomersCreate,
    CustomersUpdate,
    RevenueRead,
    RevenueCreate,
    TargetsRead,
    CalendarRead,
    CalendarManage,
    AnalyticsRead,
];

impl Permission {
    pub fn slug(self) -> &'static str {
        match self {
            LeadsRead => "leads:read",
            LeadsCreate => "leads:create",
            LeadsUpdate => "leads:update",
            LeadsDelete => "leads:delete",
            LeadsAssign => "leads:assign",
            LeadsImport => "leads:import",
            CustomersRead => "customers:read",
            CustomersCreate => "customers:create",
            CustomersUpdate => "customers:update",
            CustomersDelete => "customers:delete",
            RevenueRead => "revenue:read",
            RevenueCreate => "revenue:create",
            RevenueImport => "revenue:import",
            TargetsRead => "targets:read",
            TargetsManage => "targets:manage",
            CalendarRead => "calendar:read",
            CalendarManage => "calendar:manage",
            AnalyticsRead => "analytics:read",
            AnalyticsTeam => "analytics:team",
            UsersRead => "users:read",
            UsersManage => "users:manage",
        }
    }
}

pub fn role_permissions(role: UserRole) -> &'static [Permission] {
    match role {
        UserRole::Admin => ALL_PERMISSIONS,
        UserRole::Manager => MANAGER_PERMISSIONS,
        UserRole::Agent => AGENT_PERMISSIONS,
    }
}

/// Sem usuário, sempre `false`.
pub fn has_permission(user: Option<&User>, permission: Permission) -> bool {
    user.is_some_and(|u| role_permissions(u.role).contains(&permission))
}

// Resposta do GET /api/users/me/permissions
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyPermissionsResponse {
    pub role: UserRole,
    pub permissions: Vec<Permission>,
}

// Uma linha da matriz completa (GET /api/permissions)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissions {
    pub role: UserRole,
    pub permissions: Vec<Permission>,
}

pub fn permission_matrix() -> Vec<RolePermissions> {
    [UserRole::Admin, UserRole::Manager, UserRole::Agent]
        .into_iter()
        .map(|role| RolePermissions {
            role,
            permissions: role_permissions(role).to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "x@y.com".into(),
            password_hash: String::new(),
            full_name: "X".into(),
            role,
            team: None,
            is_active: true,
            email_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn absent_user_never_has_permission() {
        for p in ALL_PERMISSIONS {
            assert!(!has_permission(None, *p));
        }
    }

    #[test]
    fn admin_has_everything() {
        let admin = user(UserRole::Admin);
        assert!(ALL_PERMISSIONS.iter().all(|p| has_permission(Some(&admin), *p)));
    }

    #[test]
    fn manager_cannot_manage_users() {
        let manager = user(UserRole::Manager);
        assert!(has_permission(Some(&manager), TargetsManage));
        assert!(has_permission(Some(&manager), UsersRead));
        assert!(!has_permission(Some(&manager), UsersManage));
    }

    #[test]
    fn agent_is_limited() {
        let agent = user(UserRole::Agent);
        assert!(has_permission(Some(&agent), LeadsCreate));
        assert!(has_permission(Some(&agent), CalendarManage));
        assert!(!has_permission(Some(&agent), LeadsDelete));
        assert!(!has_permission(Some(&agent), LeadsImport));
        assert!(!has_permission(Some(&agent), TargetsManage));
        assert!(!has_permission(Some(&agent), AnalyticsTeam));
    }

    #[test]
    fn slug_matches_serde_name() {
        for p in ALL_PERMISSIONS {
            let json = serde_json::to_string(p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.slug()));
        }
    }

    #[test]
    fn role_sets_are_nested() {
        for p in AGENT_PERMISSIONS {
            assert!(MANAGER_PERMISSIONS.contains(p), "{} falta no gerente", p.slug());
        }
        assert_eq!(permission_matrix().len(), 3);
    }
}
