// src/handlers/rbac.rs

use axum::Json;

use crate::{
    middleware::auth::AuthenticatedUser,
    models::rbac::{permission_matrix, role_permissions, MyPermissionsResponse, RolePermissions},
};

// GET /api/users/me/permissions (o frontend usa para mostrar/esconder ações)
#[utoipa::path(
    get,
    path = "/api/users/me/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Papel e permissões do usuário autenticado", body = MyPermissionsResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn my_permissions(AuthenticatedUser(user): AuthenticatedUser) -> Json<MyPermissionsResponse> {
    Json(MyPermissionsResponse {
        role: user.role,
        permissions: role_permissions(user.role).to_vec(),
    })
}

// GET /api/permissions
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Matriz completa papel -> permissões", body = Vec<RolePermissions>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(_user: AuthenticatedUser) -> Json<Vec<RolePermissions>> {
    Json(permission_matrix())
}
