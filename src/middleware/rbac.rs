// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::{has_permission, Permission},
};

/// 1. O Trait que liga um tipo marcador a uma permissão da tabela estática
pub trait PermissionDef: Send + Sync + 'static {
    fn permission() -> Permission;
}

/// 2. O Extractor (Guardião). Deve vir depois do `auth_guard`.
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        let user = parts.extensions.get::<AuthenticatedUser>().map(|u| &u.0);
        let required = T::permission();

        if user.is_none() {
            return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
        }

        if !has_permission(user, required) {
            if let Some(user) = user {
                tracing::debug!("Usuário {} sem a permissão '{}'", user.id, required.slug());
            }
            return Err(AppError::MissingPermission(required)
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission_markers {
    ($($marker:ident => $permission:ident),* $(,)?) => {
        $(
            pub struct $marker;
            impl PermissionDef for $marker {
                fn permission() -> Permission { Permission::$permission }
            }
        )*
    };
}

permission_markers! {
    PermLeadsRead => LeadsRead,
    PermLeadsCreate => LeadsCreate,
    PermLeadsUpdate => LeadsUpdate,
    PermLeadsDelete => LeadsDelete,
    PermLeadsAssign => LeadsAssign,
    PermLeadsImport => LeadsImport,
    PermCustomersRead => CustomersRead,
    PermCustomersCreate => CustomersCreate,
    PermCustomersUpdate => CustomersUpdate,
    PermCustomersDelete => CustomersDelete,
    PermRevenueRead => RevenueRead,
    PermRevenueCreate => RevenueCreate,
    PermRevenueImport => RevenueImport,
    PermTargetsRead => TargetsRead,
    PermTargetsManage => TargetsManage,
    PermCalendarRead => CalendarRead,
    PermCalendarManage => CalendarManage,
    PermAnalyticsRead => AnalyticsRead,
    PermAnalyticsTeam => AnalyticsTeam,
    PermUsersRead => UsersRead,
    PermUsersManage => UsersManage,
}
