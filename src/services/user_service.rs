// src/services/user_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    db::UserRepository,
    models::{
        auth::{UpdateUserPayload, User, UserRole},
        notification::NotificationKind,
    },
    services::notification_service::NotificationService,
};

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    notifications: NotificationService,
}

/// Ninguém rebaixa nem desativa a própria conta (evita ficar sem admin)
pub fn check_self_modification(actor: &User, target_id: Uuid, payload: &UpdateUserPayload) -> Result<(), AppError> {
    if actor.id != target_id {
        return Ok(());
    }
    let demotes = payload.role.is_some_and(|role| role != actor.role);
    let disables = payload.is_active == Some(false);
    if demotes || disables {
        return Err(AppError::SelfModification);
    }
    Ok(())
}

impl UserService {
    pub fn new(repo: UserRepository, notifications: NotificationService) -> Self {
        Self { repo, notifications }
    }

    pub async fn list_users(&self, user: &User) -> Result<Vec<User>, AppError> {
        self.repo.list_users(&Scope::of(user)).await
    }

    pub async fn update_user(&self, actor: &User, id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        check_self_modification(actor, id, payload)?;

        let updated = self
            .repo
            .update_user(id, payload.role, payload.team.as_deref(), payload.is_active)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if payload.role == Some(UserRole::Admin) {
            tracing::info!("Usuário {} promovido a admin por {}", updated.id, actor.id);
        }
        if updated.id != actor.id {
            self.notifications
                .notify(
                    updated.id,
                    NotificationKind::System,
                    "system",
                    &[("actor", actor.full_name.as_str())],
                )
                .await;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn admin() -> User {
        User {
            id: Uuid::new_v4(),
            email: "admin@crm.com".into(),
            password_hash: String::new(),
            full_name: "Admin".into(),
            role: UserRole::Admin,
            team: None,
            is_active: true,
            email_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_cannot_demote_or_disable_self() {
        let me = admin();
        let demote = UpdateUserPayload { role: Some(UserRole::Agent), team: None, is_active: None };
        assert!(matches!(
            check_self_modification(&me, me.id, &demote),
            Err(AppError::SelfModification)
        ));
        let disable = UpdateUserPayload { role: None, team: None, is_active: Some(false) };
        assert!(check_self_modification(&me, me.id, &disable).is_err());
    }

    #[test]
    fn changing_own_team_is_allowed() {
        let me = admin();
        let team = UpdateUserPayload { role: Some(UserRole::Admin), team: Some("Sul".into()), is_active: Some(true) };
        assert!(check_self_modification(&me, me.id, &team).is_ok());
    }

    #[test]
    fn other_users_can_be_changed() {
        let me = admin();
        let demote = UpdateUserPayload { role: Some(UserRole::Agent), team: None, is_active: Some(false) };
        assert!(check_self_modification(&me, Uuid::new_v4(), &demote).is_ok());
    }
}
