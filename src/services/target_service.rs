// src/services/target_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    db::{TargetRepository, UserRepository},
    models::{
        auth::User,
        notification::NotificationKind,
        target::{CreateTargetPayload, Target, TargetFilter, TargetProgress},
    },
    services::notification_service::NotificationService,
};

#[derive(Clone)]
pub struct TargetService {
    repo: TargetRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    pool: PgPool,
}

impl TargetService {
    pub fn new(
        repo: TargetRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            user_repo,
            notifications,
            pool,
        }
    }

    pub async fn list_targets(&self, user: &User, filter: &TargetFilter) -> Result<Vec<Target>, AppError> {
        self.repo.list_targets(&Scope::of(user), filter.user_id).await
    }

    /// O usuário da meta precisa estar ativo e dentro do escopo de quem cria.
    /// O dono da meta é avisado por notificação.
    pub async fn create_target(&self, user: &User, payload: &CreateTargetPayload) -> Result<Target, AppError> {
        let owner = self
            .user_repo
            .find_active_by_id(&self.pool, payload.user_id)
            .await?
            .ok_or(AppError::InvalidAssignee)?;

        if !Scope::of(user).includes(&owner) {
            return Err(AppError::OutOfScope);
        }

        let target = self.repo.create_target(user.id, payload).await?;

        let start = target.period_start.to_string();
        let end = target.period_end.to_string();
        self.notifications
            .notify(
                owner.id,
                NotificationKind::TargetAssigned,
                "target_assigned",
                &[("start", start.as_str()), ("end", end.as_str())],
            )
            .await;

        Ok(target)
    }

    pub async fn delete_target(&self, user: &User, id: Uuid) -> Result<(), AppError> {
        self.get_target(user, id).await?;
        self.repo.delete_target(id).await?;
        Ok(())
    }

    pub async fn progress(&self, user: &User, id: Uuid) -> Result<TargetProgress, AppError> {
        let target = self.get_target(user, id).await?;
        let actuals = self
            .repo
            .actuals(target.user_id, target.period_start, target.period_end)
            .await?;
        Ok(TargetProgress::compute(target, actuals))
    }

    async fn get_target(&self, user: &User, id: Uuid) -> Result<Target, AppError> {
        self.repo
            .find_visible(id, &Scope::of(user))
            .await?
            .ok_or(AppError::TargetNotFound)
    }
}
