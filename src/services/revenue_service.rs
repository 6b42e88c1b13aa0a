// src/services/revenue_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    db::{CustomerRepository, RevenueRepository, UserRepository},
    models::{
        auth::User,
        revenue::{CreateRevenuePayload, DailyRevenue, RevenueFilter},
    },
};

#[derive(Clone)]
pub struct RevenueService {
    repo: RevenueRepository,
    customer_repo: CustomerRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl RevenueService {
    pub fn new(
        repo: RevenueRepository,
        customer_repo: CustomerRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            customer_repo,
            user_repo,
            pool,
        }
    }

    pub async fn list_entries(&self, user: &User, filter: &RevenueFilter) -> Result<Vec<DailyRevenue>, AppError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if to < from {
                return Err(AppError::InvalidDateRange);
            }
        }
        self.repo.list_entries(&Scope::of(user), filter).await
    }

    /// Sem `user_id` o lançamento é de quem está logado. Lançar para outra
    /// pessoa só vale para gerente/admin e dentro do escopo.
    pub async fn create_entry(&self, user: &User, payload: &CreateRevenuePayload) -> Result<DailyRevenue, AppError> {
        let owner_id = match payload.user_id {
            None => user.id,
            Some(id) if id == user.id => user.id,
            Some(id) => {
                if !user.role.is_manager_or_above() {
                    return Err(AppError::OutOfScope);
                }
                let owner = self
                    .user_repo
                    .find_active_by_id(&self.pool, id)
                    .await?
                    .ok_or(AppError::InvalidAssignee)?;
                if !Scope::of(user).includes(&owner) {
                    return Err(AppError::OutOfScope);
                }
                owner.id
            }
        };

        if let Some(customer_id) = payload.customer_id {
            self.customer_repo
                .find_visible(customer_id, &Scope::of(user))
                .await?
                .ok_or(AppError::CustomerNotFound)?;
        }

        self.repo.create_entry(owner_id, payload).await
    }

    pub async fn delete_entry(&self, user: &User, id: Uuid) -> Result<(), AppError> {
        self.repo
            .find_visible(id, &Scope::of(user))
            .await?
            .ok_or(AppError::RevenueNotFound)?;
        self.repo.delete_entry(id).await?;
        Ok(())
    }
}
