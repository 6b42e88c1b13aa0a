// src/services/customer_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    db::{CustomerRepository, LeadRepository, UserRepository},
    models::{
        auth::User,
        customer::{CreateCustomerPayload, Customer, CustomerFilter, UpdateCustomerPayload},
        lead::LeadStage,
    },
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    lead_repo: LeadRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl CustomerService {
    pub fn new(
        repo: CustomerRepository,
        lead_repo: LeadRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            lead_repo,
            user_repo,
            pool,
        }
    }

    pub async fn list_customers(&self, user: &User, filter: &CustomerFilter) -> Result<Vec<Customer>, AppError> {
        self.repo
            .list_customers(&Scope::of(user), filter.search.as_deref())
            .await
    }

    pub async fn get_customer(&self, user: &User, id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .find_visible(id, &Scope::of(user))
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    /// Com `lead_id`: o lead precisa existir (no escopo), estar ganho e ainda
    /// não ter cliente. A verificação e o insert rodam na mesma transação.
    pub async fn create_customer(&self, user: &User, payload: &CreateCustomerPayload) -> Result<Customer, AppError> {
        self.ensure_active_user(payload.assigned_to).await?;

        let Some(lead_id) = payload.lead_id else {
            return self.repo.create_customer(&self.pool, user.id, payload).await;
        };

        self.lead_repo
            .find_visible(lead_id, &Scope::of(user))
            .await?
            .ok_or(AppError::LeadNotFound)?;

        let mut tx = self.pool.begin().await?;
        let lead = self
            .lead_repo
            .lock_by_id(&mut *tx, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        if lead.stage != LeadStage::ClosedWon {
            return Err(AppError::LeadNotWon);
        }
        if self.lead_repo.has_customer(&mut *tx, lead_id).await? {
            return Err(AppError::LeadAlreadyConverted);
        }

        let customer = self
            .repo
            .create_customer(&mut *tx, user.id, payload)
            .await
            .map_err(|e| match e {
                AppError::UniqueConstraintViolation(_) => AppError::LeadAlreadyConverted,
                other => other,
            })?;
        tx.commit().await?;

        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        user: &User,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Customer, AppError> {
        self.get_customer(user, id).await?;
        self.ensure_active_user(payload.assigned_to).await?;
        self.repo.update_customer(id, payload).await
    }

    pub async fn delete_customer(&self, user: &User, id: Uuid) -> Result<(), AppError> {
        self.get_customer(user, id).await?;
        if self.repo.has_revenue(id).await? {
            return Err(AppError::CustomerHasRevenue);
        }
        self.repo.delete_customer(id).await?;
        Ok(())
    }

    async fn ensure_active_user(&self, user_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(user_id) = user_id {
            self.user_repo
                .find_active_by_id(&self.pool, user_id)
                .await?
                .ok_or(AppError::InvalidAssignee)?;
        }
        Ok(())
    }
}
