// src/services/lead_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    db::{CustomerRepository, LeadRepository, UserRepository},
    models::{
        auth::User,
        customer::{CreateCustomerPayload, Customer},
        lead::{CreateLeadPayload, Lead, LeadFilter, LeadStage, UpdateLeadPayload},
        notification::NotificationKind,
        rbac::{has_permission, Permission},
    },
    services::notification_service::NotificationService,
};

/// Regras de transição do funil:
/// - entre etapas abertas e para fechadas, qualquer movimento vale;
/// - `closed_lost` pode ser reaberto;
/// - `closed_won` com cliente vinculado não sai mais de `closed_won`.
pub fn check_transition(from: LeadStage, to: LeadStage, has_customer: bool) -> Result<(), AppError> {
    if from == LeadStage::ClosedWon && to != LeadStage::ClosedWon && has_customer {
        return Err(AppError::InvalidStageTransition { from, to });
    }
    Ok(())
}

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
    customer_repo: CustomerRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    pool: PgPool,
}

impl LeadService {
    pub fn new(
        repo: LeadRepository,
        customer_repo: CustomerRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            customer_repo,
            user_repo,
            notifications,
            pool,
        }
    }

    pub async fn list_leads(&self, user: &User, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        self.repo.list_leads(&Scope::of(user), filter).await
    }

    pub async fn get_lead(&self, user: &User, id: Uuid) -> Result<Lead, AppError> {
        self.repo
            .find_visible(id, &Scope::of(user))
            .await?
            .ok_or(AppError::LeadNotFound)
    }

    pub async fn create_lead(&self, user: &User, payload: &CreateLeadPayload) -> Result<Lead, AppError> {
        self.ensure_assignable(user, payload.assigned_to).await?;

        let lead = self.repo.create_lead(&self.pool, user.id, payload).await?;

        if let Some(assignee) = lead.assigned_to.filter(|a| *a != user.id) {
            self.notifications
                .notify(assignee, NotificationKind::LeadAssigned, "lead_assigned", &[("lead", lead.name.as_str())])
                .await;
        }
        Ok(lead)
    }

    pub async fn update_lead(&self, user: &User, id: Uuid, payload: &UpdateLeadPayload) -> Result<Lead, AppError> {
        self.get_lead(user, id).await?;
        let lead = self.repo.update_lead(&self.pool, id, payload).await?;
        self.notify_update(user, &lead).await;
        Ok(lead)
    }

    pub async fn change_stage(&self, user: &User, id: Uuid, stage: LeadStage) -> Result<Lead, AppError> {
        self.get_lead(user, id).await?;

        let mut tx = self.pool.begin().await?;
        let current = self
            .repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        let has_customer = self.repo.has_customer(&mut *tx, id).await?;
        check_transition(current.stage, stage, has_customer)?;

        let lead = self.repo.update_stage(&mut *tx, id, stage).await?;
        tx.commit().await?;

        if current.stage != stage {
            tracing::info!("Lead {} mudou de {} para {}", id, current.stage, stage);
            self.notify_update(user, &lead).await;
        }
        Ok(lead)
    }

    pub async fn assign_lead(&self, user: &User, id: Uuid, assigned_to: Option<Uuid>) -> Result<Lead, AppError> {
        let current = self.get_lead(user, id).await?;
        self.ensure_assignable(user, assigned_to).await?;

        let lead = self.repo.update_assignee(&self.pool, id, assigned_to).await?;

        if let Some(assignee) = assigned_to.filter(|a| Some(*a) != current.assigned_to && *a != user.id) {
            self.notifications
                .notify(assignee, NotificationKind::LeadAssigned, "lead_assigned", &[("lead", lead.name.as_str())])
                .await;
        }
        Ok(lead)
    }

    pub async fn delete_lead(&self, user: &User, id: Uuid) -> Result<(), AppError> {
        self.get_lead(user, id).await?;
        self.repo.delete_lead(id).await?;
        Ok(())
    }

    /// Converte o lead em cliente numa única transação:
    /// cria o cliente, vincula ao lead e move o lead para `closed_won`.
    pub async fn convert_lead(&self, user: &User, id: Uuid) -> Result<Customer, AppError> {
        self.get_lead(user, id).await?;

        let mut tx = self.pool.begin().await?;
        let lead = self
            .repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        if self.repo.has_customer(&mut *tx, id).await? {
            return Err(AppError::LeadAlreadyConverted);
        }

        let payload = CreateCustomerPayload {
            name: lead.name.clone(),
            company: lead.company.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            lead_id: Some(lead.id),
            assigned_to: lead.assigned_to,
        };
        let customer = self
            .customer_repo
            .create_customer(&mut *tx, user.id, &payload)
            .await
            .map_err(|e| match e {
                AppError::UniqueConstraintViolation(_) => AppError::LeadAlreadyConverted,
                other => other,
            })?;

        if lead.stage != LeadStage::ClosedWon {
            self.repo.update_stage(&mut *tx, id, LeadStage::ClosedWon).await?;
        }

        tx.commit().await?;
        tracing::info!("🤝 Lead {} convertido no cliente {}", lead.id, customer.id);
        Ok(customer)
    }

    // O responsável precisa existir e estar ativo. Atribuir a outra pessoa
    // exige `leads:assign` e que ela esteja no escopo de quem atribui.
    async fn ensure_assignable(&self, user: &User, assigned_to: Option<Uuid>) -> Result<(), AppError> {
        let Some(assignee_id) = assigned_to else {
            return Ok(());
        };

        if assignee_id != user.id && !has_permission(Some(user), Permission::LeadsAssign) {
            return Err(AppError::MissingPermission(Permission::LeadsAssign));
        }

        let assignee = self
            .user_repo
            .find_active_by_id(&self.pool, assignee_id)
            .await?
            .ok_or(AppError::InvalidAssignee)?;

        if !Scope::of(user).includes(&assignee) {
            return Err(AppError::OutOfScope);
        }
        Ok(())
    }

    async fn notify_update(&self, actor: &User, lead: &Lead) {
        if let Some(assignee) = lead.assigned_to.filter(|a| *a != actor.id) {
            self.notifications
                .notify(
                    assignee,
                    NotificationKind::LeadUpdated,
                    "lead_updated",
                    &[("lead", lead.name.as_str()), ("actor", actor.full_name.as_str())],
                )
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_stages_move_freely() {
        for from in LeadStage::ALL.into_iter().filter(|s| !s.is_closed()) {
            for to in LeadStage::ALL {
                assert!(check_transition(from, to, false).is_ok());
            }
        }
    }

    #[test]
    fn closed_lost_can_be_reopened() {
        assert!(check_transition(LeadStage::ClosedLost, LeadStage::Negotiation, false).is_ok());
    }

    #[test]
    fn converted_lead_stays_won() {
        let err = check_transition(LeadStage::ClosedWon, LeadStage::Proposal, true).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidStageTransition {
                from: LeadStage::ClosedWon,
                to: LeadStage::Proposal
            }
        ));
        assert!(check_transition(LeadStage::ClosedWon, LeadStage::ClosedWon, true).is_ok());
    }

    #[test]
    fn won_lead_without_customer_can_move_back() {
        assert!(check_transition(LeadStage::ClosedWon, LeadStage::Negotiation, false).is_ok());
    }
}
