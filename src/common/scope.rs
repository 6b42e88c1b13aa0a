// src/common/scope.rs
//
// Escopo de visibilidade dos registros:
//   admin   -> tudo
//   manager -> registros dele e dos usuários do mesmo time
//   agent   -> registros que criou ou que estão atribuídos a ele

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::auth::{User, UserRole};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Team { user_id: Uuid, team: String },
    Own(Uuid),
}

impl Scope {
    pub fn of(user: &User) -> Self {
        match user.role {
            UserRole::Admin => Scope::All,
            UserRole::Manager => match user.team.as_deref().map(str::trim) {
                Some(team) if !team.is_empty() => Scope::Team {
                    user_id: user.id,
                    team: team.to_string(),
                },
                // Gerente sem time só enxerga o que é dele
                _ => Scope::Own(user.id),
            },
            UserRole::Agent => Scope::Own(user.id),
        }
    }

    /// Acrescenta `AND (...)` restringindo as colunas "dono" do registro.
    /// Basta uma das colunas pertencer ao escopo.
    pub fn push_condition(&self, qb: &mut QueryBuilder<'_, Postgres>, owner_columns: &[&str]) {
        if owner_columns.is_empty() {
            return;
        }
        match self {
            Scope::All => {}
            Scope::Own(user_id) => {
                qb.push(" AND (");
                for (i, column) in owner_columns.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(*column).push(" = ").push_bind(*user_id);
                }
                qb.push(")");
            }
            Scope::Team { user_id, team } => {
                qb.push(" AND (");
                for (i, column) in owner_columns.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(*column)
                        .push(" = ")
                        .push_bind(*user_id)
                        .push(" OR ")
                        .push(*column)
                        .push(" IN (SELECT id FROM users WHERE trim(team) = ")
                        .push_bind(team.clone())
                        .push(")");
                }
                qb.push(")");
            }
        }
    }

    /// O usuário informado está dentro do escopo? (ex.: destino de uma meta)
    pub fn includes(&self, other: &User) -> bool {
        match self {
            Scope::All => true,
            Scope::Own(user_id) => other.id == *user_id,
            Scope::Team { user_id, team } => {
                other.id == *user_id || other.team.as_deref().map(str::trim) == Some(team.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: UserRole, team: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            password_hash: String::new(),
            full_name: "A".into(),
            role,
            team: team.map(String::from),
            is_active: true,
            email_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn scope_follows_role() {
        assert_eq!(Scope::of(&user(UserRole::Admin, Some("Sul"))), Scope::All);
        let agent = user(UserRole::Agent, Some("Sul"));
        assert_eq!(Scope::of(&agent), Scope::Own(agent.id));
        let manager = user(UserRole::Manager, Some(" Sul "));
        assert_eq!(
            Scope::of(&manager),
            Scope::Team { user_id: manager.id, team: "Sul".into() }
        );
    }

    #[test]
    fn manager_without_team_sees_only_own_records() {
        let manager = user(UserRole::Manager, Some("  "));
        assert_eq!(Scope::of(&manager), Scope::Own(manager.id));
    }

    #[test]
    fn admin_adds_no_condition() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM leads WHERE TRUE");
        Scope::All.push_condition(&mut qb, &["assigned_to", "created_by"]);
        assert_eq!(qb.sql(), "SELECT * FROM leads WHERE TRUE");
    }

    #[test]
    fn own_scope_matches_any_owner_column() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM leads WHERE TRUE");
        Scope::Own(Uuid::new_v4()).push_condition(&mut qb, &["assigned_to", "created_by"]);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM leads WHERE TRUE AND (assigned_to = $1 OR created_by = $2)"
        );
    }

    #[test]
    fn team_scope_uses_team_subquery() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM targets WHERE TRUE");
        Scope::Team { user_id: Uuid::new_v4(), team: "Sul".into() }
            .push_condition(&mut qb, &["user_id"]);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM targets WHERE TRUE AND (user_id = $1 OR user_id IN (SELECT id FROM users WHERE trim(team) = $2))"
        );
    }

    #[test]
    fn includes_checks_team_membership() {
        let manager = user(UserRole::Manager, Some("Sul"));
        let scope = Scope::of(&manager);
        assert!(scope.includes(&user(UserRole::Agent, Some("Sul"))));
        assert!(!scope.includes(&user(UserRole::Agent, Some("Norte"))));
        assert!(scope.includes(&user(UserRole::Agent, Some(" Sul "))));
        assert!(scope.includes(&manager));
    }
}
