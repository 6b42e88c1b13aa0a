// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User, UserRole},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl_hours: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl_hours: i64, pool: PgPool) -> Self {
        Self {
            user_repo,
            jwt_secret,
            token_ttl_hours,
            pool,
        }
    }

    /// O primeiro usuário cadastrado vira admin; os demais entram como agent.
    pub async fn register_user(&self, email: &str, password: &str, full_name: &str) -> Result<String, AppError> {
        // 1. Hashing fora da transação, numa thread bloqueante
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let role = if self.user_repo.count_users(&mut *tx).await? == 0 {
            UserRole::Admin
        } else {
            UserRole::Agent
        };

        let new_user = self
            .user_repo
            .create_user(&mut *tx, email.trim(), &hashed_password, full_name.trim(), role)
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("👤 Novo usuário {} registrado como {:?}", new_user.id, role);
        self.create_token(&new_user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Só depois de conferir a senha, para não revelar quais contas existem
        if !user.is_active {
            return Err(AppError::UserInactive);
        }

        self.create_token(&user)
    }

    /// Valida o token e recarrega o usuário: papel e `is_active` vêm sempre do banco.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::UserInactive);
        }
        Ok(user)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.token_ttl_hours);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    const SECRET: &str = "um-segredo-de-teste-com-mais-de-32-caracteres";

    // Pool preguiçoso: nenhum teste aqui toca no banco
    fn service(ttl_hours: i64) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/crm_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), SECRET.into(), ttl_hours, pool)
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            password_hash: String::new(),
            full_name: "A".into(),
            role: UserRole::Manager,
            team: None,
            is_active: true,
            email_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_round_trip_keeps_subject_and_role() {
        let service = service(1);
        let user = user();
        let token = service.create_token(&user).unwrap();
        let claims = service.decode_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        // TTL negativo, bem além da tolerância padrão de 60s
        let service = service(-2);
        let token = service.create_token(&user()).unwrap();
        assert!(matches!(service.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let other = {
            let mut s = service(1);
            s.jwt_secret = "outro-segredo-de-teste-com-mais-de-32-chars".into();
            s
        };
        let token = other.create_token(&user()).unwrap();
        assert!(matches!(service(1).decode_token(&token), Err(AppError::InvalidToken)));
    }
}
