use sqlx::PgPool;

use super::{require_text, ServiceError};
use crate::auth::{hash_password, verify_password};
use crate::database::manager::DatabaseManager;
use crate::database::models::{User, UserInput, UserProfile};
use crate::database::Repository;
use crate::types::Role;

pub struct UserService {
    repo: Repository<User>,
}

impl UserService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(DatabaseManager::main_pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("users", pool),
        }
    }

    fn pool(&self) -> &PgPool {
        self.repo.pool()
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, ServiceError> {
        let users = self.repo.select_all().await?;
        let mut profiles = Vec::with_capacity(users.len());
        for user in users {
            let roles = self.role_names(user.id).await?;
            profiles.push(UserProfile::new(user, roles));
        }
        Ok(profiles)
    }

    pub async fn get(&self, id: i64) -> Result<UserProfile, ServiceError> {
        let user = self
            .repo
            .select_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        let roles = self.role_names(id).await?;
        Ok(UserProfile::new(user, roles))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.repo.select_where("username", username).await?.into_iter().next())
    }

    /// Stored role names held by a user
    pub async fn role_names(&self, user_id: i64) -> Result<Vec<String>, ServiceError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT r.name FROM roles r JOIN user_roles ur ON ur.role_id = r.id WHERE ur.user_id = $1 ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Check credentials. Unknown, disabled, or mismatched users all yield `None`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserProfile>, ServiceError> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };
        if !user.enabled || !verify_password(password, &user.password_hash).await {
            return Ok(None);
        }
        let roles = self.role_names(user.id).await?;
        Ok(Some(UserProfile::new(user, roles)))
    }

    pub async fn create(&self, input: UserInput) -> Result<UserProfile, ServiceError> {
        require_text("username", &input.username)?;
        require_text("email", &input.email)?;
        let password = input.password.as_deref().unwrap_or_default();
        require_text("password", password)?;
        let password_hash = hash_password(password).await.map_err(|e| ServiceError::Validation {
            field: "password",
            message: e.to_string(),
        })?;

        let mut tx = self.pool().begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.enabled.unwrap_or(true))
        .fetch_one(&mut *tx)
        .await?;

        for role in &input.roles {
            grant_in(&mut tx, user.id, *role).await?;
        }
        tx.commit().await?;

        tracing::info!("Created user {} ({})", user.id, user.username);
        let roles = self.role_names(user.id).await?;
        Ok(UserProfile::new(user, roles))
    }

    /// Update profile fields. An absent password keeps the stored hash; a
    /// non-empty role list replaces the user's roles.
    pub async fn update(&self, id: i64, input: UserInput) -> Result<UserProfile, ServiceError> {
        require_text("username", &input.username)?;
        require_text("email", &input.email)?;
        let password_hash = match input.password.as_deref() {
            Some(password) => {
                require_text("password", password)?;
                Some(hash_password(password).await.map_err(|e| ServiceError::Validation {
                    field: "password",
                    message: e.to_string(),
                })?)
            }
            None => None,
        };

        let mut tx = self.pool().begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = COALESCE($4, password_hash),
                first_name = $5, last_name = $6, enabled = COALESCE($7, enabled), updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.enabled)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", id))?;

        if !input.roles.is_empty() {
            sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for role in &input.roles {
                grant_in(&mut tx, id, *role).await?;
            }
        }
        tx.commit().await?;

        let roles = self.role_names(id).await?;
        Ok(UserProfile::new(user, roles))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.repo.delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Idempotent: granting a held role is a no-op
    pub async fn grant_role(&self, user_id: i64, role: Role) -> Result<UserProfile, ServiceError> {
        let mut tx = self.pool().begin().await?;
        if !user_exists(&mut tx, user_id).await? {
            return Err(ServiceError::not_found("User", user_id));
        }
        grant_in(&mut tx, user_id, role).await?;
        tx.commit().await?;
        tracing::info!("Granted {} to user {}", role, user_id);
        self.get(user_id).await
    }

    pub async fn revoke_role(&self, user_id: i64, role: Role) -> Result<UserProfile, ServiceError> {
        let profile = self.get(user_id).await?;
        sqlx::query(
            "DELETE FROM user_roles WHERE user_id = $1 AND role_id = (SELECT id FROM roles WHERE name = $2)",
        )
        .bind(user_id)
        .bind(role.stored_name())
        .execute(self.pool())
        .await?;
        tracing::info!("Revoked {} from user {}", role, profile.username);
        self.get(user_id).await
    }
}

async fn user_exists(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, user_id: i64) -> Result<bool, ServiceError> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(exists)
}

/// Role rows are seeded by migration; a missing one is created on demand
async fn grant_in(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, user_id: i64, role: Role) -> Result<(), ServiceError> {
    sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(role.stored_name())
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        SELECT $1, id FROM roles WHERE name = $2
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(role.stored_name())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
