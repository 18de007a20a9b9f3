use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, User};

/// Queries against the `users` table
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Like `find_by_id`, but a missing row is an error
    pub async fn get_404(&self, id: i64) -> Result<User, DatabaseError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_sub(&self, sub: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE sub = ?")
            .bind(sub)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let name = format!("{} {}", new_user.first_name, new_user.last_name)
            .trim()
            .to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (email, hashed_password, name, first_name, last_name, phone, role,
                 is_active, is_verified, is_caregiver, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .bind(name)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone)
        .bind(&new_user.role)
        .bind(new_user.role == "caregiver")
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::UniqueViolation(db.message().to_string())
            }
            other => DatabaseError::Sqlx(other),
        })?;

        Ok(user)
    }

    /// Find-or-create the account for an identity-provider subject.
    ///
    /// An existing row keeps its email; a missing name is filled in. When the
    /// claimed email already belongs to a different account it is dropped
    /// rather than violating the unique constraint.
    pub async fn upsert_by_sub(
        &self,
        sub: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let email = match email {
            Some(email) => match self.find_by_email(email).await? {
                Some(owner) if owner.sub.as_deref() != Some(sub) => {
                    tracing::warn!("Email for subject {} already belongs to user {}", sub, owner.id);
                    None
                }
                _ => Some(email),
            },
            None => None,
        };

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (sub, email, name, role, is_active, is_verified, is_caregiver, created_at)
            VALUES (?, ?, ?, 'elder', 1, 1, 0, ?)
            ON CONFLICT(sub) DO UPDATE SET
                name  = COALESCE(users.name, excluded.name),
                email = COALESCE(users.email, excluded.email)
            RETURNING *
            "#,
        )
        .bind(sub)
        .bind(email)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
