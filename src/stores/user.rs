//! User accounts

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use super::vault::TOKEN_PREFIX;
use crate::adapters::{Database, Row};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct UserStoreOptions {
    pub user_table_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// user, manager, administrator or superuser
    pub role: String,
    pub status: String,
    pub created_at: i64,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            role: "user".to_string(),
            status: "unverified".to_string(),
            created_at: now_millis(),
        }
    }

    fn from_row(row: &Row) -> Self {
        Self {
            id: row.string("id"),
            email: row.string("email"),
            first_name: row.string("first_name"),
            last_name: row.string("last_name"),
            role: row.string("role"),
            status: row.string("status"),
            created_at: row.get_i64("created_at").unwrap_or_default(),
        }
    }
}

pub struct UserStore {
    db: Database,
    user_table: String,
}

impl UserStore {
    pub fn new(db: Database, options: UserStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            user_table: validate_table_name(&options.user_table_name)?,
        })
    }

    /// Insert a user; emails are stored lowercased and must be unique
    ///
    /// A vault token is accepted in place of the address.
    pub async fn create_user(&self, user: &User) -> Result<User, StoreError> {
        let email = if user.email.starts_with(TOKEN_PREFIX) {
            user.email.clone()
        } else {
            user.email.trim().to_lowercase()
        };
        require_non_empty("email", &email)?;
        if !email.contains('@') && !email.starts_with(TOKEN_PREFIX) {
            return Err(StoreError::InvalidInput(format!("'{email}' is not an email address")));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(StoreError::InvalidInput(format!("email '{email}' is already registered")));
        }

        let stored = User {
            email,
            ..user.clone()
        };
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, email, first_name, last_name, role, status, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                    self.user_table
                ),
                &[
                    stored.id.as_str().into(),
                    stored.email.as_str().into(),
                    stored.first_name.as_str().into(),
                    stored.last_name.as_str().into(),
                    stored.role.as_str().into(),
                    stored.status.as_str().into(),
                    stored.created_at.into(),
                    now_millis().into(),
                ],
            )
            .await?;
        Ok(stored)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = self
            .db
            .query_one(
                &format!(
                    "SELECT id, email, first_name, last_name, role, status, created_at \
                     FROM {} WHERE email = $1",
                    self.user_table
                ),
                &[email.trim().to_lowercase().into()],
            )
            .await?;
        Ok(row.as_ref().map(User::from_row))
    }

    /// Every user, oldest first
    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT id, email, first_name, last_name, role, status, created_at \
                     FROM {} ORDER BY created_at, id",
                    self.user_table
                ),
                &[],
            )
            .await?;
        Ok(rows.iter().map(User::from_row).collect())
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.user_table), &[])
            .await?)
    }
}

#[async_trait]
impl Store for UserStore {
    fn name(&self) -> &'static str {
        "user"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.user_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        run_migrations(
            &self.db,
            &[format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id TEXT PRIMARY KEY, \
                 email TEXT NOT NULL UNIQUE, \
                 first_name TEXT NOT NULL DEFAULT '', \
                 last_name TEXT NOT NULL DEFAULT '', \
                 role TEXT NOT NULL DEFAULT 'user', \
                 status TEXT NOT NULL DEFAULT 'unverified', \
                 created_at BIGINT NOT NULL, \
                 updated_at BIGINT NOT NULL)",
                self.user_table
            )],
        )
        .await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory_db;

    async fn store() -> UserStore {
        let store = UserStore::new(
            memory_db().await,
            UserStoreOptions {
                user_table_name: "t_user".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let store = store().await;
        let mut user = User::new(" Ada@Example.com ");
        user.first_name = "Ada".into();
        let created = store.create_user(&user).await.unwrap();
        assert_eq!(created.email, "ada@example.com");

        let found = store.find_by_email("ADA@example.com").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_and_invalid_email_rejected() {
        let store = store().await;
        store.create_user(&User::new("a@example.com")).await.unwrap();

        let dup = store.create_user(&User::new("A@example.com")).await.unwrap_err();
        assert!(matches!(dup, StoreError::InvalidInput(_)));
        let bad = store.create_user(&User::new("nope")).await.unwrap_err();
        assert!(matches!(bad, StoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_and_token_email() {
        let store = store().await;
        store.create_user(&User::new("b@example.com")).await.unwrap();
        let tokenized = store.create_user(&User::new("tk_Abc123")).await.unwrap();
        assert_eq!(tokenized.email, "tk_Abc123");

        let users = store.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().any(|u| u.email == "b@example.com"));
    }
}
