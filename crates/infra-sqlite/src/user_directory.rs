// SQLite-backed identity lookup

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use futon_core::domain::UserId;
use futon_core::error::Result;
use futon_core::port::{UserContact, UserDirectory};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or refresh a user; the engine itself never writes users
    pub async fn upsert_user(&self, id: &str, contact: &UserContact, now_millis: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET email = excluded.email, display_name = excluded.display_name
            "#,
        )
        .bind(id)
        .bind(&contact.email)
        .bind(&contact.display_name)
        .bind(now_millis)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    email: String,
    display_name: String,
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<UserContact>> {
        let row: Option<ContactRow> =
            sqlx::query_as("SELECT email, display_name FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(|r| UserContact {
            email: r.email,
            display_name: r.display_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};

    #[tokio::test]
    async fn test_upsert_and_lookup() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let users = SqliteUserDirectory::new(pool);

        assert!(users
            .get_user_by_id(&"owner-1".to_string())
            .await
            .unwrap()
            .is_none());

        let contact = UserContact {
            email: "o@example.com".to_string(),
            display_name: "Owner".to_string(),
        };
        users.upsert_user("owner-1", &contact, 1_000).await.unwrap();
        let renamed = UserContact {
            display_name: "Owner Two".to_string(),
            ..contact
        };
        users.upsert_user("owner-1", &renamed, 2_000).await.unwrap();

        let found = users
            .get_user_by_id(&"owner-1".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, renamed);
    }
}
