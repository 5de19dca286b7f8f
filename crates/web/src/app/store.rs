//! SQLite-backed user repository used by the reference routes.
//!
//! Every write passes the record through the registered [`FillHandler`] first,
//! so audit columns come from the caller context of the current request.

use std::{str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use uuid::Uuid;

use aurora_core::{AuditStamp, FieldAccessor, FillHandler, FillValue};

/// Open the pool. A single connection keeps `sqlite::memory:` databases alive
/// and shared for the lifetime of the pool.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id           TEXT PRIMARY KEY,
            name         TEXT NOT NULL UNIQUE,
            email        TEXT NOT NULL,
            created_by   TEXT,
            created_time TEXT,
            updated_by   TEXT,
            updated_time TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl FieldAccessor for UserRecord {
    fn set_field(&mut self, field: &str, value: FillValue) -> bool {
        self.audit.set_field(field, value)
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    created_by: Option<String>,
    created_time: Option<DateTime<Utc>>,
    updated_by: Option<String>,
    updated_time: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            audit: AuditStamp {
                created_by: row.created_by,
                created_time: row.created_time,
                updated_by: row.updated_by,
                updated_time: row.updated_time,
            },
        }
    }
}

const SELECT_USER: &str =
    "SELECT id, name, email, created_by, created_time, updated_by, updated_time FROM users";

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
    fill: Arc<dyn FillHandler>,
}

impl UserStore {
    pub fn new(pool: SqlitePool, fill: Arc<dyn FillHandler>) -> Self {
        Self { pool, fill }
    }

    pub async fn insert(&self, name: String, email: String) -> Result<UserRecord, sqlx::Error> {
        let mut record = UserRecord {
            id: Uuid::now_v7().to_string(),
            name,
            email,
            audit: AuditStamp::default(),
        };
        self.fill.insert_fill(&mut record);

        sqlx::query(
            "INSERT INTO users (id, name, email, created_by, created_time, updated_by, updated_time) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.audit.created_by)
        .bind(record.audit.created_time)
        .bind(&record.audit.updated_by)
        .bind(record.audit.updated_time)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %record.id, "user created");
        Ok(record)
    }

    /// Change a user's email. Returns `None` when the user does not exist.
    pub async fn update_email(&self, id: &str, email: String) -> Result<Option<UserRecord>, sqlx::Error> {
        let Some(mut record) = self.get(id).await? else {
            return Ok(None);
        };
        record.email = email;
        self.fill.update_fill(&mut record);

        sqlx::query("UPDATE users SET email = ?, updated_by = ?, updated_time = ? WHERE id = ?")
            .bind(&record.email)
            .bind(&record.audit.updated_by)
            .bind(record.audit.updated_time)
            .bind(&record.id)
            .execute(&self.pool)
            .await?;

        tracing::info!(user_id = %record.id, "user updated");
        Ok(Some(record))
    }

    pub async fn get(&self, id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRecord::from))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRecord::from))
    }
}

#[cfg(test)]
mod tests {
    use aurora_core::{AuditFillHandler, CallerContext, context};

    use super::*;

    async fn store() -> UserStore {
        let pool = connect("sqlite::memory:").await.unwrap();
        migrate(&pool).await.unwrap();
        UserStore::new(pool, Arc::new(AuditFillHandler::new()))
    }

    fn caller(name: &str) -> CallerContext {
        CallerContext::from_header(Some(&format!(r#"{{"user_name":"{name}"}}"#)))
    }

    #[tokio::test]
    async fn insert_stamps_and_persists_audit_columns() {
        let store = store().await;
        let created = context::scope(caller("alice"), store.insert("alice".into(), "a@x.io".into()))
            .await
            .unwrap();

        assert_eq!(created.audit.created_by.as_deref(), Some("alice"));
        assert_eq!(created.audit.updated_by.as_deref(), Some("alice"));

        let loaded = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn update_only_touches_updated_columns() {
        let store = store().await;
        let created = store.insert("bob".into(), "b@x.io".into()).await.unwrap();
        assert_eq!(created.audit.created_by.as_deref(), Some("system"));

        let updated = context::scope(caller("carol"), store.update_email(&created.id, "new@x.io".into()))
            .await
            .unwrap()
            .unwrap();

        let loaded = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded, updated);
        assert_eq!(loaded.email, "new@x.io");
        assert_eq!(loaded.audit.created_by, created.audit.created_by);
        assert_eq!(loaded.audit.created_time, created.audit.created_time);
        assert_eq!(loaded.audit.updated_by.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn duplicate_names_violate_unique_constraint() {
        let store = store().await;
        store.insert("dave".into(), "d@x.io".into()).await.unwrap();

        let err = store.insert("dave".into(), "d2@x.io".into()).await.unwrap_err();
        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_rows_are_none() {
        let store = store().await;
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.update_email("nope", "x@x.io".into()).await.unwrap().is_none());
        assert!(store.find_by_name("nope").await.unwrap().is_none());
    }
}
