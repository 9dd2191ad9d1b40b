//! User store and connection provider.
//!
//! Users live in a single Postgres collection (`sql/schema.sql`), one row per
//! document; the nested wire shape is reassembled on read. The pool sits
//! behind a connect-once gate: the first flow that needs it establishes the
//! connection, concurrent first requests share the same initialization, and a
//! failed attempt is retried by the next request.

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::OnceCell;
use tracing::{info_span, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::arthos::error::ApiError;

/// Discriminator tag stored with every user record.
pub const USER_RECORD_TYPE: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub current: String,
    pub is_verified: bool,
    pub old_emails: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FullName {
    pub first_name: String,
    #[serde(default)]
    pub second_name: Option<String>,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockAvatar {
    pub color: String,
    pub bg_color: String,
    pub spot_color: String,
}

impl BlockAvatar {
    /// Three independently drawn 24-bit colors.
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            color: random_color(rng),
            bg_color: random_color(rng),
            spot_color: random_color(rng),
        }
    }
}

fn random_color<R: Rng>(rng: &mut R) -> String {
    format!("#{:06X}", rng.gen_range(0..=0x00FF_FFFF))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    #[serde(default)]
    pub source: Option<String>,
    pub block_avatar: BlockAvatar,
}

/// A user document. The identifier is assigned exactly once at creation;
/// records are never updated or deleted by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: EmailRecord,
    pub password: String,
    pub nickname: String,
    pub name: FullName,
    pub created_at: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub avatar: Avatar,
}

/// Lazily connected database handle shared across flows.
#[derive(Debug, Clone)]
pub struct Database {
    dsn: String,
    pool: Arc<OnceCell<PgPool>>,
}

impl Database {
    #[must_use]
    pub fn new(dsn: String) -> Self {
        Self {
            dsn,
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Get the pool, connecting on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection exists and one cannot be established.
    pub async fn pool(&self) -> Result<PgPool> {
        let pool = self
            .pool
            .get_or_try_init(|| async {
                PgPoolOptions::new()
                    .min_connections(1)
                    .max_connections(5)
                    .max_lifetime(Duration::from_secs(60 * 2))
                    .test_before_acquire(true)
                    .connect(&self.dsn)
                    .await
                    .context("Failed to connect to database")
            })
            .await?;

        Ok(pool.clone())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.pool.get().is_some()
    }

    /// Classify a datastore fault: no live connection vs. unknown failure.
    pub fn classify<E: Into<anyhow::Error>>(&self, err: E) -> ApiError {
        if self.is_connected() {
            ApiError::Internal(err.into())
        } else {
            ApiError::DatabaseNotConnected
        }
    }
}

const USER_COLUMNS: &str = "id, email, email_verified, old_emails, password, nickname, \
     first_name, second_name, last_name, created_at, record_type, \
     avatar_source, avatar_color, avatar_bg_color, avatar_spot_color";

/// Insert a user document.
///
/// No uniqueness check precedes the insert; the identifier is the only key.
pub async fn insert_one(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    let query = r"
        INSERT INTO users
            (id, email, email_verified, old_emails, password, nickname,
             first_name, second_name, last_name, created_at, record_type,
             avatar_source, avatar_color, avatar_bg_color, avatar_spot_color)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user.id)
        .bind(&user.email.current)
        .bind(user.email.is_verified)
        .bind(&user.email.old_emails)
        .bind(&user.password)
        .bind(&user.nickname)
        .bind(&user.name.first_name)
        .bind(&user.name.second_name)
        .bind(&user.name.last_name)
        .bind(&user.created_at)
        .bind(&user.kind)
        .bind(&user.avatar.source)
        .bind(&user.avatar.block_avatar.color)
        .bind(&user.avatar.block_avatar.bg_color)
        .bind(&user.avatar.block_avatar.spot_color)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(())
}

/// Find a user by current email address (exact match).
pub async fn find_one_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 LIMIT 1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

/// Find a user by identifier.
pub async fn find_one_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 LIMIT 1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: EmailRecord {
            current: row.get("email"),
            is_verified: row.get("email_verified"),
            old_emails: row.get("old_emails"),
        },
        password: row.get("password"),
        nickname: row.get("nickname"),
        name: FullName {
            first_name: row.get("first_name"),
            second_name: row.get("second_name"),
            last_name: row.get("last_name"),
        },
        created_at: row.get("created_at"),
        kind: row.get("record_type"),
        avatar: Avatar {
            source: row.get("avatar_source"),
            block_avatar: BlockAvatar {
                color: row.get("avatar_color"),
                bg_color: row.get("avatar_bg_color"),
                spot_color: row.get("avatar_spot_color"),
            },
        },
    }
}

#[cfg(test)]
pub(crate) fn sample_user() -> User {
    User {
        id: Uuid::new_v4(),
        email: EmailRecord {
            current: "ada@example.com".to_string(),
            is_verified: false,
            old_emails: Vec::new(),
        },
        password: "hunter2".to_string(),
        nickname: "ada".to_string(),
        name: FullName {
            first_name: "Ada".to_string(),
            second_name: None,
            last_name: "Lovelace".to_string(),
        },
        created_at: "2024-01-01T00:00:00.000+00:00".to_string(),
        kind: USER_RECORD_TYPE.to_string(),
        avatar: Avatar {
            source: None,
            block_avatar: BlockAvatar {
                color: "#AABBCC".to_string(),
                bg_color: "#001122".to_string(),
                spot_color: "#FF00FF".to_string(),
            },
        },
    }
}
