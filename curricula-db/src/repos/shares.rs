//! Plan share link repository

use chrono::{DateTime, Utc};
use curricula_core::PlanShare;
use sqlx::{FromRow, SqlitePool};

use crate::error::{Error, Result};

#[derive(Debug, FromRow)]
struct ShareRow {
    token: String,
    plan_id: i64,
    access_level: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ShareRow> for PlanShare {
    type Error = Error;

    fn try_from(row: ShareRow) -> Result<Self> {
        Ok(PlanShare {
            token: row.token,
            plan_id: row.plan_id,
            access_level: row
                .access_level
                .parse()
                .map_err(|e: curricula_core::Error| Error::InvalidData(e.to_string()))?,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

pub struct ShareRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShareRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a share; the plan must exist
    pub async fn create(&self, share: &PlanShare) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO plan_shares (token, plan_id, access_level, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&share.token)
        .bind(share.plan_id)
        .bind(share.access_level.as_str())
        .bind(share.expires_at)
        .bind(share.created_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, token: &str) -> Result<Option<PlanShare>> {
        sqlx::query_as::<_, ShareRow>("SELECT * FROM plan_shares WHERE token = ?")
            .bind(token)
            .fetch_optional(self.pool)
            .await?
            .map(PlanShare::try_from)
            .transpose()
    }

    pub async fn list_for_plan(&self, plan_id: i64) -> Result<Vec<PlanShare>> {
        sqlx::query_as::<_, ShareRow>(
            "SELECT * FROM plan_shares WHERE plan_id = ? ORDER BY created_at",
        )
        .bind(plan_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(PlanShare::try_from)
        .collect()
    }
}
