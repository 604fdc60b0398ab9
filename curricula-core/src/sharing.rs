//! Shareable plan links

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{Entity, Error, Result};
use crate::plan::PlanRecord;
use crate::store::{AccessLevel, PlanShare, PlanStore, ShareStore};

/// A plan opened through a share token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPlan {
    pub access_level: AccessLevel,
    pub expires_at: Option<DateTime<Utc>>,
    pub plan: PlanRecord,
}

/// Issues and redeems share tokens
pub struct ShareService<S> {
    store: S,
    default_expiration: Option<Duration>,
}

impl<S: PlanStore + ShareStore> ShareService<S> {
    pub fn new(store: S, default_expiration: Option<Duration>) -> Self {
        Self {
            store,
            default_expiration,
        }
    }

    /// Create a share link for a plan
    ///
    /// `expires_in` falls back to the configured default; with neither the
    /// link never expires.
    pub async fn create_share(
        &self,
        plan_id: i64,
        access_level: AccessLevel,
        expires_in: Option<Duration>,
    ) -> Result<PlanShare> {
        if self.store.get_plan(plan_id).await?.is_none() {
            return Err(Error::not_found(Entity::Plan, plan_id));
        }

        let now = Utc::now();
        let expires_at = expires_in
            .or(self.default_expiration)
            .map(|ttl| {
                chrono::Duration::from_std(ttl)
                    .map(|ttl| now + ttl)
                    .map_err(|e| Error::Config(format!("share expiration out of range: {}", e)))
            })
            .transpose()?;

        let share = self
            .store
            .save_share(PlanShare {
                token: Uuid::new_v4().to_string(),
                plan_id,
                access_level,
                expires_at,
                created_at: now,
            })
            .await?;

        info!(plan_id, access = %access_level, "Created share link");
        Ok(share)
    }

    /// Every share issued for a plan, oldest first
    pub async fn list_shares(&self, plan_id: i64) -> Result<Vec<PlanShare>> {
        if self.store.get_plan(plan_id).await?.is_none() {
            return Err(Error::not_found(Entity::Plan, plan_id));
        }
        self.store.list_shares(plan_id).await
    }

    /// Open a shared plan as of `now`
    pub async fn open_share(&self, token: &str, now: DateTime<Utc>) -> Result<SharedPlan> {
        let share = self
            .store
            .get_share(token)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Share, token))?;

        if share.is_expired_at(now) {
            return Err(Error::ShareExpired(token.to_string()));
        }

        let plan = self
            .store
            .get_plan(share.plan_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Plan, share.plan_id))?;

        Ok(SharedPlan {
            access_level: share.access_level,
            expires_at: share.expires_at,
            plan,
        })
    }
}
