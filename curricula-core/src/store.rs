//! Persistence interfaces and an in-memory implementation
//!
//! Plan rows are append-only: the only in-place change a store makes to an
//! existing plan is its status column.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::{NewPlan, PlanRecord, PlanStatus};
use crate::requirements::Requirement;
use crate::{Error, Result};

/// Storage for plan versions
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// All versions for a student and program, ascending by version
    async fn load_plan_versions(&self, student_id: i64, program: &str) -> Result<Vec<PlanRecord>>;

    async fn get_plan(&self, plan_id: i64) -> Result<Option<PlanRecord>>;

    /// Plans ordered by id
    async fn list_plans(&self, offset: usize, limit: usize) -> Result<Vec<PlanRecord>>;

    /// Persist a plan with its semesters and courses as the next version
    ///
    /// The version is `max(existing) + 1` for the plan's student and program
    /// (1 when none exist), allocated atomically with the insert so
    /// concurrent writers sharing the store never receive the same number.
    async fn append_plan(&self, plan: NewPlan) -> Result<PlanRecord>;

    /// Change a plan's status from `from` to `to`
    ///
    /// Returns `None` when the plan is missing or no longer has status `from`.
    async fn set_status(
        &self,
        plan_id: i64,
        from: PlanStatus,
        to: PlanStatus,
    ) -> Result<Option<PlanRecord>>;

    /// Remove a plan's courses, semesters and shares, then the plan itself
    ///
    /// Returns false when the plan did not exist.
    async fn delete_plan_cascade(&self, plan_id: i64) -> Result<bool>;
}

/// Storage for per-program requirements
#[async_trait]
pub trait RequirementStore: Send + Sync {
    async fn get_requirement(&self, program: &str) -> Result<Option<Requirement>>;

    /// Insert or replace the requirement for its program
    async fn put_requirement(&self, requirement: Requirement) -> Result<Requirement>;

    /// All requirements ordered by program
    async fn list_requirements(&self) -> Result<Vec<Requirement>>;
}

/// Access granted by a share token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessLevel {
    #[default]
    View,
    Edit,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::View => "VIEW",
            AccessLevel::Edit => "EDIT",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "VIEW" => Ok(AccessLevel::View),
            "EDIT" => Ok(AccessLevel::Edit),
            other => Err(Error::Config(format!("unknown access level: {}", other))),
        }
    }
}

/// An opaque token granting access to one plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanShare {
    pub token: String,
    pub plan_id: i64,
    pub access_level: AccessLevel,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PlanShare {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }
}

/// Storage for share tokens
#[async_trait]
pub trait ShareStore: Send + Sync {
    async fn save_share(&self, share: PlanShare) -> Result<PlanShare>;

    async fn get_share(&self, token: &str) -> Result<Option<PlanShare>>;

    /// Shares issued for one plan, oldest first
    async fn list_shares(&self, plan_id: i64) -> Result<Vec<PlanShare>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    next_plan_id: i64,
    plans: BTreeMap<i64, PlanRecord>,
    requirements: HashMap<String, Requirement>,
    shares: HashMap<String, PlanShare>,
}

/// A process-local store, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn load_plan_versions(&self, student_id: i64, program: &str) -> Result<Vec<PlanRecord>> {
        let state = self.lock()?;
        let mut versions: Vec<PlanRecord> = state
            .plans
            .values()
            .filter(|p| p.student_id == student_id && p.program == program)
            .cloned()
            .collect();
        versions.sort_by_key(|p| p.version);
        Ok(versions)
    }

    async fn get_plan(&self, plan_id: i64) -> Result<Option<PlanRecord>> {
        Ok(self.lock()?.plans.get(&plan_id).cloned())
    }

    async fn list_plans(&self, offset: usize, limit: usize) -> Result<Vec<PlanRecord>> {
        Ok(self
            .lock()?
            .plans
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn append_plan(&self, plan: NewPlan) -> Result<PlanRecord> {
        let mut state = self.lock()?;

        let version = state
            .plans
            .values()
            .filter(|p| p.student_id == plan.student_id && p.program == plan.program)
            .map(|p| p.version)
            .max()
            .unwrap_or(0)
            + 1;

        state.next_plan_id += 1;
        let record = PlanRecord {
            id: state.next_plan_id,
            student_id: plan.student_id,
            program: plan.program,
            university: plan.university,
            department: plan.department,
            version,
            status: plan.status,
            created_at: Utc::now(),
            semesters: plan.semesters,
        };
        state.plans.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_status(
        &self,
        plan_id: i64,
        from: PlanStatus,
        to: PlanStatus,
    ) -> Result<Option<PlanRecord>> {
        let mut state = self.lock()?;
        Ok(state
            .plans
            .get_mut(&plan_id)
            .filter(|plan| plan.status == from)
            .map(|plan| {
                plan.status = to;
                plan.clone()
            }))
    }

    async fn delete_plan_cascade(&self, plan_id: i64) -> Result<bool> {
        let mut state = self.lock()?;
        if state.plans.remove(&plan_id).is_none() {
            return Ok(false);
        }
        state.shares.retain(|_, share| share.plan_id != plan_id);
        Ok(true)
    }
}

#[async_trait]
impl RequirementStore for MemoryStore {
    async fn get_requirement(&self, program: &str) -> Result<Option<Requirement>> {
        Ok(self.lock()?.requirements.get(program).cloned())
    }

    async fn put_requirement(&self, requirement: Requirement) -> Result<Requirement> {
        self.lock()?
            .requirements
            .insert(requirement.program.clone(), requirement.clone());
        Ok(requirement)
    }

    async fn list_requirements(&self) -> Result<Vec<Requirement>> {
        let mut requirements: Vec<Requirement> =
            self.lock()?.requirements.values().cloned().collect();
        requirements.sort_by(|a, b| a.program.cmp(&b.program));
        Ok(requirements)
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn save_share(&self, share: PlanShare) -> Result<PlanShare> {
        let mut state = self.lock()?;
        if !state.plans.contains_key(&share.plan_id) {
            return Err(Error::Store(format!(
                "cannot share missing plan {}",
                share.plan_id
            )));
        }
        state.shares.insert(share.token.clone(), share.clone());
        Ok(share)
    }

    async fn get_share(&self, token: &str) -> Result<Option<PlanShare>> {
        Ok(self.lock()?.shares.get(token).cloned())
    }

    async fn list_shares(&self, plan_id: i64) -> Result<Vec<PlanShare>> {
        let mut shares: Vec<PlanShare> = self
            .lock()?
            .shares
            .values()
            .filter(|share| share.plan_id == plan_id)
            .cloned()
            .collect();
        shares.sort_by_key(|share| share.created_at);
        Ok(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlannedCourse, Semester};

    fn new_plan(program: &str) -> NewPlan {
        NewPlan {
            student_id: 7,
            program: program.to_string(),
            university: None,
            department: None,
            status: PlanStatus::Pending,
            semesters: vec![Semester::new("Fall", vec![PlannedCourse::new("CS101", 3)])],
        }
    }

    #[tokio::test]
    async fn test_append_allocates_versions_per_key() {
        let store = MemoryStore::new();
        let first = store.append_plan(new_plan("Computer Science")).await.unwrap();
        let second = store.append_plan(new_plan("Computer Science")).await.unwrap();
        let other = store.append_plan(new_plan("Mathematics")).await.unwrap();
        assert_eq!((first.version, second.version, other.version), (1, 2, 1));

        let versions = store
            .load_plan_versions(7, "Computer Science")
            .await
            .unwrap();
        assert_eq!(versions.iter().map(|p| p.version).collect::<Vec<_>>(), vec![1, 2]);
        assert!(store.load_plan_versions(8, "Computer Science").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_status_requires_expected_status() {
        let store = MemoryStore::new();
        let plan = store.append_plan(new_plan("Computer Science")).await.unwrap();

        let approved = store
            .set_status(plan.id, PlanStatus::Pending, PlanStatus::Approved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, PlanStatus::Approved);
        assert!(store
            .set_status(plan.id, PlanStatus::Pending, PlanStatus::Rejected)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .set_status(99, PlanStatus::Pending, PlanStatus::Approved)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_shares() {
        let store = MemoryStore::new();
        let plan = store.append_plan(new_plan("Computer Science")).await.unwrap();
        store
            .save_share(PlanShare {
                token: "tok".to_string(),
                plan_id: plan.id,
                access_level: AccessLevel::View,
                expires_at: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(store.delete_plan_cascade(plan.id).await.unwrap());
        assert!(store.get_share("tok").await.unwrap().is_none());
        assert!(!store.delete_plan_cascade(plan.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_requirements_by_program() {
        let store = MemoryStore::new();
        for program in ["Mathematics", "Computer Science"] {
            store
                .put_requirement(Requirement {
                    program: program.to_string(),
                    total_hours: 120,
                    num_core_courses: 10,
                    num_elective_courses: 4,
                })
                .await
                .unwrap();
        }

        let programs: Vec<String> = store
            .list_requirements()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.program)
            .collect();
        assert_eq!(programs, vec!["Computer Science", "Mathematics"]);
    }

    #[test]
    fn test_access_level_parse() {
        assert_eq!("edit".parse::<AccessLevel>().unwrap(), AccessLevel::Edit);
        assert!("admin".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn test_share_expiry() {
        let now = Utc::now();
        let mut share = PlanShare {
            token: "tok".to_string(),
            plan_id: 1,
            access_level: AccessLevel::View,
            expires_at: None,
            created_at: now,
        };
        assert!(!share.is_expired_at(now));

        share.expires_at = Some(now - chrono::Duration::minutes(1));
        assert!(share.is_expired_at(now));
    }
}
