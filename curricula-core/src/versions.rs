//! Plan version management
//!
//! Every write produces a new immutable plan row numbered
//! `max(existing versions) + 1` for its student and program. The store
//! allocates that number inside its own write, so managers in different
//! tasks or processes sharing one database never hand out the same version.
//! Status changes are compare-and-set against the status that was checked.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::ValidationConfig;
use crate::error::{Entity, Error, Result};
use crate::plan::{NewPlan, PlanDraft, PlanRecord, PlanStatus, Semester};
use crate::requirements::{check_fulfillment, FulfillmentReport};
use crate::store::{PlanStore, RequirementStore};
use crate::validator::PlanValidator;

/// Per-plan summary included in a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparedPlan {
    pub id: i64,
    pub program: String,
    pub version: u32,
    pub status: PlanStatus,
    pub total_credits: u32,
    pub semesters: Vec<Semester>,
}

/// Values that are not shared by every compared plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDifferences {
    /// Distinct totals, empty when every plan has the same total
    pub total_credits: BTreeSet<u32>,
    pub semesters: BTreeSet<String>,
    pub courses: BTreeSet<String>,
}

impl PlanDifferences {
    pub fn is_empty(&self) -> bool {
        self.total_credits.is_empty() && self.semesters.is_empty() && self.courses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanComparison {
    pub plans: Vec<ComparedPlan>,
    pub differences: PlanDifferences,
}

/// Creates, versions and transitions academic plans
pub struct PlanVersionManager<S> {
    store: S,
    validator: PlanValidator,
}

impl<S: PlanStore> PlanVersionManager<S> {
    pub fn new(store: S, config: ValidationConfig) -> Self {
        Self {
            store,
            validator: PlanValidator::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn validator(&self) -> &PlanValidator {
        &self.validator
    }

    /// Persist a draft as the next version for its student and program
    ///
    /// Callers must have validated the draft (or be copying a stored one).
    async fn append_version(&self, draft: PlanDraft) -> Result<PlanRecord> {
        let record = self.store.append_plan(NewPlan::from_draft(draft)).await?;
        info!(
            plan_id = record.id,
            student_id = record.student_id,
            program = %record.program,
            version = record.version,
            "Stored academic plan version"
        );
        Ok(record)
    }

    async fn require_plan(&self, plan_id: i64) -> Result<PlanRecord> {
        self.store
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Plan, plan_id))
    }

    /// Validate and store a new plan, starting PENDING
    #[instrument(skip(self, draft), fields(student_id = draft.student_id, program = %draft.program))]
    pub async fn create(&self, draft: PlanDraft) -> Result<PlanRecord> {
        let validated = self.validator.validate(&draft)?;
        self.append_version(validated.into_draft()).await
    }

    pub async fn get(&self, plan_id: i64) -> Result<PlanRecord> {
        self.require_plan(plan_id).await
    }

    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<PlanRecord>> {
        self.store.list_plans(offset, limit).await
    }

    /// All versions for a student and program, newest first
    pub async fn list_versions(&self, student_id: i64, program: &str) -> Result<Vec<PlanRecord>> {
        let mut versions = self.store.load_plan_versions(student_id, program).await?;
        if versions.is_empty() {
            return Err(Error::not_found(
                Entity::PlanVersion,
                format!("student {} / {}", student_id, program),
            ));
        }
        versions.reverse();
        Ok(versions)
    }

    /// Store new content as the next version of an existing plan
    ///
    /// The new version keeps the original plan's student and program,
    /// whatever the content says.
    #[instrument(skip(self, content))]
    pub async fn update(&self, plan_id: i64, content: PlanDraft) -> Result<PlanRecord> {
        let original = self.require_plan(plan_id).await?;
        let draft = PlanDraft {
            student_id: original.student_id,
            program: original.program,
            ..content
        };

        let validated = self.validator.validate(&draft)?;
        self.append_version(validated.into_draft()).await
    }

    /// Copy an existing version's content into a new version
    #[instrument(skip(self))]
    pub async fn restore(&self, student_id: i64, program: &str, version: u32) -> Result<PlanRecord> {
        let source = self
            .store
            .load_plan_versions(student_id, program)
            .await?
            .into_iter()
            .find(|p| p.version == version)
            .ok_or_else(|| {
                Error::not_found(
                    Entity::PlanVersion,
                    format!("student {} / {} / v{}", student_id, program, version),
                )
            })?;

        self.append_version(source.to_draft()).await
    }

    async fn transition(&self, plan_id: i64, to: PlanStatus) -> Result<PlanRecord> {
        let plan = self.require_plan(plan_id).await?;
        if !plan.status.can_transition_to(to) {
            return Err(Error::InvalidStatusTransition {
                plan_id,
                from: plan.status,
                to,
            });
        }

        let Some(updated) = self.store.set_status(plan_id, plan.status, to).await? else {
            // Another writer moved or deleted the plan after it was read
            let current = self.require_plan(plan_id).await?;
            return Err(Error::InvalidStatusTransition {
                plan_id,
                from: current.status,
                to,
            });
        };
        info!(plan_id, status = %to, "Academic plan status changed");
        Ok(updated)
    }

    pub async fn approve(&self, plan_id: i64) -> Result<PlanRecord> {
        self.transition(plan_id, PlanStatus::Approved).await
    }

    pub async fn reject(&self, plan_id: i64) -> Result<PlanRecord> {
        self.transition(plan_id, PlanStatus::Rejected).await
    }

    /// Compare plans, reporting what is not common to all of them
    ///
    /// Repeated ids are compared once.
    pub async fn compare(&self, plan_ids: &[i64]) -> Result<PlanComparison> {
        let mut seen = BTreeSet::new();
        let mut plans = Vec::new();
        for &id in plan_ids {
            if seen.insert(id) {
                plans.push(self.require_plan(id).await?);
            }
        }

        let compared: Vec<ComparedPlan> = plans
            .iter()
            .map(|p| ComparedPlan {
                id: p.id,
                program: p.program.clone(),
                version: p.version,
                status: p.status,
                total_credits: p.total_credits(),
                semesters: p.semesters.clone(),
            })
            .collect();

        let mut differences = PlanDifferences::default();
        if compared.len() > 1 {
            let totals: BTreeSet<u32> = compared.iter().map(|p| p.total_credits).collect();
            if totals.len() > 1 {
                differences.total_credits = totals;
            }

            differences.semesters = not_common(
                plans
                    .iter()
                    .map(|p| p.semesters.iter().map(|s| s.name.clone()).collect::<BTreeSet<_>>()),
            );
            differences.courses = not_common(
                plans
                    .iter()
                    .map(|p| p.courses().map(|c| c.course_id.clone()).collect::<BTreeSet<_>>()),
            );
        }

        Ok(PlanComparison {
            plans: compared,
            differences,
        })
    }

    /// Delete one plan version with its semesters and courses
    #[instrument(skip(self))]
    pub async fn delete(&self, plan_id: i64) -> Result<()> {
        if !self.store.delete_plan_cascade(plan_id).await? {
            return Err(Error::not_found(Entity::Plan, plan_id));
        }
        info!(plan_id, "Deleted academic plan");
        Ok(())
    }
}

impl<S: PlanStore + RequirementStore> PlanVersionManager<S> {
    /// Report how a stored plan measures up to its program's requirement
    pub async fn requirements_fulfillment(&self, plan_id: i64) -> Result<FulfillmentReport> {
        let plan = self.require_plan(plan_id).await?;
        let requirement = self
            .store
            .get_requirement(&plan.program)
            .await?
            .ok_or_else(|| Error::MissingRequirementDefinition(plan.program.clone()))?;

        Ok(check_fulfillment(plan.courses(), &requirement))
    }
}

/// Union of all sets minus their intersection
fn not_common(sets: impl Iterator<Item = BTreeSet<String>>) -> BTreeSet<String> {
    let sets: Vec<BTreeSet<String>> = sets.collect();
    let Some(first) = sets.first() else {
        return BTreeSet::new();
    };

    let union: BTreeSet<String> = sets.iter().flatten().cloned().collect();
    let common: BTreeSet<String> = first
        .iter()
        .filter(|item| sets.iter().all(|s| s.contains(*item)))
        .cloned()
        .collect();

    union.difference(&common).cloned().collect()
}
