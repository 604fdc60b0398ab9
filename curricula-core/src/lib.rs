//! Curricula Core - course prerequisites and academic plan management
//!
//! This crate resolves prerequisite trees over a possibly cyclic course
//! catalog, checks prerequisites against completed courses, validates
//! semester-by-semester academic plans and stores them as immutable,
//! numbered versions.

pub mod catalog;
pub mod checker;
pub mod config;
pub mod error;
pub mod plan;
pub mod requirements;
pub mod resolver;
pub mod sharing;
pub mod store;
pub mod validator;
pub mod versions;

pub use catalog::{Catalog, CatalogSnapshot, Course, IntegrityReport, SearchField};
pub use checker::{check_met, CheckError, MissingPrerequisite, PrerequisiteCheck};
pub use config::{Config, DatabaseSettings, SharingConfig, ValidationConfig};
pub use error::{Entity, Error, ErrorKind, PlanRejection, Result};
pub use plan::{
    NewPlan, PlanDraft, PlanInput, PlanRecord, PlanStatus, PlannedCourse, Semester, SemesterInput,
};
pub use requirements::{check_fulfillment, FulfillmentReport, Requirement, RequirementCheck};
pub use resolver::{resolve, DependencyNode};
pub use sharing::{ShareService, SharedPlan};
pub use store::{AccessLevel, MemoryStore, PlanShare, PlanStore, RequirementStore, ShareStore};
pub use validator::{PlanValidator, ValidatedPlan};
pub use versions::{PlanComparison, PlanDifferences, PlanVersionManager};
