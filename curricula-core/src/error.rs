//! Error types for curricula

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::PlanStatus;

/// Result type alias for curricula operations
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Course,
    Plan,
    PlanVersion,
    Share,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Course => "course",
            Entity::Plan => "academic plan",
            Entity::PlanVersion => "academic plan version",
            Entity::Share => "shared plan",
        };
        f.write_str(name)
    }
}

/// Why a candidate plan was refused
///
/// Checks run fail-fast, so a rejection always names the first violation
/// found together with the identifiers involved.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanRejection {
    #[error("invalid program: {program}")]
    InvalidProgram { program: String },

    #[error("academic plan must have at least one semester")]
    EmptyPlan,

    #[error("duplicate semester name: {semester}")]
    DuplicateSemester { semester: String },

    #[error("semester '{semester}' must have at least one course")]
    EmptySemester { semester: String },

    #[error("duplicate course '{course_id}' in semester '{semester}'")]
    DuplicateCourse { semester: String, course_id: String },

    #[error(
        "course '{course_id}' in semester '{semester}' has unmet prerequisite '{prerequisite}'"
    )]
    UnmetPrerequisite {
        semester: String,
        course_id: String,
        prerequisite: String,
    },

    #[error("semester '{semester}' has {credits} credits, exceeding the limit of {limit}")]
    SemesterCreditOverflow {
        semester: String,
        credits: u32,
        limit: u32,
    },

    #[error("plan has {total} total credits, below the minimum of {minimum}")]
    InsufficientTotalCredits { total: u32, minimum: u32 },
}

impl PlanRejection {
    /// The error kind this rejection maps to
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanRejection::InvalidProgram { .. } => ErrorKind::InvalidProgram,
            PlanRejection::EmptyPlan => ErrorKind::EmptyPlan,
            PlanRejection::DuplicateSemester { .. } => ErrorKind::DuplicateSemester,
            PlanRejection::EmptySemester { .. } => ErrorKind::EmptySemester,
            PlanRejection::DuplicateCourse { .. } => ErrorKind::DuplicateCourse,
            PlanRejection::UnmetPrerequisite { .. } => ErrorKind::UnmetPrerequisite,
            PlanRejection::SemesterCreditOverflow { .. } => ErrorKind::SemesterCreditOverflow,
            PlanRejection::InsufficientTotalCredits { .. } => ErrorKind::InsufficientTotalCredits,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Error kinds a request layer maps onto transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidProgram,
    EmptyPlan,
    DuplicateSemester,
    EmptySemester,
    DuplicateCourse,
    UnmetPrerequisite,
    SemesterCreditOverflow,
    InsufficientTotalCredits,
    MissingRequirementDefinition,
    InvalidStatusTransition,
    ShareExpired,
    Store,
    Config,
    Io,
    Json,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidProgram => "invalid_program",
            ErrorKind::EmptyPlan => "empty_plan",
            ErrorKind::DuplicateSemester => "duplicate_semester",
            ErrorKind::EmptySemester => "empty_semester",
            ErrorKind::DuplicateCourse => "duplicate_course",
            ErrorKind::UnmetPrerequisite => "unmet_prerequisite",
            ErrorKind::SemesterCreditOverflow => "semester_credit_overflow",
            ErrorKind::InsufficientTotalCredits => "insufficient_total_credits",
            ErrorKind::MissingRequirementDefinition => "missing_requirement_definition",
            ErrorKind::InvalidStatusTransition => "invalid_status_transition",
            ErrorKind::ShareExpired => "share_expired",
            ErrorKind::Store => "store",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
            ErrorKind::Json => "json",
        }
    }

    /// Whether this kind is a plan validation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidProgram
                | ErrorKind::EmptyPlan
                | ErrorKind::DuplicateSemester
                | ErrorKind::EmptySemester
                | ErrorKind::DuplicateCourse
                | ErrorKind::UnmetPrerequisite
                | ErrorKind::SemesterCreditOverflow
                | ErrorKind::InsufficientTotalCredits
        )
    }
}

/// Error type for curricula operations
#[derive(Error, Debug)]
pub enum Error {
    /// A course, plan, plan version or share does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// A candidate plan failed validation
    #[error("plan rejected: {0}")]
    Rejected(#[from] PlanRejection),

    /// No requirement record exists for the program
    #[error("no requirement defined for program '{0}'")]
    MissingRequirementDefinition(String),

    /// Plan status can only move out of PENDING
    #[error("cannot move academic plan {plan_id} from {from} to {to}")]
    InvalidStatusTransition {
        plan_id: i64,
        from: PlanStatus,
        to: PlanStatus,
    },

    /// A share token exists but is past its expiration
    #[error("shared link has expired: {0}")]
    ShareExpired(String),

    /// Persistence backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Rejected(rejection) => rejection.kind(),
            Error::MissingRequirementDefinition(_) => ErrorKind::MissingRequirementDefinition,
            Error::InvalidStatusTransition { .. } => ErrorKind::InvalidStatusTransition,
            Error::ShareExpired(_) => ErrorKind::ShareExpired,
            Error::Store(_) => ErrorKind::Store,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Json,
        }
    }

    /// The rejection carried by a validation failure, if any
    pub fn rejection(&self) -> Option<&PlanRejection> {
        match self {
            Error::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
