//! Academic plan data model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Course};
use crate::error::{Entity, Error, Result};

/// A course as placed in a plan
///
/// Planned courses are copied out of the catalog so a persisted plan keeps
/// the credits and prerequisites it was validated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedCourse {
    pub course_id: String,
    pub title: String,
    pub credits: u32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub is_core: bool,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
}

impl PlannedCourse {
    pub fn new(course_id: impl Into<String>, credits: u32) -> Self {
        let course_id = course_id.into();
        Self {
            title: course_id.clone(),
            course_id,
            credits,
            prerequisites: Vec::new(),
            is_core: false,
            level: None,
            department: None,
            description: None,
            instructor: None,
        }
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    pub fn core(mut self) -> Self {
        self.is_core = true;
        self
    }
}

impl From<&Course> for PlannedCourse {
    fn from(course: &Course) -> Self {
        Self {
            course_id: course.course_id.clone(),
            title: course.title.clone(),
            credits: course.credits,
            prerequisites: course.prerequisites.clone(),
            is_core: course.is_core,
            level: course.level,
            department: course.department.clone(),
            description: course.description.clone(),
            instructor: course.instructor.clone(),
        }
    }
}

/// A named term holding an ordered list of courses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    pub name: String,
    pub courses: Vec<PlannedCourse>,
}

impl Semester {
    pub fn new(name: impl Into<String>, courses: Vec<PlannedCourse>) -> Self {
        Self {
            name: name.into(),
            courses,
        }
    }

    pub fn credits(&self) -> u32 {
        self.courses.iter().map(|c| c.credits).sum()
    }
}

/// Plan content proposed for a student and program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDraft {
    pub student_id: i64,
    pub program: String,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub semesters: Vec<Semester>,
}

impl PlanDraft {
    pub fn new(student_id: i64, program: impl Into<String>, semesters: Vec<Semester>) -> Self {
        Self {
            student_id,
            program: program.into(),
            university: None,
            department: None,
            semesters,
        }
    }

    pub fn total_credits(&self) -> u32 {
        self.semesters.iter().map(Semester::credits).sum()
    }

    /// All planned courses in semester order
    pub fn courses(&self) -> impl Iterator<Item = &PlannedCourse> {
        self.semesters.iter().flat_map(|s| s.courses.iter())
    }
}

/// A semester listed by course identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterInput {
    pub name: String,
    pub courses: Vec<String>,
}

/// Plan content as written by a user, referencing catalog courses by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInput {
    pub student_id: i64,
    pub program: String,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub semesters: Vec<SemesterInput>,
}

impl PlanInput {
    /// Look every course up in the catalog and build a draft
    ///
    /// Fails with `NotFound` on the first unknown course id.
    pub fn resolve(&self, catalog: &impl Catalog) -> Result<PlanDraft> {
        let semesters = self
            .semesters
            .iter()
            .map(|semester| {
                let courses = semester
                    .courses
                    .iter()
                    .map(|id| {
                        catalog
                            .get_course(id)
                            .map(PlannedCourse::from)
                            .ok_or_else(|| Error::not_found(Entity::Course, id))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Semester::new(semester.name.clone(), courses))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PlanDraft {
            student_id: self.student_id,
            program: self.program.clone(),
            university: self.university.clone(),
            department: self.department.clone(),
            semesters,
        })
    }
}

/// Lifecycle status of a plan version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanStatus {
    Pending,
    Approved,
    Rejected,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "PENDING",
            PlanStatus::Approved => "APPROVED",
            PlanStatus::Rejected => "REJECTED",
        }
    }

    /// Statuses reachable from this one
    pub fn valid_transitions(&self) -> &'static [PlanStatus] {
        match self {
            PlanStatus::Pending => &[PlanStatus::Approved, PlanStatus::Rejected],
            PlanStatus::Approved | PlanStatus::Rejected => &[],
        }
    }

    pub fn can_transition_to(&self, to: PlanStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn is_final(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(PlanStatus::Pending),
            "APPROVED" => Ok(PlanStatus::Approved),
            "REJECTED" => Ok(PlanStatus::Rejected),
            other => Err(Error::Store(format!("unknown plan status: {}", other))),
        }
    }
}

/// A plan ready to be persisted
///
/// Carries no version number: the store assigns the next one for the
/// student and program when it inserts the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlan {
    pub student_id: i64,
    pub program: String,
    pub university: Option<String>,
    pub department: Option<String>,
    pub status: PlanStatus,
    pub semesters: Vec<Semester>,
}

impl NewPlan {
    pub fn from_draft(draft: PlanDraft) -> Self {
        Self {
            student_id: draft.student_id,
            program: draft.program,
            university: draft.university,
            department: draft.department,
            status: PlanStatus::Pending,
            semesters: draft.semesters,
        }
    }
}

/// A persisted, immutable plan version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: i64,
    pub student_id: i64,
    pub program: String,
    pub university: Option<String>,
    pub department: Option<String>,
    pub version: u32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub semesters: Vec<Semester>,
}

impl PlanRecord {
    pub fn total_credits(&self) -> u32 {
        self.semesters.iter().map(Semester::credits).sum()
    }

    pub fn courses(&self) -> impl Iterator<Item = &PlannedCourse> {
        self.semesters.iter().flat_map(|s| s.courses.iter())
    }

    /// The plan's content as a draft, for copying into a new version
    pub fn to_draft(&self) -> PlanDraft {
        PlanDraft {
            student_id: self.student_id,
            program: self.program.clone(),
            university: self.university.clone(),
            department: self.department.clone(),
            semesters: self.semesters.clone(),
        }
    }
}
