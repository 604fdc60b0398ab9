//! Academic plan validation
//!
//! Checks run in a fixed order and stop at the first violation:
//! 1. program is one of the configured programs
//! 2. the plan has at least one semester
//! 3. semester names are unique
//! 4. every semester has at least one course
//! 5. course ids are unique within a semester
//! 6. every prerequisite was completed in an earlier position of the plan
//! 7. per-semester credits do not exceed the ceiling
//! 8. total credits reach the floor
//!
//! Prerequisites are satisfied only by courses placed before the current
//! course, so two courses in the same semester cannot satisfy each other.
//! Co-requisites are not supported.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ValidationConfig;
use crate::error::PlanRejection;
use crate::plan::PlanDraft;

/// A draft that passed every check, with its credit totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedPlan {
    pub plan: PlanDraft,
    pub semester_credits: Vec<u32>,
    pub total_credits: u32,
}

impl ValidatedPlan {
    pub fn into_draft(self) -> PlanDraft {
        self.plan
    }
}

/// Validates plan drafts against configured limits
#[derive(Debug, Clone)]
pub struct PlanValidator {
    config: ValidationConfig,
}

impl PlanValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a draft, returning the first violation found
    pub fn validate(&self, draft: &PlanDraft) -> Result<ValidatedPlan, PlanRejection> {
        if !self.config.is_valid_program(&draft.program) {
            return Err(PlanRejection::InvalidProgram {
                program: draft.program.clone(),
            });
        }

        if draft.semesters.is_empty() {
            return Err(PlanRejection::EmptyPlan);
        }

        let mut semester_names = HashSet::new();
        let mut completed: HashSet<&str> = HashSet::new();
        let mut semester_credits = Vec::with_capacity(draft.semesters.len());
        let mut total_credits = 0u32;

        for semester in &draft.semesters {
            if !semester_names.insert(semester.name.as_str()) {
                return Err(PlanRejection::DuplicateSemester {
                    semester: semester.name.clone(),
                });
            }

            if semester.courses.is_empty() {
                return Err(PlanRejection::EmptySemester {
                    semester: semester.name.clone(),
                });
            }

            let mut course_ids = HashSet::new();
            let mut credits = 0u32;

            for course in &semester.courses {
                if !course_ids.insert(course.course_id.as_str()) {
                    return Err(PlanRejection::DuplicateCourse {
                        semester: semester.name.clone(),
                        course_id: course.course_id.clone(),
                    });
                }

                if let Some(prereq) = course
                    .prerequisites
                    .iter()
                    .find(|p| !completed.contains(p.as_str()))
                {
                    return Err(PlanRejection::UnmetPrerequisite {
                        semester: semester.name.clone(),
                        course_id: course.course_id.clone(),
                        prerequisite: prereq.clone(),
                    });
                }

                completed.insert(course.course_id.as_str());
                credits = credits.saturating_add(course.credits);
                total_credits = total_credits.saturating_add(course.credits);
            }

            if credits > self.config.max_semester_credits {
                return Err(PlanRejection::SemesterCreditOverflow {
                    semester: semester.name.clone(),
                    credits,
                    limit: self.config.max_semester_credits,
                });
            }

            semester_credits.push(credits);
        }

        if total_credits < self.config.min_total_credits {
            return Err(PlanRejection::InsufficientTotalCredits {
                total: total_credits,
                minimum: self.config.min_total_credits,
            });
        }

        debug!(
            student_id = draft.student_id,
            program = %draft.program,
            semesters = draft.semesters.len(),
            total_credits,
            "Plan passed validation"
        );

        Ok(ValidatedPlan {
            plan: draft.clone(),
            semester_credits,
            total_credits,
        })
    }
}

impl Default for PlanValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::plan::{PlannedCourse, Semester};

    const CS: &str = "Computer Science";

    fn course(id: &str, credits: u32, prereqs: &[&str]) -> PlannedCourse {
        PlannedCourse::new(id, credits).with_prerequisites(prereqs.iter().copied())
    }

    fn draft(semesters: Vec<Semester>) -> PlanDraft {
        PlanDraft::new(7, CS, semesters)
    }

    fn kind(result: Result<ValidatedPlan, PlanRejection>) -> ErrorKind {
        result.unwrap_err().kind()
    }

    #[test]
    fn test_two_semester_plan_is_valid() {
        let plan = draft(vec![
            Semester::new("Fall", vec![course("A", 3, &[])]),
            Semester::new("Spring", vec![course("B", 3, &["A"])]),
        ]);

        let validated = PlanValidator::default().validate(&plan).unwrap();
        assert_eq!(validated.total_credits, 6);
        assert_eq!(validated.semester_credits, vec![3, 3]);
    }

    #[test]
    fn test_prerequisite_never_taken() {
        let plan = draft(vec![Semester::new("Fall", vec![course("B", 3, &["A"])])]);

        let rejection = PlanValidator::default().validate(&plan).unwrap_err();
        assert_eq!(
            rejection,
            PlanRejection::UnmetPrerequisite {
                semester: "Fall".to_string(),
                course_id: "B".to_string(),
                prerequisite: "A".to_string(),
            }
        );
    }

    #[test]
    fn test_prerequisite_in_later_semester_is_unmet() {
        let plan = draft(vec![
            Semester::new("Fall", vec![course("B", 3, &["A"])]),
            Semester::new("Spring", vec![course("A", 3, &[])]),
        ]);
        assert_eq!(
            kind(PlanValidator::default().validate(&plan)),
            ErrorKind::UnmetPrerequisite
        );
    }

    #[test]
    fn test_co_requisites_in_same_semester_are_rejected() {
        let plan = draft(vec![Semester::new(
            "Fall",
            vec![course("A", 3, &["B"]), course("B", 3, &["A"])],
        )]);
        assert_eq!(
            kind(PlanValidator::default().validate(&plan)),
            ErrorKind::UnmetPrerequisite
        );
    }

    #[test]
    fn test_earlier_course_in_same_semester_satisfies_later_one() {
        let plan = draft(vec![Semester::new(
            "Fall",
            vec![course("A", 3, &[]), course("B", 3, &["A"])],
        )]);
        assert!(PlanValidator::default().validate(&plan).is_ok());
    }

    #[test]
    fn test_invalid_program_checked_first() {
        let plan = PlanDraft::new(7, "Alchemy", Vec::new());
        assert_eq!(
            PlanValidator::default().validate(&plan).unwrap_err(),
            PlanRejection::InvalidProgram {
                program: "Alchemy".to_string()
            }
        );
    }

    #[test]
    fn test_empty_plan() {
        assert_eq!(
            kind(PlanValidator::default().validate(&draft(Vec::new()))),
            ErrorKind::EmptyPlan
        );
    }

    #[test]
    fn test_duplicate_semester() {
        let plan = draft(vec![
            Semester::new("Fall", vec![course("A", 3, &[])]),
            Semester::new("Fall", vec![course("B", 3, &[])]),
        ]);
        assert_eq!(
            PlanValidator::default().validate(&plan).unwrap_err(),
            PlanRejection::DuplicateSemester {
                semester: "Fall".to_string()
            }
        );
    }

    #[test]
    fn test_empty_semester() {
        let plan = draft(vec![
            Semester::new("Fall", vec![course("A", 3, &[])]),
            Semester::new("Spring", Vec::new()),
        ]);
        assert_eq!(
            kind(PlanValidator::default().validate(&plan)),
            ErrorKind::EmptySemester
        );
    }

    #[test]
    fn test_duplicate_course_within_semester() {
        let plan = draft(vec![Semester::new(
            "Fall",
            vec![course("A", 3, &[]), course("A", 3, &[])],
        )]);
        assert_eq!(
            PlanValidator::default().validate(&plan).unwrap_err(),
            PlanRejection::DuplicateCourse {
                semester: "Fall".to_string(),
                course_id: "A".to_string(),
            }
        );
    }

    #[test]
    fn test_same_course_in_different_semesters_is_allowed() {
        let plan = draft(vec![
            Semester::new("Fall", vec![course("A", 3, &[])]),
            Semester::new("Spring", vec![course("A", 3, &[])]),
        ]);
        assert!(PlanValidator::default().validate(&plan).is_ok());
    }

    #[test]
    fn test_semester_credit_ceiling() {
        let at_limit = draft(vec![Semester::new(
            "Fall",
            vec![course("A", 6, &[]), course("B", 6, &[]), course("C", 6, &[])],
        )]);
        assert!(PlanValidator::default().validate(&at_limit).is_ok());

        let over = draft(vec![Semester::new(
            "Fall",
            vec![course("A", 6, &[]), course("B", 6, &[]), course("C", 7, &[])],
        )]);
        assert_eq!(
            PlanValidator::default().validate(&over).unwrap_err(),
            PlanRejection::SemesterCreditOverflow {
                semester: "Fall".to_string(),
                credits: 19,
                limit: 18,
            }
        );
    }

    #[test]
    fn test_total_credit_floor_from_config() {
        let validator = PlanValidator::new(ValidationConfig {
            min_total_credits: 12,
            ..ValidationConfig::default()
        });
        let plan = draft(vec![
            Semester::new("Fall", vec![course("A", 3, &[])]),
            Semester::new("Spring", vec![course("B", 3, &["A"])]),
        ]);

        assert_eq!(
            validator.validate(&plan).unwrap_err(),
            PlanRejection::InsufficientTotalCredits {
                total: 6,
                minimum: 12,
            }
        );
    }

    #[test]
    fn test_first_violation_wins() {
        // Duplicate course appears before the unmet prerequisite in the same semester
        let plan = draft(vec![Semester::new(
            "Fall",
            vec![course("A", 3, &[]), course("A", 3, &[]), course("B", 3, &["Z"])],
        )]);
        assert_eq!(
            kind(PlanValidator::default().validate(&plan)),
            ErrorKind::DuplicateCourse
        );
    }

    #[test]
    fn test_validation_is_repeatable() {
        let validator = PlanValidator::default();
        let good = draft(vec![Semester::new("Fall", vec![course("A", 3, &[])])]);
        let bad = draft(vec![Semester::new("Fall", vec![course("B", 3, &["A"])])]);

        assert_eq!(validator.validate(&good), validator.validate(&good));
        assert_eq!(validator.validate(&bad), validator.validate(&bad));
    }
}
