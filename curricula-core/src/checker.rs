//! Direct prerequisite checks against a learner's completed courses

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// A prerequisite the learner has not completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingPrerequisite {
    pub course_id: String,

    /// Absent when the prerequisite is not in the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Why a prerequisite check could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckError {
    CourseNotFound,
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckError::CourseNotFound => write!(f, "Course not found"),
        }
    }
}

/// Outcome of a prerequisite check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteCheck {
    pub met: bool,
    pub missing: Vec<MissingPrerequisite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CheckError>,
}

impl PrerequisiteCheck {
    fn not_found() -> Self {
        Self {
            met: false,
            missing: Vec::new(),
            error: Some(CheckError::CourseNotFound),
        }
    }

    /// True when the course existed and was evaluated
    pub fn is_evaluated(&self) -> bool {
        self.error.is_none()
    }
}

/// Check whether `completed` covers every direct prerequisite of a course
///
/// Only immediate edges are checked; prerequisites of prerequisites are the
/// concern of the dependency resolver.
pub fn check_met(
    catalog: &impl Catalog,
    course_id: &str,
    completed: &HashSet<String>,
) -> PrerequisiteCheck {
    if catalog.get_course(course_id).is_none() {
        return PrerequisiteCheck::not_found();
    }

    let missing: Vec<MissingPrerequisite> = catalog
        .prerequisite_edges(course_id)
        .iter()
        .filter(|prereq| !completed.contains(prereq.as_str()))
        .map(|prereq| MissingPrerequisite {
            course_id: prereq.clone(),
            title: catalog.get_course(prereq).map(|c| c.title.clone()),
        })
        .collect();

    PrerequisiteCheck {
        met: missing.is_empty(),
        missing,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSnapshot, Course};

    fn completed(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::from_courses([
            Course::new("CS101", "Intro to Programming", 3),
            Course::new("MATH150", "Discrete Mathematics", 4),
            Course::new("CS201", "Data Structures", 3).with_prerequisites(["CS101"]),
            Course::new("CS301", "Algorithms", 3).with_prerequisites(["CS201", "MATH150"]),
        ])
    }

    #[test]
    fn test_no_prerequisites_always_met() {
        let catalog = catalog();
        for set in [completed(&[]), completed(&["CS201", "X"])] {
            let result = check_met(&catalog, "CS101", &set);
            assert!(result.met);
            assert!(result.missing.is_empty());
            assert!(result.is_evaluated());
        }
    }

    #[test]
    fn test_met_when_direct_prerequisites_completed() {
        let result = check_met(&catalog(), "CS201", &completed(&["CS101"]));
        assert!(result.met);
    }

    #[test]
    fn test_missing_listed_in_edge_order_with_titles() {
        let result = check_met(&catalog(), "CS301", &completed(&[]));
        assert!(!result.met);
        assert_eq!(
            result.missing,
            vec![
                MissingPrerequisite {
                    course_id: "CS201".to_string(),
                    title: Some("Data Structures".to_string()),
                },
                MissingPrerequisite {
                    course_id: "MATH150".to_string(),
                    title: Some("Discrete Mathematics".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_check_is_not_transitive() {
        // CS101 is a prerequisite of CS201 but not a direct one of CS301
        let result = check_met(&catalog(), "CS301", &completed(&["CS201", "MATH150"]));
        assert!(result.met);
    }

    #[test]
    fn test_unknown_course_is_an_error_not_a_miss() {
        let result = check_met(&catalog(), "NOPE", &completed(&[]));
        assert!(!result.met);
        assert!(result.missing.is_empty());
        assert_eq!(result.error, Some(CheckError::CourseNotFound));
    }

    #[test]
    fn test_dangling_prerequisite_reported_without_title() {
        let catalog = CatalogSnapshot::from_courses([
            Course::new("CS201", "Data Structures", 3).with_prerequisites(["GHOST"]),
        ]);
        let result = check_met(&catalog, "CS201", &completed(&[]));
        assert!(!result.met);
        assert_eq!(result.missing[0].course_id, "GHOST");
        assert!(result.missing[0].title.is_none());
    }
}
