//! Program requirement fulfillment
//!
//! A requirement sets per-program minimums. Unlike plan validation this is a
//! read-side report: every metric is evaluated and sorted into fulfilled or
//! unfulfilled, nothing is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::plan::PlannedCourse;

/// Minimums a program's plans should reach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub program: String,
    pub total_hours: u32,
    pub num_core_courses: u32,
    pub num_elective_courses: u32,
}

/// What a requirement line measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementMetric {
    TotalHours,
    CoreCourses,
    ElectiveCourses,
}

impl RequirementMetric {
    pub fn label(&self) -> &'static str {
        match self {
            RequirementMetric::TotalHours => "Total hours",
            RequirementMetric::CoreCourses => "Core courses",
            RequirementMetric::ElectiveCourses => "Elective courses",
        }
    }
}

/// One evaluated requirement line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementCheck {
    pub metric: RequirementMetric,
    pub actual: u32,
    pub required: u32,
}

impl RequirementCheck {
    pub fn is_met(&self) -> bool {
        self.actual >= self.required
    }
}

impl fmt::Display for RequirementCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (required: {})",
            self.metric.label(),
            self.actual,
            self.required
        )
    }
}

/// Requirement checks split by outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentReport {
    pub fulfilled: Vec<RequirementCheck>,
    pub unfulfilled: Vec<RequirementCheck>,
}

impl FulfillmentReport {
    pub fn is_fulfilled(&self) -> bool {
        self.unfulfilled.is_empty()
    }
}

/// Evaluate planned courses against a requirement
///
/// Courses not flagged core count as electives.
pub fn check_fulfillment<'a>(
    courses: impl IntoIterator<Item = &'a PlannedCourse>,
    requirement: &Requirement,
) -> FulfillmentReport {
    let mut total_hours = 0u32;
    let mut core = 0u32;
    let mut elective = 0u32;

    for course in courses {
        total_hours = total_hours.saturating_add(course.credits);
        if course.is_core {
            core += 1;
        } else {
            elective += 1;
        }
    }

    let checks = [
        RequirementCheck {
            metric: RequirementMetric::TotalHours,
            actual: total_hours,
            required: requirement.total_hours,
        },
        RequirementCheck {
            metric: RequirementMetric::CoreCourses,
            actual: core,
            required: requirement.num_core_courses,
        },
        RequirementCheck {
            metric: RequirementMetric::ElectiveCourses,
            actual: elective,
            required: requirement.num_elective_courses,
        },
    ];

    let (fulfilled, unfulfilled): (Vec<_>, Vec<_>) =
        checks.into_iter().partition(RequirementCheck::is_met);
    FulfillmentReport {
        fulfilled,
        unfulfilled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement() -> Requirement {
        Requirement {
            program: "Computer Science".to_string(),
            total_hours: 9,
            num_core_courses: 2,
            num_elective_courses: 1,
        }
    }

    #[test]
    fn test_all_fulfilled() {
        let courses = [
            PlannedCourse::new("CS101", 3).core(),
            PlannedCourse::new("CS201", 3).core(),
            PlannedCourse::new("ART100", 3),
        ];
        let report = check_fulfillment(&courses, &requirement());
        assert!(report.is_fulfilled());
        assert_eq!(report.fulfilled.len(), 3);
    }

    #[test]
    fn test_partial_breakdown() {
        let courses = [PlannedCourse::new("CS101", 3).core(), PlannedCourse::new("ART100", 4)];
        let report = check_fulfillment(&courses, &requirement());

        assert!(!report.is_fulfilled());
        assert_eq!(report.fulfilled.len(), 1);
        assert_eq!(report.fulfilled[0].metric, RequirementMetric::ElectiveCourses);
        assert_eq!(
            report
                .unfulfilled
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["Total hours: 7 (required: 9)", "Core courses: 1 (required: 2)"]
        );
    }
}
