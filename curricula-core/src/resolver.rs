//! Prerequisite dependency tree resolution
//!
//! Expands a course's prerequisites depth-first. Each branch carries its own
//! visited set, copied at every level, so a course reachable along two
//! independent paths appears under both while a true cycle stops as soon as
//! a branch reaches a course it already passed through.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;

/// A node in a resolved prerequisite tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    pub course_id: String,

    /// Course title, absent when the edge points at an unknown course
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub prerequisites: Vec<DependencyNode>,
}

impl DependencyNode {
    /// Depth of the tree, counting this node as 1
    pub fn depth(&self) -> usize {
        1 + self
            .prerequisites
            .iter()
            .map(DependencyNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Distinct course ids anywhere below this node, in first-seen order
    pub fn transitive_prerequisites(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_ids(&mut seen, &mut out);
        out
    }

    fn collect_ids<'a>(&'a self, seen: &mut HashSet<&'a str>, out: &mut Vec<&'a str>) {
        for child in &self.prerequisites {
            if seen.insert(child.course_id.as_str()) {
                out.push(child.course_id.as_str());
            }
            child.collect_ids(seen, out);
        }
    }
}

/// Resolve the prerequisite tree rooted at `course_id`
///
/// Returns `None` when the course does not exist. A course with no
/// prerequisites resolves to a node with an empty child list.
pub fn resolve(catalog: &impl Catalog, course_id: &str) -> Option<DependencyNode> {
    let course = catalog.get_course(course_id)?;
    let visited = HashSet::from([course_id.to_string()]);

    let tree = DependencyNode {
        course_id: course.course_id.clone(),
        title: Some(course.title.clone()),
        prerequisites: expand(catalog, course_id, &visited),
    };

    debug!(course_id, depth = tree.depth(), "Resolved prerequisite tree");
    Some(tree)
}

fn expand(catalog: &impl Catalog, course_id: &str, visited: &HashSet<String>) -> Vec<DependencyNode> {
    catalog
        .prerequisite_edges(course_id)
        .iter()
        .map(|prereq| {
            let Some(course) = catalog.get_course(prereq) else {
                warn!(course_id, prerequisite = %prereq, "Dangling prerequisite edge");
                return DependencyNode {
                    course_id: prereq.clone(),
                    title: None,
                    prerequisites: Vec::new(),
                };
            };

            let prerequisites = if visited.contains(prereq) {
                debug!(course_id, prerequisite = %prereq, "Prerequisite cycle, stopping branch");
                Vec::new()
            } else {
                let mut branch = visited.clone();
                branch.insert(prereq.clone());
                expand(catalog, prereq, &branch)
            };

            DependencyNode {
                course_id: course.course_id.clone(),
                title: Some(course.title.clone()),
                prerequisites,
            }
        })
        .collect()
}
