//! Course catalog
//!
//! Courses and their prerequisite edges. The edge set is a directed graph
//! that may contain cycles or point at courses that do not exist; both are
//! tolerated by every consumer in this crate.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A course record with its direct prerequisites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier (e.g. "CS101")
    pub course_id: String,

    pub title: String,

    /// Credit hours, always positive
    pub credits: u32,

    /// Direct prerequisite course identifiers, in edge order
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// Category tags
    #[serde(default)]
    pub categories: Vec<String>,

    /// Whether the course counts toward core requirements
    #[serde(default)]
    pub is_core: bool,

    #[serde(default)]
    pub level: Option<u32>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub department: Option<String>,

    #[serde(default)]
    pub instructor: Option<String>,
}

impl Course {
    /// Create a course with no prerequisites
    pub fn new(course_id: impl Into<String>, title: impl Into<String>, credits: u32) -> Self {
        Self {
            course_id: course_id.into(),
            title: title.into(),
            credits,
            prerequisites: Vec::new(),
            categories: Vec::new(),
            is_core: false,
            level: None,
            description: None,
            department: None,
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

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn core(mut self) -> Self {
        self.is_core = true;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    /// Check the record is storable: non-empty id and positive credits
    pub fn check(&self) -> Result<()> {
        if self.course_id.trim().is_empty() {
            return Err(Error::Store("course id must not be empty".to_string()));
        }
        if self.credits == 0 {
            return Err(Error::Store(format!(
                "course '{}' must have a positive credit count",
                self.course_id
            )));
        }
        Ok(())
    }
}

/// Read access to course records and prerequisite edges
pub trait Catalog {
    /// Look up a course by identifier
    fn get_course(&self, course_id: &str) -> Option<&Course>;

    /// Direct prerequisite identifiers of a course, in edge order
    ///
    /// Unknown courses have no edges. Returned ids may be dangling.
    fn prerequisite_edges(&self, course_id: &str) -> &[String] {
        self.get_course(course_id)
            .map(|c| c.prerequisites.as_slice())
            .unwrap_or(&[])
    }
}

/// Field a catalog search matches against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    #[default]
    All,
    Title,
    Description,
    Department,
    CourseId,
    Category,
}

impl FromStr for SearchField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(SearchField::All),
            "title" => Ok(SearchField::Title),
            "description" => Ok(SearchField::Description),
            "department" => Ok(SearchField::Department),
            "course_id" | "id" => Ok(SearchField::CourseId),
            "category" => Ok(SearchField::Category),
            other => Err(Error::Config(format!("unknown search field: {}", other))),
        }
    }
}

/// A prerequisite edge pointing at a course the catalog does not hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingEdge {
    pub course_id: String,
    pub prerequisite: String,
}

/// Structural problems in the prerequisite graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub dangling: Vec<DanglingEdge>,
    pub cycles: Vec<Vec<String>>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.cycles.is_empty()
    }
}

/// An in-memory catalog loaded once per operation
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    courses: BTreeMap<String, Course>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        let mut snapshot = Self::new();
        for course in courses {
            snapshot.insert(course);
        }
        snapshot
    }

    /// Add or replace a course
    pub fn insert(&mut self, course: Course) -> Option<Course> {
        self.courses.insert(course.course_id.clone(), course)
    }

    pub fn remove(&mut self, course_id: &str) -> Option<Course> {
        self.courses.remove(course_id)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// All courses ordered by identifier
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    /// Case-insensitive substring search
    pub fn search(&self, query: &str, field: SearchField) -> Vec<&Course> {
        let needle = query.to_lowercase();
        let contains = |value: &str| value.to_lowercase().contains(&needle);
        let contains_opt = |value: &Option<String>| value.as_deref().is_some_and(contains);

        self.courses
            .values()
            .filter(|c| match field {
                SearchField::All => {
                    contains(&c.title)
                        || contains(&c.course_id)
                        || contains_opt(&c.description)
                        || contains_opt(&c.department)
                }
                SearchField::Title => contains(&c.title),
                SearchField::Description => contains_opt(&c.description),
                SearchField::Department => contains_opt(&c.department),
                SearchField::CourseId => contains(&c.course_id),
                SearchField::Category => c.categories.iter().any(|cat| contains(cat)),
            })
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&Course> {
        self.courses
            .values()
            .filter(|c| c.categories.iter().any(|cat| cat == category))
            .collect()
    }

    pub fn core_courses(&self) -> Vec<&Course> {
        self.courses.values().filter(|c| c.is_core).collect()
    }

    pub fn by_level(&self, level: u32) -> Vec<&Course> {
        self.courses
            .values()
            .filter(|c| c.level == Some(level))
            .collect()
    }

    /// Edges whose target is not in the catalog
    pub fn dangling_prerequisites(&self) -> Vec<DanglingEdge> {
        self.courses
            .values()
            .flat_map(|c| {
                c.prerequisites
                    .iter()
                    .filter(|p| !self.courses.contains_key(p.as_str()))
                    .map(|p| DanglingEdge {
                        course_id: c.course_id.clone(),
                        prerequisite: p.clone(),
                    })
            })
            .collect()
    }

    /// Find prerequisite cycles
    ///
    /// Each returned cycle lists the courses along the loop starting from
    /// the first one reached. A course belongs to at most one reported cycle.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();

        for course_id in self.courses.keys() {
            if !visited.contains(course_id.as_str()) {
                let mut path = Vec::new();
                if let Some(cycle) =
                    self.dfs_cycle(course_id, &mut visited, &mut on_stack, &mut path)
                {
                    cycles.push(cycle);
                }
            }
        }

        cycles
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(node);

        for dep in self.prerequisite_edges(node) {
            let dep = dep.as_str();
            if !self.courses.contains_key(dep) {
                continue;
            }
            if !visited.contains(dep) {
                if let Some(cycle) = self.dfs_cycle(dep, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack.contains(dep) {
                if let Some(start) = path.iter().position(|&n| n == dep) {
                    return Some(path[start..].iter().map(|s| s.to_string()).collect());
                }
            }
        }

        path.pop();
        on_stack.remove(node);
        None
    }

    pub fn integrity_report(&self) -> IntegrityReport {
        IntegrityReport {
            dangling: self.dangling_prerequisites(),
            cycles: self.find_cycles(),
        }
    }
}

impl Catalog for CatalogSnapshot {
    fn get_course(&self, course_id: &str) -> Option<&Course> {
        self.courses.get(course_id)
    }
}

impl FromIterator<Course> for CatalogSnapshot {
    fn from_iter<T: IntoIterator<Item = Course>>(iter: T) -> Self {
        Self::from_courses(iter)
    }
}
