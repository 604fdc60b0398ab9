//! Course catalog commands

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use curricula_core::{
    check_met, resolve, CatalogSnapshot, Course, DependencyNode, Entity, Error, SearchField,
};
use serde::{Deserialize, Serialize};

use super::{read_document, Context};

/// Course catalog commands
#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Import courses from a JSON or TOML file
    Import {
        /// File with a top-level `courses` list
        file: PathBuf,
    },

    /// Add a course or replace an existing one
    Add(CourseFields),

    /// Delete a course; other courses keep their edges to it
    Delete { course_id: String },

    /// List courses
    List {
        /// Only courses tagged with this category
        #[arg(long)]
        category: Option<String>,

        /// Only core courses
        #[arg(long)]
        core: bool,

        /// Only courses at this level
        #[arg(long)]
        level: Option<u32>,
    },

    /// Show one course
    Show { course_id: String },

    /// Search courses by substring
    Search {
        query: String,

        /// all, title, description, department, course_id or category
        #[arg(short, long, default_value = "all")]
        field: SearchField,
    },

    /// Print the prerequisite tree of a course
    Deps { course_id: String },

    /// Check a course's direct prerequisites against completed courses
    CheckPrereqs {
        course_id: String,

        /// Completed course ids, comma separated
        #[arg(short, long, value_delimiter = ',')]
        completed: Vec<String>,
    },

    /// Report dangling prerequisite edges and cycles
    Verify,
}

/// One course given on the command line
#[derive(Args, Debug)]
pub struct CourseFields {
    course_id: String,

    #[arg(long)]
    title: String,

    #[arg(long)]
    credits: u32,

    /// Direct prerequisite ids, comma separated, in edge order
    #[arg(short, long, value_delimiter = ',')]
    prerequisites: Vec<String>,

    /// Category tags, comma separated
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,

    /// Counts toward core requirements
    #[arg(long)]
    core: bool,

    #[arg(long)]
    level: Option<u32>,

    #[arg(long)]
    department: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    instructor: Option<String>,
}

impl CourseFields {
    fn to_course(&self) -> Course {
        Course {
            course_id: self.course_id.clone(),
            title: self.title.clone(),
            credits: self.credits,
            prerequisites: self.prerequisites.clone(),
            categories: self.categories.clone(),
            is_core: self.core,
            level: self.level,
            description: self.description.clone(),
            department: self.department.clone(),
            instructor: self.instructor.clone(),
        }
    }
}

/// On-disk catalog import format
#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogFile {
    pub courses: Vec<Course>,
}

#[derive(Serialize)]
struct ImportSummary {
    imported: usize,
    catalog_size: i64,
}

#[derive(Serialize)]
struct Deleted {
    course_id: String,
    deleted: bool,
}

impl CatalogArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let db = ctx.database().await?;
        let repo = db.catalog();

        match &self.command {
            CatalogCommand::Import { file } => {
                let catalog: CatalogFile = read_document(file)?;
                let imported = repo.import(&catalog.courses).await?;
                let summary = ImportSummary {
                    imported,
                    catalog_size: repo.count().await?,
                };
                ctx.emit(&summary, |s| {
                    println!(
                        "Imported {} courses from {} ({} in catalog)",
                        s.imported,
                        file.display(),
                        s.catalog_size
                    );
                })
            }
            CatalogCommand::Add(fields) => {
                let course = fields.to_course();
                repo.upsert(&course).await?;
                ctx.emit(&course, |course| {
                    println!("Saved {} - {}", course.course_id, course.title);
                })
            }
            CatalogCommand::Delete { course_id } => {
                if !repo.delete(course_id).await? {
                    return Err(Error::not_found(Entity::Course, course_id).into());
                }
                ctx.emit(
                    &Deleted {
                        course_id: course_id.clone(),
                        deleted: true,
                    },
                    |d| println!("Deleted course {}", d.course_id),
                )
            }
            CatalogCommand::List {
                category,
                core,
                level,
            } => {
                let snapshot = repo.load_snapshot().await?;
                let courses: Vec<&Course> = snapshot
                    .courses()
                    .filter(|c| category.as_ref().map_or(true, |cat| c.categories.contains(cat)))
                    .filter(|c| !*core || c.is_core)
                    .filter(|c| level.map_or(true, |l| c.level == Some(l)))
                    .collect();
                ctx.emit(&courses, |courses| print_courses(courses))
            }
            CatalogCommand::Show { course_id } => {
                let course = repo
                    .get(course_id)
                    .await?
                    .ok_or_else(|| Error::not_found(Entity::Course, course_id))?;
                ctx.emit(&course, print_course)
            }
            CatalogCommand::Search { query, field } => {
                let snapshot = repo.load_snapshot().await?;
                let courses = snapshot.search(query, *field);
                ctx.emit(&courses, |courses| print_courses(courses))
            }
            CatalogCommand::Deps { course_id } => {
                let snapshot = repo.load_snapshot().await?;
                let tree = resolve(&snapshot, course_id)
                    .ok_or_else(|| Error::not_found(Entity::Course, course_id))?;
                ctx.emit(&tree, |tree| print_tree(tree, 0))
            }
            CatalogCommand::CheckPrereqs {
                course_id,
                completed,
            } => {
                let snapshot = repo.load_snapshot().await?;
                let completed: HashSet<String> = completed.iter().cloned().collect();
                let check = check_met(&snapshot, course_id, &completed);
                ctx.emit(&check, |check| {
                    if let Some(error) = &check.error {
                        println!("{}: {}", course_id, error);
                    } else if check.met {
                        println!("All prerequisites for {} are met", course_id);
                    } else {
                        println!("Missing prerequisites for {}:", course_id);
                        for missing in &check.missing {
                            match &missing.title {
                                Some(title) => println!("  {} - {}", missing.course_id, title),
                                None => println!("  {} (not in catalog)", missing.course_id),
                            }
                        }
                    }
                })
            }
            CatalogCommand::Verify => {
                let snapshot: CatalogSnapshot = repo.load_snapshot().await?;
                let report = snapshot.integrity_report();
                ctx.emit(&report, |report| {
                    if report.is_clean() {
                        println!("Catalog of {} courses is consistent", snapshot.len());
                        return;
                    }
                    for edge in &report.dangling {
                        println!(
                            "Dangling: {} requires unknown course {}",
                            edge.course_id, edge.prerequisite
                        );
                    }
                    for cycle in &report.cycles {
                        println!("Cycle: {}", cycle.join(" -> "));
                    }
                })
            }
        }
    }
}

fn print_courses(courses: &[&Course]) {
    if courses.is_empty() {
        println!("No courses found.");
        return;
    }
    for course in courses {
        let marker = if course.is_core { " [core]" } else { "" };
        println!(
            "{:<10} {:>2} cr  {}{}",
            course.course_id, course.credits, course.title, marker
        );
    }
}

fn print_course(course: &Course) {
    println!("{} - {}", course.course_id, course.title);
    println!("  Credits: {}", course.credits);
    println!("  Core: {}", if course.is_core { "yes" } else { "no" });
    if let Some(level) = course.level {
        println!("  Level: {}", level);
    }
    if let Some(department) = &course.department {
        println!("  Department: {}", department);
    }
    if let Some(instructor) = &course.instructor {
        println!("  Instructor: {}", instructor);
    }
    if !course.categories.is_empty() {
        println!("  Categories: {}", course.categories.join(", "));
    }
    if !course.prerequisites.is_empty() {
        println!("  Prerequisites: {}", course.prerequisites.join(", "));
    }
    if let Some(description) = &course.description {
        println!();
        println!("  {}", description);
    }
}

fn print_tree(node: &DependencyNode, indent: usize) {
    let label = match &node.title {
        Some(title) => format!("{} - {}", node.course_id, title),
        None => format!("{} (not in catalog)", node.course_id),
    };
    println!("{}{}", "  ".repeat(indent), label);
    for child in &node.prerequisites {
        print_tree(child, indent + 1);
    }
}
