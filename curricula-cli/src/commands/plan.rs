//! Academic plan commands

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use curricula_core::{PlanComparison, PlanDraft, PlanInput, PlanRecord};
use curricula_db::Database;
use serde::Serialize;

use super::{read_document, Context};

/// Academic plan commands
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(subcommand)]
    pub command: PlanCommand,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Validate and store a new plan from a TOML or JSON file
    Create { file: PathBuf },

    /// Show a plan version
    Show { plan_id: i64 },

    /// List stored plans
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Store new content as the next version of a plan
    Update { plan_id: i64, file: PathBuf },

    /// Delete a plan version
    Delete { plan_id: i64 },

    /// Approve a pending plan
    Approve { plan_id: i64 },

    /// Reject a pending plan
    Reject { plan_id: i64 },

    /// Compare plans and report what they do not share
    Compare {
        #[arg(required = true, num_args = 1..)]
        plan_ids: Vec<i64>,
    },

    /// Copy an old version into a new one
    Restore {
        #[arg(long)]
        student: i64,

        #[arg(long)]
        program: String,

        #[arg(long)]
        version: u32,
    },

    /// List versions for a student and program, newest first
    Versions {
        #[arg(long)]
        student: i64,

        #[arg(long)]
        program: String,
    },

    /// Report requirement fulfillment for a plan
    Requirements { plan_id: i64 },
}

#[derive(Serialize)]
struct Deleted {
    plan_id: i64,
    deleted: bool,
}

impl PlanArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let manager = ctx.plans().await?;

        match &self.command {
            PlanCommand::Create { file } => {
                let draft = load_draft(manager.store().database(), file).await?;
                let plan = manager.create(draft).await?;
                ctx.emit(&plan, |plan| {
                    println!(
                        "Created plan {} (version {}) for student {}",
                        plan.id, plan.version, plan.student_id
                    );
                })
            }
            PlanCommand::Show { plan_id } => {
                let plan = manager.get(*plan_id).await?;
                ctx.emit(&plan, print_plan)
            }
            PlanCommand::List { offset, limit } => {
                let plans = manager.list(*offset, *limit).await?;
                ctx.emit(&plans, |plans| print_plan_rows(plans))
            }
            PlanCommand::Update { plan_id, file } => {
                let draft = load_draft(manager.store().database(), file).await?;
                let plan = manager.update(*plan_id, draft).await?;
                ctx.emit(&plan, |plan| {
                    println!(
                        "Stored plan {} as version {} (from plan {})",
                        plan.id, plan.version, plan_id
                    );
                })
            }
            PlanCommand::Delete { plan_id } => {
                manager.delete(*plan_id).await?;
                ctx.emit(
                    &Deleted {
                        plan_id: *plan_id,
                        deleted: true,
                    },
                    |d| println!("Deleted plan {}", d.plan_id),
                )
            }
            PlanCommand::Approve { plan_id } => {
                let plan = manager.approve(*plan_id).await?;
                ctx.emit(&plan, |plan| println!("Plan {} is {}", plan.id, plan.status))
            }
            PlanCommand::Reject { plan_id } => {
                let plan = manager.reject(*plan_id).await?;
                ctx.emit(&plan, |plan| println!("Plan {} is {}", plan.id, plan.status))
            }
            PlanCommand::Compare { plan_ids } => {
                let comparison = manager.compare(plan_ids).await?;
                ctx.emit(&comparison, print_comparison)
            }
            PlanCommand::Restore {
                student,
                program,
                version,
            } => {
                let plan = manager.restore(*student, program, *version).await?;
                ctx.emit(&plan, |plan| {
                    println!(
                        "Restored version {} as plan {} (version {})",
                        version, plan.id, plan.version
                    );
                })
            }
            PlanCommand::Versions { student, program } => {
                let versions = manager.list_versions(*student, program).await?;
                ctx.emit(&versions, |plans| print_plan_rows(plans))
            }
            PlanCommand::Requirements { plan_id } => {
                let report = manager.requirements_fulfillment(*plan_id).await?;
                ctx.emit(&report, |report| {
                    for check in &report.fulfilled {
                        println!("  [x] {}", check);
                    }
                    for check in &report.unfulfilled {
                        println!("  [ ] {}", check);
                    }
                })
            }
        }
    }
}

/// Read a plan file and resolve its course ids against the catalog
async fn load_draft(db: &Database, file: &Path) -> anyhow::Result<PlanDraft> {
    let input: PlanInput = read_document(file)?;
    let catalog = db.catalog().load_snapshot().await?;
    Ok(input.resolve(&catalog)?)
}

fn print_plan_rows(plans: &[PlanRecord]) {
    if plans.is_empty() {
        println!("No plans found.");
        return;
    }
    println!(
        "{:>6}  {:>8}  {:<24} {:>7}  {:<9} {:>7}",
        "ID", "STUDENT", "PROGRAM", "VERSION", "STATUS", "CREDITS"
    );
    for plan in plans {
        println!(
            "{:>6}  {:>8}  {:<24} {:>7}  {:<9} {:>7}",
            plan.id,
            plan.student_id,
            plan.program,
            plan.version,
            plan.status,
            plan.total_credits()
        );
    }
}

fn print_plan(plan: &PlanRecord) {
    println!(
        "Plan {} - student {}, {} (version {}, {})",
        plan.id, plan.student_id, plan.program, plan.version, plan.status
    );
    if let Some(university) = &plan.university {
        println!("University: {}", university);
    }
    if let Some(department) = &plan.department {
        println!("Department: {}", department);
    }
    println!("Created: {}", plan.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!();

    for semester in &plan.semesters {
        println!("{} ({} credits)", semester.name, semester.credits());
        for course in &semester.courses {
            match &course.instructor {
                Some(instructor) => println!(
                    "  {:<10} {:>2} cr  {} ({})",
                    course.course_id, course.credits, course.title, instructor
                ),
                None => println!("  {:<10} {:>2} cr  {}", course.course_id, course.credits, course.title),
            }
        }
    }
    println!();
    println!("Total credits: {}", plan.total_credits());
}

fn print_comparison(comparison: &PlanComparison) {
    for plan in &comparison.plans {
        println!(
            "Plan {}: {} v{} ({}), {} credits, {} semesters",
            plan.id,
            plan.program,
            plan.version,
            plan.status,
            plan.total_credits,
            plan.semesters.len()
        );
    }

    let differences = &comparison.differences;
    if differences.is_empty() {
        println!("No differences.");
        return;
    }
    if !differences.total_credits.is_empty() {
        let totals: Vec<String> = differences
            .total_credits
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Total credits differ: {}", totals.join(", "));
    }
    if !differences.semesters.is_empty() {
        let names: Vec<&str> = differences.semesters.iter().map(String::as_str).collect();
        println!("Semesters not in every plan: {}", names.join(", "));
    }
    if !differences.courses.is_empty() {
        let ids: Vec<&str> = differences.courses.iter().map(String::as_str).collect();
        println!("Courses not in every plan: {}", ids.join(", "));
    }
}
