//! Program requirement commands

use clap::{Args, Subcommand};
use curricula_core::{Error, Requirement, RequirementStore};

use super::Context;

/// Program requirement commands
#[derive(Args, Debug)]
pub struct RequirementArgs {
    #[command(subcommand)]
    pub command: RequirementCommand,
}

#[derive(Subcommand, Debug)]
pub enum RequirementCommand {
    /// Define or replace a program's requirement
    Set {
        #[arg(long)]
        program: String,

        /// Minimum credit hours
        #[arg(long)]
        total_hours: u32,

        /// Minimum number of core courses
        #[arg(long)]
        core: u32,

        /// Minimum number of elective courses
        #[arg(long)]
        electives: u32,
    },

    /// Show a program's requirement
    Show { program: String },

    /// List every defined requirement
    List,
}

impl RequirementArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let store = ctx.database().await?.store();

        let requirement = match &self.command {
            RequirementCommand::Set {
                program,
                total_hours,
                core,
                electives,
            } => {
                store
                    .put_requirement(Requirement {
                        program: program.clone(),
                        total_hours: *total_hours,
                        num_core_courses: *core,
                        num_elective_courses: *electives,
                    })
                    .await?
            }
            RequirementCommand::Show { program } => store
                .get_requirement(program)
                .await?
                .ok_or_else(|| Error::MissingRequirementDefinition(program.clone()))?,
            RequirementCommand::List => {
                let requirements = store.list_requirements().await?;
                return ctx.emit(&requirements, |requirements| {
                    if requirements.is_empty() {
                        println!("No requirements defined.");
                    }
                    for requirement in requirements {
                        print_requirement(requirement);
                    }
                });
            }
        };

        ctx.emit(&requirement, print_requirement)
    }
}

fn print_requirement(requirement: &Requirement) {
    println!("{}", requirement.program);
    println!("  Total hours: {}", requirement.total_hours);
    println!("  Core courses: {}", requirement.num_core_courses);
    println!("  Elective courses: {}", requirement.num_elective_courses);
}
