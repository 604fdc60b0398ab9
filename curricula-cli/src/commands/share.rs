//! Plan share link commands

use std::time::Duration;

use chrono::Utc;
use clap::{Args, Subcommand};
use curricula_core::{AccessLevel, PlanShare, ShareService};

use super::Context;

/// Plan share link commands
#[derive(Args, Debug)]
pub struct ShareArgs {
    #[command(subcommand)]
    pub command: ShareCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShareCommand {
    /// Create a share link for a plan
    Create {
        plan_id: i64,

        /// VIEW or EDIT
        #[arg(short, long, default_value = "VIEW")]
        access: AccessLevel,

        /// Link lifetime, e.g. "7days" or "12h"
        #[arg(short, long, value_parser = parse_duration)]
        expires_in: Option<Duration>,
    },

    /// Open a plan through a share token
    Open { token: String },

    /// List the share links issued for a plan
    List { plan_id: i64 },
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(s).map_err(|e| e.to_string())
}

impl ShareArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let store = ctx.database().await?.store();
        let service = ShareService::new(store, ctx.config.sharing.default_expiration);

        match &self.command {
            ShareCommand::Create {
                plan_id,
                access,
                expires_in,
            } => {
                let share = service.create_share(*plan_id, *access, *expires_in).await?;
                ctx.emit(&share, print_share)
            }
            ShareCommand::Open { token } => {
                let shared = service.open_share(token, Utc::now()).await?;
                ctx.emit(&shared, |shared| {
                    println!(
                        "Plan {} shared with {} access",
                        shared.plan.id, shared.access_level
                    );
                    println!(
                        "  Student {}, {} version {} ({}), {} credits",
                        shared.plan.student_id,
                        shared.plan.program,
                        shared.plan.version,
                        shared.plan.status,
                        shared.plan.total_credits()
                    );
                })
            }
            ShareCommand::List { plan_id } => {
                let shares = service.list_shares(*plan_id).await?;
                ctx.emit(&shares, |shares| {
                    if shares.is_empty() {
                        println!("No share links for plan {}.", plan_id);
                    }
                    for share in shares {
                        print_share(share);
                    }
                })
            }
        }
    }
}

fn print_share(share: &PlanShare) {
    println!("Share token: {}", share.token);
    println!("  Plan: {}", share.plan_id);
    println!("  Access: {}", share.access_level);
    match share.expires_at {
        Some(at) => println!("  Expires: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Expires: never"),
    }
}
