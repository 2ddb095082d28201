use clap::Subcommand;
use kudos_core::config::Config;

use crate::output;

#[derive(Subcommand)]
pub enum HonorSubcommand {
    /// Grant one honor to a member
    Grant {
        /// Recipient member id
        recipient: String,

        /// Giver member id (default: signed-in member)
        #[arg(long)]
        giver: Option<String>,

        #[arg(long)]
        workspace: Option<String>,
    },

    /// Leaderboard of honors received
    Board {
        #[arg(long)]
        workspace: Option<String>,
    },

    /// One member's ledger entry
    Show {
        member: String,

        #[arg(long)]
        workspace: Option<String>,
    },
}

pub fn run(config: &Config, subcommand: HonorSubcommand, json: bool) -> anyhow::Result<()> {
    let ledger = crate::cmd::open_ledger(config)?;

    match subcommand {
        HonorSubcommand::Grant {
            recipient,
            giver,
            workspace,
        } => {
            let workspace = crate::cmd::resolve_workspace(workspace.as_deref(), config)?;
            let giver = match giver.as_deref() {
                Some(g) => g,
                None => config.member_id()?,
            };
            anyhow::ensure!(giver != recipient, "members cannot honor themselves");

            let outcome = ledger.grant_honor(giver, &recipient, workspace)?;
            if json {
                output::print_json(&serde_json::json!({ "outcome": outcome }))?;
            } else {
                // No-op outcomes read the same as effective grants; the
                // ledger treats them all as success.
                println!("honor recorded for {recipient}");
            }
        }

        HonorSubcommand::Board { workspace } => {
            let workspace = crate::cmd::resolve_workspace(workspace.as_deref(), config)?;
            let board = ledger.leaderboard(workspace)?;
            if json {
                output::print_json(&board)?;
            } else {
                let rows: Vec<(String, String)> = board
                    .iter()
                    .map(|row| (row.member.clone(), row.honors_received.to_string()))
                    .collect();
                output::print_rows(&rows);
            }
        }

        HonorSubcommand::Show { member, workspace } => {
            let workspace = crate::cmd::resolve_workspace(workspace.as_deref(), config)?;
            let entry = ledger.entry(workspace, &member)?;
            if json {
                output::print_json(&serde_json::json!({
                    "memberId": member,
                    "honorsRemaining": entry.honors_remaining,
                    "honoredBy": entry.honored_by,
                }))?;
            } else {
                println!("{member}: {} honor(s) left to give", entry.honors_remaining);
                let givers = entry.honored_by.givers();
                if givers.is_empty() {
                    println!("never honored");
                } else {
                    println!("honored by {}", givers.join(", "));
                }
            }
        }
    }
    Ok(())
}
