use clap::Subcommand;
use kudos_core::config::Config;

use crate::output;

#[derive(Subcommand)]
pub enum WorkspaceSubcommand {
    /// Create ledger entries for a roster (additive; never resets progress)
    Init {
        /// Workspace id (default: signed-in workspace)
        #[arg(long)]
        workspace: Option<String>,

        /// Comma-separated member ids
        #[arg(long, value_delimiter = ',')]
        members: Vec<String>,

        /// Fetch the roster from the tracker instead
        #[arg(long)]
        from_tracker: bool,
    },

    /// Delete a workspace's entire ledger subtree
    Reset {
        #[arg(long)]
        workspace: Option<String>,
    },

    /// Report givers whose spent honors don't match recorded credits
    Audit {
        #[arg(long)]
        workspace: Option<String>,
    },
}

pub fn run(config: &Config, subcommand: WorkspaceSubcommand, json: bool) -> anyhow::Result<()> {
    let ledger = crate::cmd::open_ledger(config)?;

    match subcommand {
        WorkspaceSubcommand::Init {
            workspace,
            members,
            from_tracker,
        } => {
            let workspace = crate::cmd::resolve_workspace(workspace.as_deref(), config)?;
            let roster = if from_tracker {
                crate::cmd::establish_session(config)?.roster_member_ids()
            } else {
                members
            };
            anyhow::ensure!(
                !roster.is_empty(),
                "no roster: pass --members or --from-tracker"
            );

            ledger.initialize_workspace(workspace, &roster)?;
            if json {
                output::print_json(&serde_json::json!({
                    "workspace": workspace,
                    "roster_size": roster.len(),
                }))?;
            } else {
                println!("initialized {} members in {workspace}", roster.len());
            }
        }

        WorkspaceSubcommand::Reset { workspace } => {
            let workspace = crate::cmd::resolve_workspace(workspace.as_deref(), config)?;
            ledger.reset_workspace(workspace)?;
            if json {
                output::print_json(&serde_json::json!({ "workspace": workspace, "reset": true }))?;
            } else {
                println!("reset {workspace}");
            }
        }

        WorkspaceSubcommand::Audit { workspace } => {
            let workspace = crate::cmd::resolve_workspace(workspace.as_deref(), config)?;
            let findings = ledger.audit_workspace(workspace)?;
            if json {
                output::print_json(&findings)?;
            } else if findings.is_empty() {
                println!("audit clean: every spent honor has a matching credit");
            } else {
                for f in &findings {
                    println!(
                        "{}: spent {} but {} credit(s) found",
                        f.member, f.honors_spent, f.credits_found
                    );
                }
            }
        }
    }
    Ok(())
}
