use clap::Subcommand;
use kudos_core::config::Config;

use crate::output;

#[derive(Subcommand)]
pub enum ReportSubcommand {
    /// Workspace story points: completed vs total, with health zone
    Progress,

    /// Completed stories, most recent first
    BattleLog,

    /// Current sprint window and remaining days
    Sprint,

    /// Top members by completed story points
    Warriors {
        #[arg(long, default_value = "3")]
        top: usize,
    },

    /// Signed-in member's display profile
    Profile,
}

pub fn run(config: &Config, subcommand: ReportSubcommand, json: bool) -> anyhow::Result<()> {
    let session = crate::cmd::establish_session(config)?;

    match subcommand {
        ReportSubcommand::Progress => {
            let progress = session.progress();
            if json {
                output::print_json(&serde_json::json!({
                    "completed": progress.completed,
                    "total": progress.total,
                    "remaining": progress.remaining(),
                    "health": progress.health_color(),
                }))?;
            } else {
                println!(
                    "{} / {} points remaining ({:?})",
                    progress.remaining(),
                    progress.total,
                    progress.health_color()
                );
            }
        }

        ReportSubcommand::BattleLog => {
            let log = session.battle_log();
            if json {
                output::print_json(&log)?;
            } else {
                for story in log {
                    let owners: Vec<&str> = story
                        .owner_ids
                        .iter()
                        .map(|id| session.member_name(id).unwrap_or("unknown"))
                        .collect();
                    let owners = if owners.is_empty() {
                        "unassigned".to_string()
                    } else {
                        owners.join(", ")
                    };
                    println!(
                        "{owners} completed {} dealing {} DMG",
                        story.name,
                        story.points()
                    );
                }
            }
        }

        ReportSubcommand::Sprint => {
            let timeline = session.sprint_timeline()?;
            if json {
                output::print_json(&timeline)?;
            } else {
                println!(
                    "sprint {} -> {}: {} day(s) remaining",
                    timeline.start, timeline.end, timeline.remaining_days
                );
            }
        }

        ReportSubcommand::Warriors { top } => {
            let warriors = session.top_warriors(top);
            if json {
                output::print_json(&warriors)?;
            } else {
                let rows: Vec<(String, String)> = warriors
                    .iter()
                    .map(|w| (w.name.clone(), format!("{} DMG", w.points)))
                    .collect();
                output::print_rows(&rows);
            }
        }

        ReportSubcommand::Profile => {
            let profile = session.member_profile()?;
            if json {
                output::print_json(&profile)?;
            } else {
                println!("{} @ {}", profile.name, profile.workspace);
                println!("{}", profile.icon);
            }
        }
    }
    Ok(())
}
