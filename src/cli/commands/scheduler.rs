use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::config::config;
use crate::scheduler::{Rule, SchedulerEngine};

#[derive(Subcommand)]
pub enum SchedulerCommands {
    #[command(about = "Evaluate one rule now and deliver its notifications")]
    Run {
        #[arg(help = "overdue-monitoring, quarterly-reminder or risk-alerts")]
        rule: Rule,
    },

    #[command(about = "Show upcoming fire times for every rule")]
    Next {
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
}

pub async fn handle(cmd: SchedulerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let engine = SchedulerEngine::with_postgres(&config().scheduler)?;

    match cmd {
        SchedulerCommands::Run { rule } => {
            let report = engine.scheduler().run(rule).await?;
            output_format.emit(&report, |report| {
                println!("Rule {} evaluated at {}", report.rule, report.evaluated_at);
                for fanout in &report.fanouts {
                    println!(
                        "  {:?}: candidates={} recipients={} delivered={} failed={}",
                        fanout.alert,
                        fanout.candidates.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
                        fanout.recipients,
                        fanout.delivered,
                        fanout.failed
                    );
                }
            })?;
        }
        SchedulerCommands::Next { count } => {
            let now = Utc::now().with_timezone(&engine.offset());
            let upcoming: Vec<_> = Rule::ALL
                .into_iter()
                .filter_map(|rule| engine.schedule(rule).map(|cron| (rule, cron)))
                .map(|(rule, cron)| json!({"rule": rule, "cron": cron.expression(), "next": cron.upcoming(&now, count)}))
                .collect();
            output_format.emit(&upcoming, |rows| {
                for row in rows {
                    println!("{} ({})", row["rule"].as_str().unwrap_or_default(), row["cron"].as_str().unwrap_or_default());
                    if let Some(times) = row["next"].as_array() {
                        for time in times {
                            println!("  {}", time.as_str().unwrap_or_default());
                        }
                    }
                }
            })?;
        }
    }

    crate::database::DatabaseManager::close().await;
    Ok(())
}
