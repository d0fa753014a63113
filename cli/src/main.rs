//! TNM similarity CLI — runs the federated analysis from a terminal
//!
//! Drives the same `AnalysisSession` as the dashboard: submit, poll until
//! the task completes, match a stage and print its survival curve.

use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tnm_dashboard::staging::Axis;
use tnm_dashboard::{
    AnalysisSession, DashboardConfig, HttpTaskService, MatchOutcome, StageSelection,
    StagingScheme,
};

#[derive(Parser)]
#[command(name = "tnm-dashboard-cli", version, about = "TNM patient similarity CLI")]
struct Cli {
    /// Configuration file (YAML)
    #[arg(long, default_value = "dashboard.yaml", global = true, env = "TNM_CONFIG")]
    config: PathBuf,

    #[arg(long, global = true, env = "TNM_USERNAME")]
    username: Option<String>,

    #[arg(long, global = true, env = "TNM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// List the staging scheme categories
    Stages,
    /// Submit the analysis, wait for it and show the matched survival curve
    Run {
        #[arg(long)]
        t: String,
        #[arg(long)]
        n: String,
        #[arg(long)]
        m: String,

        /// Seconds between status checks
        #[arg(long, default_value_t = 10)]
        interval: u64,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 600)]
        max_wait: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let result = match load(&cli) {
        Ok((config, staging)) => match &cli.command {
            Commands::Stages => run_stages(&staging, &cli.format),
            Commands::Run { t, n, m, interval, max_wait } => {
                let selection = StageSelection::new(t.as_str(), n.as_str(), m.as_str());
                run_analysis(
                    config,
                    staging,
                    &selection,
                    Duration::from_secs(*interval),
                    Duration::from_secs(*max_wait),
                    &cli.format,
                )
                .await
            }
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(cli: &Cli) -> Result<(DashboardConfig, StagingScheme), Box<dyn std::error::Error>> {
    let mut config = DashboardConfig::load_or_default(&cli.config)?;
    if let Some(username) = &cli.username {
        config.remote.username = username.clone();
    }
    if let Some(password) = &cli.password {
        config.remote.password = password.clone();
    }
    let staging = StagingScheme::load(&config.staging_path)?;
    Ok((config, staging))
}

fn run_stages(
    staging: &StagingScheme,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&staging.options())?);
        }
        OutputFormat::Csv => {
            println!("axis,ordinal,label");
            for axis in Axis::ALL {
                for (ordinal, label) in staging.axis(axis).labels().enumerate() {
                    println!("{},{},{}", axis, ordinal, label);
                }
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Axis", "Categories (ordinal order)"]);
            for axis in Axis::ALL {
                let labels: Vec<&str> = staging.axis(axis).labels().collect();
                table.add_row(vec![axis.to_string(), labels.join(", ")]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}

async fn run_analysis(
    config: DashboardConfig,
    staging: StagingScheme,
    selection: &StageSelection,
    interval: Duration,
    max_wait: Duration,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    // Fail on a bad stage before bothering the remote service
    staging.encode(selection)?;

    let service = HttpTaskService::new(&config.remote)?;
    let mut session = AnalysisSession::new(service, Arc::new(staging), config.analysis.clone())
        .with_timeout(config.remote.timeout());

    let receipt = session.submit().await?;
    eprintln!("Task {} created, waiting for results...", receipt.task_id);

    let outcome = session.poll_until_complete(interval, max_wait).await?;
    eprintln!(
        "Analysis completed in {} minutes ({} clusters)",
        outcome.duration_minutes, outcome.clusters
    );

    let matched = session.match_stage(selection)?;
    print_match(&matched, format)
}

fn print_match(
    matched: &MatchOutcome,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&matched.chart())?);
        }
        OutputFormat::Csv => {
            println!("survival_days,survival_rate");
            for p in &matched.curve.points {
                println!("{},{}", p.time, p.probability);
            }
        }
        OutputFormat::Table => {
            println!(
                "Cluster {} (centroid {:?}, distance {:.3})",
                matched.cluster, matched.centroid, matched.distance
            );

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Survival days", "Survival rate"]);
            for p in &matched.curve.points {
                table.add_row(vec![p.time.to_string(), format!("{:.3}", p.probability)]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}
