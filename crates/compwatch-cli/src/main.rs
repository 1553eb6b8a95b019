mod logging;
mod pipeline;
mod schedule;
mod stages;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use compwatch_core::DEFAULT_CONFIG_PATH;

use crate::pipeline::{run_pipeline, PipelineState, StageName};
use crate::stages::LiveStages;

#[derive(Debug, Parser)]
#[command(name = "compwatch")]
#[command(about = "Competitor monitoring pipeline: collect, clean, analyze, report")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true, env = "COMPWATCH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline (the default when no command is given).
    Run {
        /// Use the persisted output of these stages instead of running them.
        #[arg(long, value_enum, value_delimiter = ',')]
        reuse: Vec<ReusableStage>,
    },
    /// Fetch records from the API into the raw dataset.
    Collect,
    /// Clean the raw dataset.
    Clean,
    /// Attach sentiment to the cleaned dataset.
    Analyze,
    /// Render the spreadsheet report from the enriched dataset.
    Visualize,
    /// Run the full pipeline on a cron schedule until Ctrl-C.
    Schedule {
        /// Six-field cron expression; overrides `schedule.cron`.
        #[arg(long)]
        cron: Option<String>,
    },
    /// Validate the configuration and print it with secrets redacted.
    CheckConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReusableStage {
    Collect,
    Clean,
    Analyze,
}

impl From<ReusableStage> for StageName {
    fn from(stage: ReusableStage) -> Self {
        match stage {
            ReusableStage::Collect => StageName::Collect,
            ReusableStage::Clean => StageName::Clean,
            ReusableStage::Analyze => StageName::Analyze,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = stages::load(&cli.config)?;

    let command = cli.command.unwrap_or(Commands::Run { reuse: Vec::new() });
    if matches!(command, Commands::CheckConfig) {
        println!("configuration OK: {}", cli.config.display());
        println!("{config:#?}");
        return Ok(());
    }

    let _logging = logging::init(&config.logging, &config.paths.log_dir)?;

    let (plan, reuse): (Vec<StageName>, Vec<StageName>) = match command {
        Commands::Run { reuse } => (
            StageName::ALL.to_vec(),
            reuse.into_iter().map(StageName::from).collect(),
        ),
        Commands::Collect => (vec![StageName::Collect], Vec::new()),
        Commands::Clean => (vec![StageName::Clean], Vec::new()),
        Commands::Analyze => (vec![StageName::Analyze], Vec::new()),
        Commands::Visualize => (vec![StageName::Visualize], Vec::new()),
        Commands::Schedule { cron } => {
            let cron = cron.unwrap_or_else(|| config.schedule.cron.clone());
            return schedule::run_scheduled(config, &cron).await;
        }
        Commands::CheckConfig => return Ok(()),
    };

    let stages = LiveStages::new(&config);
    let result = run_pipeline(&stages, &plan, &reuse).await;
    match result.state {
        PipelineState::Failed { stage, error } => {
            Err(anyhow::anyhow!("stage {stage} failed: {error}"))
        }
        _ => Ok(()),
    }
}
