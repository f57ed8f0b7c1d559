use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use lumicheck::{
    config::{ClassifierStrategy, Configuration},
    coordinator::CoordinatorBuilder,
    error::AppError,
    intake,
    report::{self, ReportKind},
};

#[derive(Parser)]
#[command(name = "lumicheck")]
#[command(about = "Classify street-lighting fixtures as LED or HID from photographs")]
#[command(version)]
struct Cli {
    /// A photograph, or a folder with one sub-folder per fixture.
    input: PathBuf,

    /// Directory the CSV reports are written to.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Configuration file to load instead of `lumicheck.toml`; must exist.
    #[arg(long)]
    config: Option<String>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Pause between two photographs, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Local,
    Remote,
}

impl From<StrategyArg> for ClassifierStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Local => ClassifierStrategy::Local,
            StrategyArg::Remote => ClassifierStrategy::Remote,
        }
    }
}

fn init_logging(configuration: &Configuration) {
    tracing_subscriber::fmt()
        .with_max_level(configuration.log_level())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let configuration = match &cli.config {
        Some(path) => Configuration::load_from(path)?,
        None => Configuration::load()?,
    };
    init_logging(&configuration);

    let mut builder = CoordinatorBuilder::new(configuration);
    if let Some(strategy) = cli.strategy {
        builder = builder.strategy(strategy.into());
    }
    if let Some(delay_ms) = cli.delay_ms {
        builder = builder.inter_item_delay(Duration::from_millis(delay_ms));
    }
    let mut coordinator = builder.build()?;

    let sources = intake::collect_sources(&cli.input)?;
    info!("Found {} images under {}", sources.len(), cli.input.display());

    coordinator.submit(sources)?;
    let snapshot = coordinator.wait().await?;
    let groups = coordinator.groups();
    let summary = coordinator.summary();

    for group in &groups {
        info!(
            "Fixture {}: {} ({}/{} photos, {:.0}%)",
            group.group_id,
            group.final_type.report_label(),
            group.processed_photos,
            group.total_photos,
            group.avg_confidence * 100.0
        );
    }
    info!(
        "{} fixtures: {} LED, {} HID, {}/{} photos processed",
        summary.groups, summary.led_groups, summary.hid_groups, summary.processed, summary.total
    );

    let failed = snapshot.items().iter().filter(|item| item.error().is_some()).count();
    if failed > 0 {
        warn!("{} photos could not be processed", failed);
    }

    let groups_csv = report::export_groups_csv(&groups)?;
    report::write_report(&cli.out, ReportKind::Groups, &groups_csv)?;

    let items_csv = report::export_items_csv(snapshot.items())?;
    report::write_report(&cli.out, ReportKind::Items, &items_csv)?;

    Ok(())
}
