//! dutydraw CLI entry point

use anyhow::{Context, Result};
use dutydraw::config::cli::{Cli, ExecutionMode};
use dutydraw::config::{toml, validator, Config};
use dutydraw::entropy::{self, EntropyClient, EntropyService};
use dutydraw::output::{json, text, DrawReport};
use dutydraw::sequencer::{DrawSequencer, DrawSession};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = toml::load_config(&cli)?;
    setup_logging(config.runtime.debug);

    validator::validate_config(&config).context("Configuration validation failed")?;

    if config.runtime.dry_run {
        print!("{}", config);
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    match cli.mode {
        ExecutionMode::Draw => run_draw(config),
        ExecutionMode::Serve => run_service(config),
    }
}

/// Logs go to stderr so stdout carries only draw results. `RUST_LOG` wins over `--debug`.
fn setup_logging(debug: bool) {
    let default = if debug { "info,dutydraw=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Draw `config.draw.count` numbers and print the report
fn run_draw(config: Config) -> Result<()> {
    let weights = config.weight_table().context("Invalid weight table")?;
    let whitelist = config.whitelist()?;

    let sequencer = DrawSequencer::new(weights, &config.sampling);
    let mut session = DrawSession::new(sequencer, config.draw.mode);

    let refresher = match &config.entropy {
        Some(entropy) => {
            let (sender, source) = entropy::channel();
            session = session.with_entropy_source(Box::new(source));
            info!("Fetching entropy refreshes from {}", entropy.address);
            Some((EntropyClient::from_config(entropy, config.universe.size), sender))
        }
        None => None,
    };

    let mut report = DrawReport::new(config.draw.mode, &whitelist, config.sampling.seed);
    let interval = Duration::from_millis(config.draw.interval_ms);

    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        for remaining in (0..config.draw.count).rev() {
            let item = session.draw(&whitelist).context("Draw failed")?;
            report.record(item);
            if remaining == 0 {
                break;
            }

            // Ask for a refresh to be in place before the next draw
            if let Some((client, sender)) = &refresher {
                client.spawn_refresh(whitelist.clone(), sender.clone());
            }
            if interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(interval).await;
            }
        }
        Ok::<_, anyhow::Error>(())
    })?;

    report.refreshes_applied = session.refreshes_applied();

    if config.output.json {
        json::print_report(&report)?;
    } else {
        text::print_report(&report);
    }
    Ok(())
}

/// Run the entropy service until interrupted
fn run_service(config: Config) -> Result<()> {
    validator::validate_serve(&config)?;
    let service = EntropyService::new(&config).context("Failed to create entropy service")?;

    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(service.run())
}
