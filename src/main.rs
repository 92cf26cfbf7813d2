use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_formatter::cli::{Cli, Commands};
use transcript_formatter::config::Config;
use transcript_formatter::{output, server, TranscriptionPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "transcript_formatter=debug,tower_http=debug"
    } else {
        "transcript_formatter=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let mut config = Config::load()?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let pipeline = TranscriptionPipeline::new(&config)?;
            server::serve(&config, pipeline).await?;
        }
        Commands::Format { url, output, format } => {
            let pipeline = TranscriptionPipeline::new(&config)?;

            let progress = if cli.quiet {
                ProgressBar::hidden()
            } else {
                let progress = ProgressBar::new_spinner();
                progress.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
                );
                progress.enable_steady_tick(Duration::from_millis(120));
                progress
            };
            progress.set_message("Fetching captions and formatting...");

            let result = pipeline.transcribe_from_url(&url).await;
            progress.finish_and_clear();

            let result = result?;

            if !cli.quiet {
                eprintln!("{}", output::summary(&result));
            }

            match output {
                Some(path) => {
                    output::save_to_file(&result, &path, &format)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format)?;
                }
            }
        }
        Commands::Config { init } => {
            if init {
                let path = config.save()?;
                println!("Default configuration written to: {}", path.display());
            } else {
                println!("Config file: {}", Config::config_path()?.display());
            }
            config.display();
        }
    }

    Ok(())
}
