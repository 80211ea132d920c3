use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcript::cli::{Cli, Commands};
use yt_transcript::config::Config;
use yt_transcript::transcribe::{PipelineResult, TranscriptPipeline};
use yt_transcript::{output, server, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    let mut config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Transcript {
            url,
            output,
            format,
            timestamps,
            tool,
            timeout,
        } => {
            apply_tool_overrides(&mut config, tool, timeout)?;
            let format = match format {
                Some(format) => format,
                None => config.output_format()?,
            };

            warn_missing_dependencies(&config).await;

            let pipeline = TranscriptPipeline::new(&config);

            tracing::info!("Starting transcript fetch for URL: {}", url);

            let progress = (!cli.quiet).then(|| {
                let progress = ProgressBar::new_spinner();
                progress.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                progress.set_message(format!("Fetching subtitles with {}...", config.tool.binary));
                progress.enable_steady_tick(Duration::from_millis(120));
                progress
            });

            let result = pipeline.run(&url).await;

            if let Some(progress) = progress {
                progress.finish_and_clear();
            }

            let success = match result {
                PipelineResult::Success(success) => success,
                PipelineResult::Failure(failure) => {
                    eprintln!("{} {:?}", style("✗").red().bold(), failure.kind);
                    match &failure.detail {
                        Some(detail) => anyhow::bail!("{}\nDetails: {}", failure.message, detail),
                        None => anyhow::bail!("{}", failure.message),
                    }
                }
            };

            match output {
                Some(path) => {
                    let written = output::save_to_file(&success, &path, format, timestamps).await?;
                    println!(
                        "{} Transcript saved to: {} ({} words)",
                        style("✓").green().bold(),
                        written.display(),
                        success.word_count
                    );
                }
                None => {
                    output::print_to_console(&success, format, timestamps)?;
                }
            }
        }
        Commands::Batch {
            urls,
            output,
            tool,
            timeout,
        } => {
            apply_tool_overrides(&mut config, tool, timeout)?;
            warn_missing_dependencies(&config).await;

            let pipeline = TranscriptPipeline::new(&config);

            let progress = (!cli.quiet).then(|| {
                let progress = ProgressBar::new_spinner();
                progress.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                progress.set_message(format!("Fetching {} transcripts with {}...", urls.len(), config.tool.binary));
                progress.enable_steady_tick(Duration::from_millis(120));
                progress
            });

            let results = pipeline.run_batch(urls.as_slice()).await;

            if let Some(progress) = progress {
                progress.finish_and_clear();
            }

            let succeeded = results.iter().filter(|result| result.is_success()).count();
            let content = serde_json::to_string_pretty(&output::BatchResponse::new(urls.as_slice(), &results))?;

            match output {
                Some(path) => {
                    fs_err::write(&path, content)?;
                    println!(
                        "{} {}/{} transcripts saved to: {}",
                        style("✓").green().bold(),
                        succeeded,
                        results.len(),
                        path.display()
                    );
                }
                None => println!("{}", content),
            }
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.app.bind = bind;
            } else if let Ok(port) = std::env::var("PORT") {
                config.app.bind = format!("0.0.0.0:{}", port.trim());
            }
            config.validate()?;

            warn_missing_dependencies(&config).await;

            let addr = config.bind_addr()?;
            let pipeline = Arc::new(TranscriptPipeline::new(&config));
            server::serve(pipeline, addr).await?;
        }
        Commands::Config { show, init } => {
            if init {
                let path = config.save(cli.config.as_deref()).await?;
                println!("Configuration written to: {}", path.display());
            }
            if show || !init {
                config.display();
            }
        }
    }

    Ok(())
}

fn apply_tool_overrides(config: &mut Config, tool: Option<String>, timeout: Option<u64>) -> Result<()> {
    if let Some(tool) = tool {
        config.tool.binary = tool;
    }
    if let Some(timeout) = timeout {
        config.tool.timeout_secs = Some(timeout);
    }
    config.validate()
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "yt_transcript=debug"
    } else {
        "yt_transcript=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

// Non-fatal: the tool may still be reachable at request time
async fn warn_missing_dependencies(config: &Config) {
    let missing_deps = utils::check_dependencies(&config.tool.binary).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }
}
