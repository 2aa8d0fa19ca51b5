//! Command implementations for the GEF processor CLI
//!
//! File reading, parallel processing, progress reporting and table output
//! live here; the pipeline itself only ever sees text buffers.

use crate::cli::args::{Commands, InspectArgs, ProcessArgs};
use crate::cli::discovery::discover_files;
use crate::cli::writer::TableWriter;
use crate::error::GefError;
use crate::models::{SoilLabel, Sounding};
use crate::processor::SoundingProcessor;
use crate::table::concat_tables;
use anyhow::{Context, Result};
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, error, info};

/// Processing statistics for reporting
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    /// Number of sounding files found
    pub files_found: usize,
    /// Number of files processed successfully
    pub files_processed: usize,
    /// Number of files that failed
    pub files_failed: usize,
    pub cpt_count: usize,
    pub bore_count: usize,
    /// Measurement rows over all CPTs
    pub measurement_rows: usize,
    /// Layers over all CPTs and boreholes
    pub layer_count: usize,
    pub warning_count: usize,
    /// Total processing time
    pub processing_time: Duration,
    /// Output file sizes in bytes
    pub output_sizes: Vec<(String, u64)>,
}

impl ProcessingStats {
    /// Calculate total output size in bytes
    pub fn total_output_size(&self) -> u64 {
        self.output_sizes.iter().map(|(_, size)| size).sum()
    }

    /// Format output size in human-readable format
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    fn record(&mut self, sounding: &Sounding) {
        self.files_processed += 1;
        self.warning_count += sounding.warnings().len();
        match sounding {
            Sounding::Cpt(record) => {
                self.cpt_count += 1;
                self.measurement_rows += record.rows.len();
                self.layer_count += record.layers.len();
            }
            Sounding::Bore(record) => {
                self.bore_count += 1;
                self.layer_count += record.layers.len();
            }
        }
    }
}

/// Main command runner: sets up logging and dispatches the subcommand
pub async fn run(command: Commands) -> Result<ProcessingStats> {
    setup_logging(command.log_level(), command.quiet());
    debug!("Command line arguments: {:?}", command);

    match command {
        Commands::Process(args) => {
            let stats = process_command(&args).await?;
            if !args.logging.quiet {
                print_summary(&args, &stats);
            }
            Ok(stats)
        }
        Commands::Inspect(args) => inspect_command(&args).await,
    }
}

/// Set up structured logging on stderr
fn setup_logging(log_level: &str, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gef_processor={}", log_level)));

    if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Read one file and run it through the pipeline.
///
/// GEF files are often Latin-1 encoded; invalid UTF-8 is replaced rather
/// than rejected.
pub fn process_file(processor: &SoundingProcessor, path: &Path) -> crate::error::Result<Sounding> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    processor.process(&text)
}

/// Errors that stop the whole run rather than one file
fn is_critical_error(error: &GefError) -> bool {
    matches!(error, GefError::Configuration { .. })
}

/// Discover, process and write; returns the run statistics
pub async fn process_command(args: &ProcessArgs) -> Result<ProcessingStats> {
    let start_time = Instant::now();
    args.validate()?;
    let config = args.pipeline.to_config()?;
    let processor = Arc::new(SoundingProcessor::new(config)?);

    let files = discover_files(&args.inputs)?;
    info!("Found {} sounding files", files.len());
    let mut stats = ProcessingStats {
        files_found: files.len(),
        ..Default::default()
    };
    if files.is_empty() {
        stats.processing_time = start_time.elapsed();
        return Ok(stats);
    }

    let progress_bar = if args.show_progress() {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        pb.set_message("Processing soundings...");
        Some(pb)
    } else {
        None
    };

    let mut results = stream::iter(files)
        .map(|path| {
            let processor = Arc::clone(&processor);
            async move {
                let task_path = path.clone();
                let result = task::spawn_blocking(move || process_file(&processor, &task_path))
                    .await
                    .map_err(|e| GefError::ProcessingFailed {
                        path: path.clone(),
                        reason: format!("Worker task failed: {}", e),
                    })
                    .and_then(|result| result);
                (path, result)
            }
        })
        .buffer_unordered(args.workers);

    // path order keeps the output independent of scheduling
    let mut soundings: BTreeMap<PathBuf, Sounding> = BTreeMap::new();
    while let Some((path, result)) = results.next().await {
        if let Some(pb) = &progress_bar {
            pb.inc(1);
        }
        match result {
            Ok(sounding) => {
                stats.record(&sounding);
                soundings.insert(path, sounding);
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                stats.files_failed += 1;
                if args.fail_fast || is_critical_error(&e) {
                    if let Some(pb) = &progress_bar {
                        pb.abandon_with_message("Processing aborted");
                    }
                    return Err(e)
                        .with_context(|| format!("Failed to process {}", path.display()));
                }
            }
        }
    }

    if let Some(pb) = &progress_bar {
        pb.finish_with_message("All soundings processed");
    }

    let writer = TableWriter::new(args.output_path.clone(), args.format)
        .with_compression(args.compression);
    for (name, frame) in build_tables(soundings.values())? {
        if let Some((path, size)) = writer
            .write(name, frame)
            .with_context(|| format!("Failed to write the {} table", name))?
        {
            info!("Wrote {}", path.display());
            stats.output_sizes.push((path.display().to_string(), size));
        }
    }

    stats.processing_time = start_time.elapsed();
    Ok(stats)
}

/// Combined measurement, layer and borehole tables
fn build_tables<'a>(
    soundings: impl Iterator<Item = &'a Sounding>,
) -> crate::error::Result<Vec<(&'static str, DataFrame)>> {
    let mut measurements = Vec::new();
    let mut layers = Vec::new();
    let mut boreholes = Vec::new();

    for sounding in soundings {
        match sounding {
            Sounding::Cpt(record) => {
                measurements.push(record.to_dataframe()?);
                layers.push(record.layers_dataframe()?);
            }
            Sounding::Bore(record) => boreholes.push(record.to_dataframe()?),
        }
    }

    Ok(vec![
        ("measurements", concat_tables(measurements)?),
        ("layers", concat_tables(layers)?),
        ("boreholes", concat_tables(boreholes)?),
    ])
}

fn print_summary(args: &ProcessArgs, stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Time elapsed:".bright_cyan(),
        HumanDuration(stats.processing_time).to_string().bright_white()
    );
    println!(
        "  {} {} ({} CPT, {} borehole)",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white(),
        stats.cpt_count,
        stats.bore_count
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Measurement rows:".bright_cyan(),
        stats.measurement_rows.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Layers:".bright_cyan(),
        stats.layer_count.to_string().bright_white()
    );
    if stats.warning_count > 0 {
        println!(
            "  {} {}",
            "Warnings:".bright_yellow(),
            stats.warning_count.to_string().bright_yellow()
        );
    }
    println!(
        "  {} {} ({})",
        "Output:".bright_cyan(),
        args.output_path.display(),
        ProcessingStats::format_size(stats.total_output_size())
    );
    for (path, size) in &stats.output_sizes {
        println!("    {} {}", path, ProcessingStats::format_size(*size));
    }
}

/// Process one file and print what was found in it
async fn inspect_command(args: &InspectArgs) -> Result<ProcessingStats> {
    let start_time = Instant::now();
    let processor = SoundingProcessor::new(args.pipeline.to_config()?)?;
    let path = args.file.clone();
    let sounding = task::spawn_blocking(move || process_file(&processor, &path))
        .await?
        .with_context(|| format!("Failed to process {}", args.file.display()))?;

    print_inspection(args, &sounding);

    let mut stats = ProcessingStats {
        files_found: 1,
        processing_time: start_time.elapsed(),
        ..Default::default()
    };
    stats.record(&sounding);
    Ok(stats)
}

fn print_inspection(args: &InspectArgs, sounding: &Sounding) {
    let metadata = sounding.metadata();
    println!(
        "{} {}",
        sounding.test_type().to_string().bright_green().bold(),
        metadata
            .test_id
            .as_deref()
            .unwrap_or("<unnamed>")
            .bright_white()
            .bold()
    );
    if let Some(dialect) = metadata.dialect {
        println!("  {} {}", "Format:".bright_cyan(), dialect);
    }
    if let Some(location) = &metadata.location {
        println!(
            "  {} {:.2}, {:.2} ({})",
            "Location:".bright_cyan(),
            location.x,
            location.y,
            location.srs_name
        );
    }
    if let Some(level) = metadata.ground_level {
        println!(
            "  {} {:.2} {}",
            "Ground level:".bright_cyan(),
            level,
            metadata.vertical_datum.as_deref().unwrap_or("")
        );
    }
    if let Some(level) = metadata.groundwater_level {
        println!("  {} {:.2} m", "Groundwater:".bright_cyan(), level);
    }

    let labels: Vec<SoilLabel> = match sounding {
        Sounding::Cpt(record) => {
            println!("  {} {}", "Rows:".bright_cyan(), record.rows.len());
            record.labels()
        }
        Sounding::Bore(record) => record.labels(),
    };
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in &labels {
        *counts.entry(label.name()).or_default() += 1;
    }
    println!("  {}", "Soil labels:".bright_cyan());
    for (name, count) in counts {
        println!("    {:<14} {}", name, count);
    }

    if args.show_layers {
        println!("  {}", "Layers:".bright_cyan());
        let layers: Vec<_> = match sounding {
            Sounding::Cpt(record) => record.layers.iter().collect(),
            Sounding::Bore(record) => record.layers.iter().map(|l| &l.layer).collect(),
        };
        for layer in layers {
            println!(
                "    {:>7.2} - {:>7.2}  {}",
                layer.depth_top,
                layer.depth_bottom,
                layer.label.name()
            );
        }
    }

    let warnings = sounding.warnings();
    if !warnings.is_empty() {
        println!(
            "  {} {}",
            "Warnings:".bright_yellow(),
            warnings.len().to_string().bright_yellow()
        );
        if args.show_warnings {
            for warning in warnings {
                println!("    {}", warning);
            }
        }
    }
}
