//! Command-line argument definitions for the GEF processor
//!
//! This module defines the CLI interface using the clap derive API and maps
//! the pipeline flags onto a [`PipelineConfig`].

use crate::cli::writer::{Compression, TableFormat};
use crate::config::{
    ClassificationMethod, MissingValuePolicy, PipelineConfig, RowErrorPolicy,
};
use crate::error::{GefError, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the GEF processor
///
/// Reads GEF and BRO-XML cone penetration tests and boreholes, classifies
/// the soil and writes the results as tables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gef-processor",
    version,
    about = "Classify soils from GEF and BRO-XML CPT and borehole files",
    long_about = "Parses GEF and BRO-XML cone penetration tests and boreholes, derives \
                  Robertson ratios, classifies every sample into a soil behaviour type and \
                  groups the samples into layers. Results are written as Parquet or CSV tables."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Process sounding files and write combined tables
    Process(ProcessArgs),
    /// Print the metadata, layers and warnings of one sounding
    Inspect(InspectArgs),
}

impl Commands {
    pub fn log_level(&self) -> &'static str {
        match self {
            Commands::Process(args) => args.logging.get_log_level(),
            Commands::Inspect(args) => args.logging.get_log_level(),
        }
    }

    pub fn quiet(&self) -> bool {
        match self {
            Commands::Process(args) => args.logging.quiet,
            Commands::Inspect(args) => args.logging.quiet,
        }
    }
}

/// Arguments for the process command
#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Sounding files, directories or glob patterns
    ///
    /// Directories are searched recursively for .gef and .xml files.
    #[arg(value_name = "INPUT", required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// Directory the output tables are written to
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = "output",
        help = "Output directory for the generated tables"
    )]
    pub output_path: PathBuf,

    /// Output table format
    #[arg(long = "format", value_enum, default_value_t = TableFormat::Parquet)]
    pub format: TableFormat,

    /// Parquet compression algorithm
    #[arg(long = "compression", value_enum, default_value_t = Compression::Snappy)]
    pub compression: Compression,

    /// Number of parallel workers
    ///
    /// Controls how many files are processed concurrently.
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        default_value_t = num_cpus::get(),
        help = "Number of parallel workers for processing"
    )]
    pub workers: usize,

    /// Stop at the first file that fails instead of skipping it
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Arguments for the inspect command
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// Sounding file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// List every classified layer
    #[arg(long = "layers")]
    pub show_layers: bool,

    /// List every warning
    #[arg(long = "warnings")]
    pub show_warnings: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Chart variant selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    #[value(name = "1990")]
    Robertson1990,
    #[value(name = "2016")]
    Robertson2016,
    #[value(name = "been-jefferies")]
    BeenJefferies,
}

impl From<MethodArg> for ClassificationMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Robertson1990 => ClassificationMethod::Robertson1990,
            MethodArg::Robertson2016 => ClassificationMethod::Robertson2016,
            MethodArg::BeenJefferies => ClassificationMethod::BeenJefferies,
        }
    }
}

/// Pipeline settings shared by all commands
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct PipelineArgs {
    /// Classification chart
    #[arg(long = "method", value_enum)]
    pub method: Option<MethodArg>,

    /// Atmospheric pressure used for normalisation, in MPa
    #[arg(long = "atmospheric-pressure", value_name = "MPA")]
    pub atmospheric_pressure: Option<f64>,

    /// Groundwater level below the surface in metres, overriding the file
    #[arg(long = "groundwater-depth", value_name = "M")]
    pub groundwater_depth: Option<f64>,

    /// Groundwater level relative to the vertical datum in metres, converted
    /// with the ground level of each sounding
    #[arg(
        long = "groundwater-elevation",
        value_name = "M",
        allow_hyphen_values = true,
        conflicts_with = "groundwater_depth"
    )]
    pub groundwater_elevation: Option<f64>,

    /// Maximum number of unit weight refinement passes
    #[arg(long = "max-iterations", value_name = "COUNT")]
    pub max_iterations: Option<usize>,

    /// Layers thinner than this are merged into a neighbour, in metres
    #[arg(long = "min-layer-thickness", value_name = "M")]
    pub min_layer_thickness: Option<f64>,

    /// No-data value applied to every column
    #[arg(long = "void", value_name = "VALUE", allow_hyphen_values = true)]
    pub void: Option<f64>,

    /// Fill missing values between present neighbours
    #[arg(long = "interpolate-missing")]
    pub interpolate_missing: bool,

    /// Skip rows that cannot be parsed instead of failing the file
    #[arg(long = "skip-bad-rows")]
    pub skip_bad_rows: bool,

    /// Keep samples above the pre-excavated depth
    #[arg(long = "keep-pre-excavation")]
    pub keep_pre_excavation: bool,

    /// Do not derive soil fractions
    #[arg(long = "no-fractions")]
    pub no_fractions: bool,
}

impl PipelineArgs {
    /// Pipeline configuration with the given flags applied over the defaults
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::new()
            .with_pre_excavation(!self.keep_pre_excavation)
            .with_soil_fractions(!self.no_fractions);

        if let Some(method) = self.method {
            config = config.with_method(method.into());
        }
        if let Some(pressure) = self.atmospheric_pressure {
            config = config.with_atmospheric_pressure(pressure);
        }
        if let Some(depth) = self.groundwater_depth {
            config = config.with_groundwater_depth(depth);
        }
        if let Some(elevation) = self.groundwater_elevation {
            config = config.with_groundwater_elevation(elevation);
        }
        if let Some(iterations) = self.max_iterations {
            config = config.with_max_iterations(iterations);
        }
        if let Some(thickness) = self.min_layer_thickness {
            config = config.with_min_layer_thickness(thickness);
        }
        if let Some(void) = self.void {
            config = config.with_missing_value(void);
        }
        if self.interpolate_missing {
            config = config.with_missing_value_policy(MissingValuePolicy::Interpolate);
        }
        if self.skip_bad_rows {
            config = config.with_row_error_policy(RowErrorPolicy::SkipWithWarning);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Verbosity flags
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct LoggingArgs {
    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl LoggingArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

impl ProcessArgs {
    /// Validate the process command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(GefError::configuration(
                "Number of workers must be greater than 0",
            ));
        }
        if self.output_path.is_file() {
            return Err(GefError::configuration(format!(
                "Output path is a file: {}",
                self.output_path.display()
            )));
        }
        Ok(())
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.logging.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassificationMethod;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    fn process_args(args: &[&str]) -> ProcessArgs {
        match parse(args).command {
            Some(Commands::Process(process)) => process,
            other => panic!("Expected process command, got {other:?}"),
        }
    }

    #[test]
    fn test_process_defaults() {
        let args = process_args(&["gef-processor", "process", "data/"]);

        assert_eq!(args.inputs, vec!["data/".to_string()]);
        assert_eq!(args.output_path, PathBuf::from("output"));
        assert_eq!(args.format, TableFormat::Parquet);
        assert_eq!(args.workers, num_cpus::get());
        assert!(args.validate().is_ok());
        assert_eq!(args.pipeline.to_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_pipeline_flags_map_onto_config() {
        let args = process_args(&[
            "gef-processor",
            "process",
            "a.gef",
            "b.xml",
            "--method",
            "1990",
            "--groundwater-depth",
            "1.5",
            "--min-layer-thickness",
            "0.5",
            "--void",
            "-99999",
            "--skip-bad-rows",
            "--interpolate-missing",
            "--keep-pre-excavation",
            "--no-fractions",
        ]);
        let config = args.pipeline.to_config().unwrap();

        assert_eq!(
            config.classification.method,
            ClassificationMethod::Robertson1990
        );
        assert_eq!(config.classification.groundwater_depth, Some(1.5));
        assert_eq!(config.layering.min_layer_thickness, 0.5);
        assert_eq!(config.missing_value, Some(-99999.0));
        assert_eq!(config.row_error_policy, RowErrorPolicy::SkipWithWarning);
        assert_eq!(config.missing_value_policy, MissingValuePolicy::Interpolate);
        assert!(!config.apply_pre_excavation);
        assert!(!config.classification.soil_fractions);
    }

    #[test]
    fn test_been_jefferies_with_groundwater_elevation() {
        let args = process_args(&[
            "gef-processor",
            "process",
            "a.gef",
            "--method",
            "been-jefferies",
            "--groundwater-elevation",
            "-1.25",
        ]);
        let config = args.pipeline.to_config().unwrap();

        assert_eq!(
            config.classification.method,
            ClassificationMethod::BeenJefferies
        );
        assert_eq!(config.classification.groundwater_elevation, Some(-1.25));
        assert_eq!(config.classification.groundwater_depth, None);

        let both = Args::try_parse_from([
            "gef-processor",
            "process",
            "a.gef",
            "--groundwater-depth",
            "1.0",
            "--groundwater-elevation",
            "-1.0",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_invalid_pipeline_flags_are_rejected() {
        let args = process_args(&[
            "gef-processor",
            "process",
            "a.gef",
            "--atmospheric-pressure",
            "0",
        ]);
        assert!(matches!(
            args.pipeline.to_config(),
            Err(GefError::Configuration { .. })
        ));

        let mut args = process_args(&["gef-processor", "process", "a.gef"]);
        args.workers = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_process_requires_input() {
        assert!(Args::try_parse_from(["gef-processor", "process"]).is_err());
    }

    #[test]
    fn test_inspect_and_log_levels() {
        let args = parse(&["gef-processor", "inspect", "cpt.gef", "--layers", "-vv"]);
        let command = args.command.unwrap();
        assert_eq!(command.log_level(), "debug");
        assert!(!command.quiet());

        let Commands::Inspect(inspect) = command else {
            panic!("Expected inspect command");
        };
        assert_eq!(inspect.file, PathBuf::from("cpt.gef"));
        assert!(inspect.show_layers);
        assert!(!inspect.show_warnings);

        let quiet = parse(&["gef-processor", "process", "x", "-q", "-v"]);
        assert_eq!(quiet.command.unwrap().log_level(), "error");
    }
}
