use clap::Parser;
use gef_processor::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    let Some(command) = args.command else {
        show_help_and_commands();
        process::exit(0);
    };

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(command) => result,
            signal = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                match signal {
                    Ok(()) => Err(anyhow::anyhow!("Processing interrupted by user")),
                    Err(e) => Err(anyhow::Error::new(e).context("Failed to listen for CTRL+C")),
                }
            }
        }
    });

    match result {
        Ok(stats) => {
            // a run in which every file failed is still an error
            if stats.files_found > 0 && stats.files_processed == 0 {
                process::exit(2);
            }
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("GEF Processor - CPT and borehole soil classification");
    println!("====================================================");
    println!();
    println!("Parse GEF and BRO-XML cone penetration tests and boreholes, classify");
    println!("the soil with the Robertson or Been & Jefferies chart and write tables.");
    println!();
    println!("USAGE:");
    println!("    gef-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    process     Process sounding files and write combined tables");
    println!("    inspect     Print the metadata, layers and warnings of one sounding");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Process a directory of soundings into Parquet tables:");
    println!("    gef-processor process ./soundings --output ./tables");
    println!();
    println!("    # Use the 1990 chart with a fixed water table and write CSV:");
    println!("    gef-processor process 'data/**/*.gef' --method 1990 \\");
    println!("                          --groundwater-depth 1.2 --format csv");
    println!();
    println!("    # Show the layers of a single CPT:");
    println!("    gef-processor inspect CPT-01.gef --layers --warnings");
    println!();
    println!("For detailed help on any command, use:");
    println!("    gef-processor <COMMAND> --help");
}
