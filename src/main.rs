//! Fabric Precheck - Main CLI Application
//!
//! Checks the HCAs of a benchmark fleet over ssh and analyzes the
//! bandwidth reports a benchmark run leaves behind.

use clap::Parser;
use fabric_precheck::{
    app::{report_error, App},
    cli::Cli,
    config::load_config,
    error::Result,
    version_banner,
};
use std::process;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    // Parse command line arguments
    let cli = Cli::parse();
    // Keep JSON runs free of ANSI codes on both streams
    let use_color = !cli.no_color && !cli.json_output();

    match run_application(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            let (message, code) = report_error(&e, use_color);
            eprintln!("{}", message);
            process::exit(code);
        }
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<i32> {
    if cli.debug {
        eprintln!("{}", version_banner());
        eprintln!("{}", cli.get_config_summary());
    }

    let command = cli.command.clone();
    let config = load_config(cli)?;
    App::new(config).run(&command).await
}
