//! selv CLI
//!
//! Runnable demonstrations of field change tracking

use clap::{Parser, Subcommand};
use selv_core::logging_facility::{init, Profile};

mod demos;

#[derive(Debug, Parser)]
#[command(name = "selv")]
#[command(about = "selv - field change tracking demonstrations", long_about = None)]
struct Cli {
    #[command(flatten)]
    options: demos::DemoOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Track scalar, map, list, set and tuple fields of a data model
    Basic,
    /// Edit a document and query its change history
    History,
    /// Run a field action after every inventory change
    Actions,
    /// Send change lines through a timestamping logger
    Logger,
    /// Track a struct stored inside another tracked struct
    Nested,
    /// Exercise every container mutator
    Containers,
}

fn main() {
    let cli = Cli::parse();

    if cli.options.verbose {
        init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Basic => demos::basic::execute(&cli.options),
        Commands::History => demos::history::execute(&cli.options),
        Commands::Actions => demos::actions::execute(&cli.options),
        Commands::Logger => demos::logger::execute(&cli.options),
        Commands::Nested => demos::nested::execute(&cli.options),
        Commands::Containers => demos::containers::execute(&cli.options),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
