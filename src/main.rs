use crate::commands::Operation;
use crate::config::Config;
use crate::loaders::{CsvLoader, Loader};
use crate::menu::Menu;
use clap::{ArgAction, Parser, Subcommand};
use eyre::Result;
use std::io;
use std::path::PathBuf;
use tracing::{Level, info};

mod commands;
mod config;
mod display;
mod evaluation;
mod loaders;
mod menu;
mod model;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Use FILE instead of cms.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Read and write the data files in DIR
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Do not write back changes to the data files
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Set verbosity level
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive menu (default)
    Menu,
    #[command(flatten)]
    Operation(Operation),
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(data_dir) = args.data_dir {
        config.files.data_dir = data_dir;
    }
    let level = match args.verbose {
        0 => config.logging.level()?,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
    let mut loader = CsvLoader::from_files(&config.files);
    let mut registry = loader.load()?;
    match args.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            let loader = (!args.dry_run).then_some(&loader as &dyn Loader);
            Menu::new(&mut registry, loader, io::stdin().lock(), io::stdout()).run()?;
        }
        Command::Operation(operation) => {
            let modified = operation.run(&mut registry, &mut io::stdout().lock())?;
            if modified && args.dry_run {
                info!("dry run, changes are not saved");
            } else if modified {
                loader.save(&registry)?;
            }
        }
    }
    Ok(())
}
