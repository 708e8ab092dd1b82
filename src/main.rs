use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use watdo_form::app::App;
use watdo_form::batch::{build_command, copy_command, parse_assignment};
use watdo_form::clipboard::SystemClipboard;
use watdo_form::config::Config;

/// Watdo Form - build `watdo todo` commands and copy them to the clipboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the command instead of opening the form
    #[arg(short, long)]
    print: bool,

    /// Set a field, e.g. --set Title=Groceries (repeatable)
    #[arg(short, long = "set", value_name = "LABEL=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// With --print, also copy the command to the clipboard
    #[arg(long, requires = "print")]
    copy: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log to stderr so stdout stays clean for --print
    let default_level = if args.debug {
        "debug"
    } else if args.print {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    let config = if let Some(config_path) = args.config {
        Config::load_from_file(&config_path)?
    } else {
        Config::load_default()?
    };

    if args.print {
        let command = build_command(&config, &args.set)?;
        println!("{command}");
        if args.copy {
            copy_command(&mut SystemClipboard::new(), &command)
                .context("Failed to copy command")?;
        }
        return Ok(());
    }

    if !std::io::stdout().is_terminal() {
        eprintln!("Error: the form must be run in an interactive terminal.");
        eprintln!("\nUse --print with --set LABEL=VALUE to build a command without one.");
        std::process::exit(1);
    }

    let mut app = App::new(&config)?;
    for (label, value) in &args.set {
        app.prefill(label, value)?;
    }

    if let Err(e) = app.run().await {
        eprintln!("\nwatdo-form encountered an error: {e}");
        eprintln!("\nIf the terminal display is corrupted, try running:");
        eprintln!("  reset");
        return Err(e);
    }

    Ok(())
}
