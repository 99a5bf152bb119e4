//! Presets - save, recall and annotate named positions for an axis.
//!
//! Quick start:
//!   presets init-config                       # write a config, then edit [paths]
//!   presets -a x_motor add beamline in 12.5   # save a preset
//!   presets -a x_motor list                   # see active presets
//!   presets -a x_motor umv in                 # move there and wait
//!   presets -a x_motor state                  # which preset are we at?

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use axis_presets::application::{
    collect_rows, format_history, format_presets, format_state, parse_value, OutputFormat,
    PresetStore, UpdateOutcome,
};
use axis_presets::cli::{Cli, Commands};
use axis_presets::domain::{self, Mover, PresetConfig, PresetError};
use axis_presets::infrastructure::{ensure_config_exists, load_config, VirtualAxis};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .output_format()
        .map_err(|e| PresetError::Config { message: e })?;

    if matches!(cli.command, Commands::InitConfig) {
        return cmd_init_config(cli.config.as_deref());
    }

    let config = load_config(cli.config.as_deref())?;
    let axis_name = cli.axis.clone().ok_or_else(|| PresetError::Config {
        message: "No axis given. Use --axis <name>".into(),
    })?;
    let axis = Arc::new(VirtualAxis::new(axis_name, &config.axis_state_dir()));

    if let Commands::SetPosition { value } = &cli.command {
        let position = parse_value(value)?;
        axis.set_position(position)?;
        println!("{} {} = {}", "✓".green().bold(), axis.name(), position);
        return Ok(());
    }

    let store = PresetStore::new(axis.clone(), config)?;

    match cli.command {
        Commands::List { all } => {
            let rows = collect_rows(&store, all);
            println!("{}", format_presets(&rows, format)?);
        }
        Commands::Show { name, category } => {
            cmd_show(&store, &name, category, format)?;
        }
        Commands::Add {
            category,
            name,
            value,
            comment,
        } => {
            let value = parse_value(&value)?;
            report(store.add(&category, &name, value, comment.as_deref())?, &name);
        }
        Commands::AddHere {
            category,
            name,
            comment,
        } => {
            report(store.add_here(&category, &name, comment.as_deref())?, &name);
        }
        Commands::Update {
            name,
            value,
            comment,
            category,
        } => {
            let category = resolve_category(&store, &name, category)?;
            let value = value.as_deref().map(parse_value).transpose()?;
            let outcome = store
                .handle(&category, &name)
                .update(value, comment.as_deref())?;
            report(outcome, &name);
        }
        Commands::Comment {
            name,
            comment,
            category,
        } => {
            let category = resolve_category(&store, &name, category)?;
            report(store.handle(&category, &name).update_comment(&comment)?, &name);
        }
        Commands::Deactivate { name, category } => {
            let category = resolve_category(&store, &name, category)?;
            report(store.handle(&category, &name).deactivate()?, &name);
        }
        Commands::Activate { category, name } => {
            report(store.update(&category, &name, None, None, true)?, &name);
        }
        Commands::Mv {
            name,
            timeout,
            wait,
        } => {
            let status = store.mv(&name, seconds(timeout)?, wait)?;
            println!("{} {} → {}", "✓".green().bold(), axis.name(), status.target);
        }
        Commands::Umv { name, timeout } => {
            let status = store.umv(&name, seconds(timeout)?)?;
            println!("{} {} → {}", "✓".green().bold(), axis.name(), status.target);
        }
        Commands::Wm { name } => {
            println!("{:.4}", store.wm(&name)?);
        }
        Commands::Where => {
            println!("{:.4}", axis.position()?);
        }
        Commands::State => {
            let state = store.state()?;
            match format {
                OutputFormat::Table => println!("{}", format_state(axis.name(), &state)),
                OutputFormat::Json => println!("{}", state_json(&state)),
                OutputFormat::Yaml => println!("state: {state}"),
            }
        }
        Commands::Paths => {
            cmd_paths(&store, &axis)?;
        }
        Commands::SetPosition { .. } | Commands::InitConfig => {}
    }

    Ok(())
}

/// Show one preset's value and history.
fn cmd_show(
    store: &PresetStore,
    name: &str,
    category: Option<String>,
    format: OutputFormat,
) -> domain::Result<()> {
    let category = resolve_category(store, name, category)?;
    let position = store.handle(&category, name);
    let record = position.info()?;

    match format {
        OutputFormat::Table => {
            println!(
                "{} = {:.4}{}",
                name.bold(),
                record.value,
                if record.active { "" } else { " (inactive)" }
            );
            println!("  file: {}", position.storage_path()?.display());
            print!("{}", format_history(&category, name, &record.history));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&record).map_err(PresetError::json)?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&record).map_err(PresetError::serialize)?;
            print!("{yaml}");
        }
    }

    Ok(())
}

/// Show document paths command.
fn cmd_paths(store: &PresetStore, axis: &VirtualAxis) -> domain::Result<()> {
    println!("{}", "📂 Preset Documents".bold());
    println!();

    for category in store.categories() {
        let path = store.storage_path(&category)?;
        let label = if path.exists() {
            category.green()
        } else {
            category.dimmed()
        };
        println!("  [{}] {}", label, path.display());
    }

    println!();
    println!("Axis state: {}", axis.state_path().display());

    Ok(())
}

/// Write a default configuration file.
fn cmd_init_config(path: Option<&std::path::Path>) -> domain::Result<()> {
    let path = path.map_or_else(PresetConfig::default_config_path, std::path::Path::to_path_buf);
    if ensure_config_exists(&path)? {
        println!("{} Created {}", "✓".green().bold(), path.display());
    } else {
        println!("Config already exists: {}", path.display());
    }
    Ok(())
}

fn resolve_category(
    store: &PresetStore,
    name: &str,
    category: Option<String>,
) -> domain::Result<String> {
    match category {
        Some(category) => Ok(category),
        None => store
            .find_category(name)
            .ok_or_else(|| PresetError::Config {
                message: format!("No preset named '{name}' for {}", store.mover().name()),
            }),
    }
}

fn seconds(timeout: Option<f64>) -> domain::Result<Option<Duration>> {
    timeout
        .map(|secs| {
            Duration::try_from_secs_f64(secs).map_err(|_| {
                PresetError::validation(format!("timeout must be a non-negative number, not {secs}"))
            })
        })
        .transpose()
}

fn state_json(state: &axis_presets::PresetState) -> String {
    serde_json::json!({ "state": state.to_string() }).to_string()
}

fn report(outcome: UpdateOutcome, name: &str) {
    match outcome {
        UpdateOutcome::Applied => println!("{} {}", "✓".green().bold(), name),
        UpdateOutcome::Abandoned => println!(
            "{} {} not saved: preset file is locked by another user",
            "!".yellow().bold(),
            name
        ),
    }
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
