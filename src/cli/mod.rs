//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

/// Axis Presets - save, recall and annotate named axis positions.
#[derive(Parser, Debug)]
#[command(name = "presets")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Device whose presets to operate on.
    #[arg(short, long, global = true)]
    pub axis: Option<String>,

    /// Output format: table, json, or yaml.
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List presets of the device.
    List {
        /// Include deactivated presets.
        #[arg(long)]
        all: bool,
    },

    /// Show a preset's value and history.
    Show {
        /// Preset name.
        name: String,

        /// Category to look in (first match if omitted).
        #[arg(long)]
        category: Option<String>,
    },

    /// Save a preset at the given value.
    Add {
        /// Preset category.
        category: String,

        /// Preset name.
        name: String,

        /// Position to save.
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Comment recorded in the history.
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Save a preset at the axis's current position.
    AddHere {
        /// Preset category.
        category: String,

        /// Preset name.
        name: String,

        /// Comment recorded in the history.
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Change an existing preset (current position if no value is given).
    Update {
        /// Preset name.
        name: String,

        /// New position.
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,

        /// Comment recorded in the history.
        #[arg(short, long)]
        comment: Option<String>,

        /// Category to look in (first match if omitted).
        #[arg(long)]
        category: Option<String>,
    },

    /// Annotate a preset without changing its value.
    Comment {
        /// Preset name.
        name: String,

        /// Comment recorded in the history.
        comment: String,

        /// Category to look in (first match if omitted).
        #[arg(long)]
        category: Option<String>,
    },

    /// Hide a preset; its history is kept.
    Deactivate {
        /// Preset name.
        name: String,

        /// Category to look in (first match if omitted).
        #[arg(long)]
        category: Option<String>,
    },

    /// Re-enable a deactivated preset.
    Activate {
        /// Preset category.
        category: String,

        /// Preset name.
        name: String,
    },

    /// Move to a preset.
    Mv {
        /// Preset name.
        name: String,

        /// Motion timeout in seconds.
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Wait for the move to finish.
        #[arg(short, long)]
        wait: bool,
    },

    /// Move to a preset and wait for completion.
    Umv {
        /// Preset name.
        name: String,

        /// Motion timeout in seconds.
        #[arg(short, long)]
        timeout: Option<f64>,
    },

    /// Show the offset from a preset (positive: preset is ahead).
    Wm {
        /// Preset name.
        name: String,
    },

    /// Show the axis's current position.
    Where,

    /// Set the virtual axis position directly.
    SetPosition {
        /// New position.
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Report which preset the axis is at.
    State,

    /// Show the document path for each category.
    Paths,

    /// Write a default configuration file.
    InitConfig,
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}
