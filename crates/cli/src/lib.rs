//! # FormForge CLI
//!
//! Command-line access to the builder core, for inspecting and scripting
//! form documents without an editor UI.
//!
//! ## Commands
//!
//! - `catalog` - List the field blueprints
//! - `validate` - Import a document and report every violation
//! - `inspect` - Print the ordered field tree with rule previews
//! - `new` - Build a document through the store and write it
//! - `rule` - Set or clear a conditional visibility rule

pub mod commands;

use clap::{Parser, Subcommand};
use formforge_editor::EditorConfig;
use formforge_schema::{Condition, RuleAction};
use std::path::PathBuf;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Form schema builder
#[derive(Parser, Debug)]
#[command(name = "formforge", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Editor configuration file (TOML)
    #[arg(short, long, global = true, env = "FORMFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available field blueprints by category
    Catalog,

    /// Import a schema document and report all violations
    Validate {
        /// Schema document to check
        file: PathBuf,
        /// Accept rules whose parent field is missing (they load disabled)
        #[arg(long)]
        lenient: bool,
    },

    /// Print the ordered field tree with rule previews
    Inspect {
        /// Schema document to print
        file: PathBuf,
    },

    /// Create a schema document from blueprints
    New {
        /// Output file
        file: PathBuf,
        /// Blueprint to add, optionally under a container: `text`, `group/text`
        #[arg(short, long = "field", value_name = "BLUEPRINT")]
        fields: Vec<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set or clear the visibility rule on a field and write the file back
    Rule {
        /// Schema document to edit
        file: PathBuf,
        /// Field that owns the rule
        #[arg(long)]
        field: String,
        /// Field the rule depends on
        #[arg(long, required_unless_present = "clear")]
        parent: Option<String>,
        /// hasValue, isEmpty, equals or notEquals
        #[arg(long, required_unless_present = "clear")]
        condition: Option<Condition>,
        /// show, hide or disable
        #[arg(long, required_unless_present = "clear")]
        action: Option<RuleAction>,
        /// Target value as JSON; bare words are taken as strings
        #[arg(long)]
        value: Option<String>,
        /// Remove the rule instead
        #[arg(long, conflicts_with_all = ["parent", "condition", "action", "value"])]
        clear: bool,
    },
}

/// Load the editor configuration named on the command line, or the defaults
pub fn load_config(cli: &Cli) -> anyhow::Result<EditorConfig> {
    match &cli.config {
        Some(path) => Ok(EditorConfig::load(path)?),
        None => Ok(EditorConfig::default()),
    }
}

/// Execute a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    tracing::debug!("Running {:?}", cli.command);

    match cli.command {
        Commands::Catalog => commands::catalog(),
        Commands::Validate { file, lenient } => commands::validate(&file, lenient),
        Commands::Inspect { file } => commands::inspect(&file),
        Commands::New {
            file,
            fields,
            force,
        } => commands::new(&file, &fields, force, config),
        Commands::Rule {
            file,
            field,
            parent,
            condition,
            action,
            value,
            clear,
        } => {
            let request = if clear {
                None
            } else {
                match (parent, condition, action) {
                    (Some(parent), Some(condition), Some(action)) => Some(commands::RuleRequest {
                        parent,
                        condition,
                        action,
                        value,
                    }),
                    _ => anyhow::bail!("--parent, --condition and --action are required"),
                }
            };
            commands::rule(&file, &field, request, config)
        }
    }
}
