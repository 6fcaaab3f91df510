use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formweave_application::DEFAULT_OPTION_CACHE_TTL_SECONDS;
use formweave_core::{AppError, AppResult};

/// Render, generate and list form schemas.
#[derive(Parser, Debug)]
#[command(name = "formweave", version)]
#[command(subcommand_precedence_over_arg = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Schema file rendered when no subcommand is given.
    #[arg(env = "FORMWEAVE_SCHEMA_PATH")]
    schema_path: Option<PathBuf>,

    /// JSON object merged over the schema's initial values.
    #[arg(long, global = true, env = "FORMWEAVE_VALUES_PATH")]
    values_path: Option<PathBuf>,

    /// JSON object mapping option source URLs to row arrays.
    #[arg(long, global = true, env = "FORMWEAVE_OPTION_ROWS_PATH")]
    option_rows_path: Option<PathBuf>,

    /// Run one submit pass after rendering (`true` or `false`).
    #[arg(long, global = true, env = "FORMWEAVE_SUBMIT")]
    submit: Option<String>,

    /// Seconds resolved option lists stay cached; 0 disables caching.
    #[arg(
        long,
        global = true,
        env = "FORMWEAVE_OPTION_CACHE_TTL_SECONDS",
        default_value_t = DEFAULT_OPTION_CACHE_TTL_SECONDS
    )]
    option_cache_ttl_seconds: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one schema file, optionally submitting it.
    Render {
        /// Path to a `.json` schema file.
        #[arg(env = "FORMWEAVE_SCHEMA_PATH")]
        schema_path: PathBuf,
    },
    /// Generate a schema from a column-mapping config file.
    Generate {
        /// Path to the generation config.
        config_path: PathBuf,
    },
    /// List schema names stored in a directory.
    List {
        /// Directory holding `<name>.json` schemas.
        #[arg(env = "FORMWEAVE_SCHEMA_DIR", default_value = ".")]
        schema_dir: PathBuf,
    },
}

/// What the binary does in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Render one schema file, optionally submitting it.
    Render { schema_path: PathBuf },
    /// Generate a schema from a column-mapping config file.
    Generate { config_path: PathBuf },
    /// List schema names stored in a directory.
    List { schema_dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub command: CliCommand,
    pub values_path: Option<PathBuf>,
    pub option_rows_path: Option<PathBuf>,
    pub submit: bool,
    pub option_cache_ttl_seconds: u32,
}

impl CliConfig {
    pub fn load() -> AppResult<Self> {
        Self::try_from(Cli::parse())
    }
}

impl TryFrom<Cli> for CliConfig {
    type Error = AppError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let command = match cli.command {
            Some(Command::Render { schema_path }) => CliCommand::Render { schema_path },
            Some(Command::Generate { config_path }) => CliCommand::Generate { config_path },
            Some(Command::List { schema_dir }) => CliCommand::List { schema_dir },
            None => CliCommand::Render {
                schema_path: cli.schema_path.ok_or_else(|| {
                    AppError::Validation("FORMWEAVE_SCHEMA_PATH is required".to_owned())
                })?,
            },
        };

        let submit = match cli.submit.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(value) if value.eq_ignore_ascii_case("true") => true,
            Some(value) if value.eq_ignore_ascii_case("false") => false,
            Some(value) => {
                return Err(AppError::Validation(format!(
                    "FORMWEAVE_SUBMIT must be 'true' or 'false', got '{value}'"
                )));
            }
        };

        Ok(Self {
            command,
            values_path: cli.values_path,
            option_rows_path: cli.option_rows_path,
            submit,
            option_cache_ttl_seconds: cli.option_cache_ttl_seconds,
        })
    }
}
