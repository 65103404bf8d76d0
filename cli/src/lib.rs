//! `moodlift` command line front end.
//!
//! ## Commands
//!
//! - `moodlift generate --mood <mood>` / `--prompt <text>` - one generation
//! - `moodlift session` - mood names from stdin, one shared generator
//! - `moodlift health` - Ollama reachability and model check
//! - `moodlift moods` - list the mood catalogue

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use moodlift_core::ConfigError;
use moodlift_core::MoodliftConfig;

pub mod generate_cmd;
pub mod health_cmd;
pub mod moods_cmd;
pub mod session_cmd;

pub use generate_cmd::GenerateArgs;
pub use health_cmd::HealthArgs;
pub use moods_cmd::MoodsArgs;
pub use session_cmd::SessionArgs;

/// Process exit codes shared by all commands
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

/// Mood-based inspirational messages from a local Ollama model
#[derive(Debug, Parser)]
#[command(name = "moodlift", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalArgs {
    /// Config file (default: $MOODLIFT_CONFIG, ./moodlift.toml, ~/.config/moodlift/moodlift.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the Ollama endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the model name
    #[arg(long, global = true, value_name = "NAME")]
    pub model: Option<String>,
}

impl GlobalArgs {
    /// Load config and apply command-line overrides.
    pub fn load_config(&self) -> Result<MoodliftConfig, ConfigError> {
        let mut config = MoodliftConfig::load(self.config.as_deref())?;
        if let Some(endpoint) = &self.endpoint {
            config.ollama.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.ollama.model = model.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate one message
    Generate(GenerateArgs),

    /// Interactive session reading mood names from stdin
    ///
    /// Each line is a mood name, `clear` (drop cached messages),
    /// `status` (circuit and cache state) or `quit`.
    Session(SessionArgs),

    /// Check the Ollama server and configured model
    ///
    /// Exit 0 when reachable and the model is installed, 1 otherwise,
    /// 2 on configuration errors.
    Health(HealthArgs),

    /// List available moods
    Moods(MoodsArgs),
}

impl Cli {
    pub async fn run(self) -> i32 {
        match self.command {
            Command::Generate(args) => generate_cmd::run(&self.global, args).await,
            Command::Session(args) => session_cmd::run(&self.global, args).await,
            Command::Health(args) => health_cmd::run(&self.global, args).await,
            Command::Moods(args) => moods_cmd::run(args),
        }
    }
}
