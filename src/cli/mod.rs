//! CLI module for poster
//!
//! # Commands
//!
//! - `serve` - Dashboard API and service connections
//! - `gateway` - LLM gateway server
//! - `generate` - One-off generation with fallback
//! - `post` - Social post for a platform
//! - `ideas` - Numbered content ideas
//! - `test-provider` - Connectivity test for one provider
//! - `status` - Connect to every service once and print the result
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! poster serve -c poster.toml
//! poster post --platform linkedin --topic "Rust at work"
//! poster completions zsh > ~/.zfunc/_poster
//! ```

pub mod completions;
pub mod config;
pub mod gateway;
pub mod generate;
pub mod output;
pub mod serve;
pub mod status;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::PosterConfig;
use crate::llm::Platform;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Agentic Media Poster
#[derive(Parser, Debug)]
#[command(
    name = "poster",
    version,
    about = "Social content generation with LLM fallback and backend service monitoring"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dashboard API and connect to backend services
    Serve(ServeArgs),
    /// Start the LLM gateway server
    Gateway(ServeArgs),
    /// Generate text from a prompt
    Generate(GenerateArgs),
    /// Generate a social media post
    Post(PostArgs),
    /// Generate numbered content ideas
    Ideas(IdeasArgs),
    /// Send a test prompt to a single provider
    TestProvider(TestProviderArgs),
    /// Show backend service connection status
    Status(StatusArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "poster.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Prompt text
    pub prompt: String,

    /// Preferred provider (groq, gemini, openrouter, lmstudio)
    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f32>,

    /// Platform hint forwarded to the gateway
    #[arg(long)]
    pub platform: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "poster.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[arg(long, value_enum, default_value = "twitter")]
    pub platform: Platform,

    #[arg(long)]
    pub topic: Option<String>,

    #[arg(long)]
    pub tone: Option<String>,

    /// Include hashtags
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub hashtags: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "poster.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct IdeasArgs {
    #[arg(short = 'n', long, default_value_t = 5)]
    pub count: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "poster.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct TestProviderArgs {
    /// Provider to test
    pub provider: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "poster.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "poster.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "poster.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load `path` if it exists (defaults otherwise), apply env overrides and
/// validate.
pub fn load_config(path: &Path) -> Result<PosterConfig, Box<dyn std::error::Error>> {
    let config = if path.exists() {
        PosterConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        PosterConfig::default()
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}
