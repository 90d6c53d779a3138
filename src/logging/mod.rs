//! Tracing setup and logging helpers

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Characters of a prompt kept by [`truncate_prompt`].
pub const PROMPT_PREVIEW_CHARS: usize = 100;

/// Build filter directives from `[logging]`
///
/// Produces `"base_level,poster::component=level,..."`.
///
/// ```
/// use poster::config::{LogFormat, LoggingConfig};
/// use poster::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("services".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,poster::services=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",poster::{}={}", component, level));
        }
    }

    filter_str
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the config.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = build_filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// First [`PROMPT_PREVIEW_CHARS`] characters of a prompt, on a char boundary.
pub fn truncate_prompt(prompt: &str) -> String {
    match prompt.char_indices().nth(PROMPT_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &prompt[..idx]),
        None => prompt.to_string(),
    }
}
