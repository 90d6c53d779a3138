//! Config command handlers

use crate::cli::ConfigInitArgs;
use crate::config::EXAMPLE_CONFIG;
use std::fs;

/// Handle `poster config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Set provider API keys in the environment or under [llm.providers.*].");

    Ok(())
}
