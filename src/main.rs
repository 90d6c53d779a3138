use clap::Parser;
use poster::cli::generate::{handle_generate, handle_ideas, handle_post, handle_test_provider};
use poster::cli::status::handle_status;
use poster::cli::{handle_completions, handle_config_init, load_config, Cli, Commands, ConfigCommands};
use poster::config::PosterConfig;
use poster::llm::LlmClient;
use poster::services::ServiceManager;
use std::path::Path;

fn llm_client(path: &Path) -> Result<LlmClient, Box<dyn std::error::Error>> {
    let config: PosterConfig = load_config(path)?;
    Ok(LlmClient::from_config(&config.llm, reqwest::Client::new())?)
}

fn print(output: Result<String, Box<dyn std::error::Error>>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", output?);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => poster::cli::serve::run_serve(args).await,
        Commands::Gateway(args) => poster::cli::gateway::run_gateway(args).await,
        Commands::Generate(args) => match llm_client(&args.config) {
            Ok(client) => print(handle_generate(&args, &client).await),
            Err(e) => Err(e),
        },
        Commands::Post(args) => match llm_client(&args.config) {
            Ok(client) => print(handle_post(&args, &client).await),
            Err(e) => Err(e),
        },
        Commands::Ideas(args) => match llm_client(&args.config) {
            Ok(client) => print(handle_ideas(&args, &client).await),
            Err(e) => Err(e),
        },
        Commands::TestProvider(args) => match llm_client(&args.config) {
            Ok(client) => {
                println!("{}", handle_test_provider(&args, &client).await);
                Ok(())
            }
            Err(e) => Err(e),
        },
        Commands::Status(args) => match load_config(&args.config) {
            Ok(config) => {
                let services = ServiceManager::new(
                    config.services.descriptors(),
                    config.services.connect_timeout(),
                );
                println!("{}", handle_status(&args, &services).await);
                Ok(())
            }
            Err(e) => Err(e),
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
