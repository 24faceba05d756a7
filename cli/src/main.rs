mod remote;

use anyhow::Result;
use clap::{Parser, Subcommand};
use larder_core::{
    create_provider_from_env, generate_recipe, render_generate_recipe_prompt, validate_ingredients,
    GenerateError, GenerationLimits, GenerationRequest,
};

const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Larder CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the prompt that would be sent to the model
    Prompt {
        /// Free-text ingredient list, e.g. "chicken, rice, broccoli"
        ingredients: String,
    },
    /// Generate a recipe in-process with the provider configured in the environment
    Generate {
        /// Free-text ingredient list
        ingredients: String,
    },
    /// Ask a running server to generate a recipe
    Request {
        /// Free-text ingredient list
        ingredients: String,
        /// Server URL
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
        /// Bearer token accepted by the server
        #[arg(long, env = "LARDER_API_TOKEN")]
        token: String,
    },
    /// Ping the server (unauthenticated)
    Ping {
        /// Server URL
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
}

/// Message for a failed generation: the user-facing text, plus the detail when
/// it does not already include it.
fn failure_message(error: &GenerateError) -> String {
    let detail = error.to_string();
    if detail.starts_with(error.user_message()) {
        detail
    } else {
        format!("{} ({})", error.user_message(), detail)
    }
}

/// Render the prompt for `ingredients`, rejecting input the generator would.
fn prompt_for(ingredients: String, limits: &GenerationLimits) -> Result<String> {
    let request = GenerationRequest {
        ingredients: Some(ingredients),
    };
    let ingredients = validate_ingredients(&request, limits)
        .map_err(|e| anyhow::anyhow!(failure_message(&e)))?;
    Ok(render_generate_recipe_prompt(ingredients))
}

async fn generate_local(ingredients: String) -> Result<()> {
    let provider = create_provider_from_env()?;
    let limits = GenerationLimits::from_env();
    let request = GenerationRequest {
        ingredients: Some(ingredients),
    };

    tracing::debug!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        "Generating recipe locally"
    );

    match generate_recipe(provider.as_ref(), &request, &limits).await {
        Ok(recipe) => {
            println!("{}", serde_json::to_string_pretty(&recipe)?);
            Ok(())
        }
        Err(e) => {
            if let Some(raw) = e.raw_response() {
                eprintln!("Raw model response:\n{}", raw);
            }
            anyhow::bail!(failure_message(&e))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prompt { ingredients } => {
            println!("{}", prompt_for(ingredients, &GenerationLimits::from_env())?);
        }
        Commands::Generate { ingredients } => {
            generate_local(ingredients).await?;
        }
        Commands::Request {
            ingredients,
            server,
            token,
        } => {
            remote::request_recipe(&server, &token, &ingredients).await?;
        }
        Commands::Ping { server } => {
            remote::ping(&server).await?;
        }
    }

    Ok(())
}
