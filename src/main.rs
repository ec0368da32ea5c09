use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use picture_ai::app::App;
use picture_ai::client::GatewayClient;
use picture_ai::models::{ClientConfig, Config, ModelName};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "picture-ai")]
#[command(about = "Ask questions and generate images through a hosted AI provider")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the gateway HTTP server.
    Serve {
        /// Address to bind, overrides BIND_ADDR.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Ask a question and print the answer.
    Ask {
        #[command(flatten)]
        gateway: GatewayArgs,
        prompt: String,
    },
    /// Generate an image and write it to a file.
    Image {
        #[command(flatten)]
        gateway: GatewayArgs,
        /// Image model key.
        #[arg(long, short, value_parser = parse_model_arg)]
        model: ModelName,
        /// Output file, defaults to `<model>-<timestamp>.<ext>`.
        #[arg(long, short)]
        output: Option<PathBuf>,
        prompt: String,
    },
    /// List the image models the gateway accepts.
    Models {
        #[command(flatten)]
        gateway: GatewayArgs,
    },
}

#[derive(Debug, clap::Args)]
struct GatewayArgs {
    /// Gateway base URL, overrides PICTURE_AI_GATEWAY_URL.
    #[arg(long)]
    gateway_url: Option<String>,
}

impl GatewayArgs {
    fn client(&self) -> GatewayClient {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.gateway_url {
            config.gateway_url = url.clone();
        }
        GatewayClient::from_config(&config)
    }
}

fn parse_model_arg(input: &str) -> std::result::Result<ModelName, String> {
    input.parse().map_err(|e: picture_ai::Error| e.to_string())
}

const WAIT_MESSAGE: &str = "Please wait while we generate the response.";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "picture_ai=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match args.command {
        Command::Serve { bind } => {
            info!("Starting picture-ai gateway");
            let mut config = match Config::from_env() {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to initialize application: {}", e);
                    std::process::exit(1);
                }
            };
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Err(e) = App::from_config(&config).serve().await {
                error!("Gateway failed: {}", e);
                std::process::exit(1);
            }
        }
        Command::Ask { gateway, prompt } => {
            let client = gateway.client();
            eprintln!("{}", WAIT_MESSAGE);
            match client.ask(&prompt).await {
                Ok(answer) => println!("{}", answer),
                Err(e) => {
                    error!("POST {}/ask failed: {}", client.base_url(), e);
                    std::process::exit(1);
                }
            }
        }
        Command::Image {
            gateway,
            model,
            output,
            prompt,
        } => {
            let client = gateway.client();
            eprintln!("{}", WAIT_MESSAGE);
            let image = match client.generate_image(model, &prompt).await {
                Ok(image) => image,
                Err(e) => {
                    error!("POST {}/generate-image failed: {}", client.base_url(), e);
                    std::process::exit(1);
                }
            };
            let path = output.unwrap_or_else(|| default_output_path(model, image.extension()));
            tokio::fs::write(&path, &image.bytes).await?;
            println!("{}", path.display());
        }
        Command::Models { gateway } => {
            let client = gateway.client();
            match client.models().await {
                Ok(models) => {
                    for model in models {
                        println!("{}\t{}\t{}", model.name, model.label, model.id);
                    }
                }
                Err(e) => {
                    error!("GET {}/models failed: {}", client.base_url(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn default_output_path(model: ModelName, extension: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}-{}.{}",
        model,
        Local::now().format("%Y%m%d-%H%M%S"),
        extension
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_arg_valid() {
        assert_eq!(parse_model_arg("sdxll").unwrap(), ModelName::Sdxll);
    }

    #[test]
    fn test_parse_model_arg_invalid() {
        let err = parse_model_arg("sd15").unwrap_err();
        assert!(err.contains("sdxl1, sdxll"));
    }

    #[test]
    fn test_default_output_path_uses_model_and_extension() {
        let path = default_output_path(ModelName::Sdxl1, "png");
        let name = path.to_string_lossy();
        assert!(name.starts_with("sdxl1-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_cli_parses_image_command() {
        let args = CliArgs::try_parse_from([
            "picture-ai",
            "image",
            "--model",
            "sdxl1",
            "a lighthouse at dusk",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Image {
                model: ModelName::Sdxl1,
                ..
            }
        ));
    }
}
