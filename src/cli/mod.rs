use std::sync::Arc;

use anyhow::Result;
use console::style;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::core::config::ServerConfig;
use crate::core::demo;
use crate::core::llm::OllamaClient;
use crate::interfaces::web::ApiServer;
use crate::logging::BroadcastMakeWriter;

fn print_help() {
    println!(
        "\n {} multi-agent career assistant service\n",
        style("careerpilot").green().bold()
    );
    println!(" {}", style("Commands:").bold());
    println!(
        "   {}    Start the orchestration API server",
        style("serve").cyan()
    );
    println!(
        "   {}     Play the scripted demo pipeline in the terminal",
        style("demo").cyan()
    );
    println!("   {}     Show this help message", style("help").cyan());
    println!(
        "\n {} careerpilot serve [--api-host <host>] [--api-port <port>]",
        style("Usage:").bold()
    );
    println!(
        " {} OLLAMA_BASE_URL, OLLAMA_MODEL, CAREERPILOT_API_HOST, CAREERPILOT_API_PORT\n",
        style("Environment:").bold()
    );
}

fn print_error(msg: &str) {
    eprintln!("{} {}", style("error:").red().bold(), msg);
}

pub(crate) fn parse_serve_flags(
    args: &[String],
    start: usize,
    mut api_host: String,
    mut api_port: u16,
) -> (String, u16) {
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--api-port" => {
                if i + 1 < args.len() {
                    api_port = args[i + 1].parse().unwrap_or(api_port);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--api-host" => {
                if i + 1 < args.len() {
                    api_host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    (api_host, api_port)
}

async fn run_serve(config: ServerConfig) -> Result<()> {
    let (log_tx, _) = tokio::sync::broadcast::channel::<String>(500);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(BroadcastMakeWriter {
            sender: log_tx.clone(),
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!(
        backend = %config.ollama_base_url,
        model = %config.ollama_model,
        "starting CareerPilot orchestration service"
    );

    let llm = Arc::new(OllamaClient::new(
        config.ollama_base_url.clone(),
        config.ollama_model.clone(),
    ));
    ApiServer::new(llm, log_tx, config.api_host.clone(), config.api_port)
        .serve()
        .await
}

/// Plays the fallback script against the terminal, delays included.
async fn run_demo() -> Result<()> {
    use tokio_stream::StreamExt;

    let mut steps = demo::demo_stream("Walk me through the full pipeline".to_string());
    while let Some(step) = steps.next().await {
        let agent = style(format!("[{}]", step.event.agent_name.as_str()))
            .cyan()
            .bold();
        println!("{} {}", agent, step.event.content);
    }
    println!("\n{}", style("Demo run complete.").green());
    Ok(())
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = ServerConfig::from_env();

    let Some(cmd) = args.get(1).map(|s| s.as_str()) else {
        print_help();
        return Ok(());
    };

    match cmd {
        "serve" => {
            (config.api_host, config.api_port) =
                parse_serve_flags(&args, 2, config.api_host, config.api_port);
            run_serve(config).await
        }
        "demo" => run_demo().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            print_error(&format!("Unknown command: {}", other));
            print_help();
            Ok(())
        }
    }
}
