mod cli;

use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use spa_concierge::api::ApiClient;
use spa_concierge::client::StreamingChatClient;
use spa_concierge::config::ClientConfig;
use spa_concierge::routes;
use spa_concierge::session::TurnOutcome;
use spa_concierge::shell::{resolve_input, welcome, StreamPrinter};
use spa_concierge::transport::HttpChatTransport;

use crate::cli::{ChatArgs, Cli, Commands, ServeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spa_concierge=info,concierge=info,tower_http=debug".into()),
        )
        .init();

    match cli.command {
        Commands::Chat(args) => run_chat(args).await,
        Commands::Serve(args) => run_serve(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    routes::serve(listener).await?;
    Ok(())
}

async fn run_chat(args: ChatArgs) -> anyhow::Result<()> {
    let config = ClientConfig::new(args.api_url, args.tenant)?.with_token(args.token);

    let api = ApiClient::new(&config);
    match api.health().await {
        Ok(health) => info!("Backend at {} is {}", api.base_url(), health.status),
        Err(e) => warn!("Backend health check failed: {e}"),
    }

    let client = StreamingChatClient::new(HttpChatTransport::new(api), config.tenant_id.clone());
    let mut views = client.subscribe();
    let mut printer = StreamPrinter::resume(&client.view());

    print!("{}", welcome());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "/quit" | "/exit") {
            break;
        }
        let started = !client.view().messages.is_empty();
        let Some(text) = resolve_input(&line, started) else {
            continue;
        };

        let send = client.send_message(&text);
        tokio::pin!(send);
        let result = loop {
            tokio::select! {
                result = &mut send => break result,
                changed = views.changed() => {
                    if changed.is_ok() {
                        emit(&printer.render(&views.borrow_and_update()))?;
                    }
                }
            }
        };
        emit(&printer.render(&views.borrow_and_update()))?;

        match result {
            Ok(TurnOutcome::Completed { escalated: true, .. }) => {
                println!("(A member of our team has been notified and will follow up.)");
            }
            Ok(TurnOutcome::ProtocolError) => warn!("Backend reported an error for this turn"),
            Ok(_) => {}
            Err(e) => eprintln!("! {e}"),
        }
    }

    info!("Chat session closed");
    Ok(())
}

fn emit(text: &str) -> std::io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}
