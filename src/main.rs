use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use rag_assistant_client::config::DEFAULT_LOG_FILTER;
use rag_assistant_client::models::{HistoryResponse, Message, Statistics};
use rag_assistant_client::{
    ChatService, Config, ConversationStore, DashboardService, DashboardStore, Gateway, HttpGateway,
};

#[derive(Parser)]
#[command(name = "rag-assistant", about = "Terminal client for the RAG assistant backend")]
struct Cli {
    /// Backend base URL (overrides RAG_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend and its services are up
    Health,
    /// Ask a single question
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Show knowledge-base statistics
    Stats,
    /// List the conversations recorded on a day (YYYY-MM-DD)
    History { date: String },
    /// Interactive session; `/reset` clears the log, `/quit` exits
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url)?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::from_config(&config)?);
    info!("Using backend at {}", config.api_base_url);

    match cli.command {
        Command::Health => {
            let health = gateway.check_health().await?;
            println!("status: {} ({})", health.status, health.timestamp);
            for (name, status) in &health.service_statuses {
                println!("  {name}: {status}");
            }
            if !health.is_healthy() || !health.degraded_services().is_empty() {
                anyhow::bail!("backend reports degraded services");
            }
        }
        Command::Ask { question } => {
            let chat = ChatService::new(gateway, ConversationStore::new());
            let answer = chat.ask(&question.join(" ")).await?;
            print_answer(&answer);
        }
        Command::Stats => {
            let dashboard = DashboardService::new(gateway, DashboardStore::new());
            let stats = dashboard.refresh().await?;
            print_stats(&stats);
        }
        Command::History { date } => {
            let history = gateway.fetch_history(&date).await?;
            print_history(&history);
        }
        Command::Chat => run_chat(ChatService::new(gateway, ConversationStore::new())).await?,
    }

    Ok(())
}

async fn run_chat(chat: ChatService) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Ask a question (/reset to start over, /quit to exit).");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                chat.clear();
                println!("Conversation cleared.");
            }
            question => match chat.ask(question).await {
                Ok(answer) => print_answer(&answer),
                // The error stays on the store for the next turn to clear.
                Err(e) => eprintln!("error: {e}"),
            },
        }
    }

    let state = chat.store().snapshot();
    info!("Session ended with {} messages", state.messages.len());
    Ok(())
}

fn print_answer(answer: &Message) {
    println!("{}: {}", answer.role, answer.content);
    if let Some(sources) = answer.sources.as_ref().filter(|s| !s.is_empty()) {
        println!("sources:");
        for source in sources {
            println!("  - {source}");
        }
    }
}

fn print_stats(stats: &Statistics) {
    println!("articles:      {}", stats.article_count);
    println!("projects:      {}", stats.project_count);
    println!("conversations: {}", stats.conversation_count);
    println!("updated:       {}", stats.last_updated_at);
}

fn print_history(history: &HistoryResponse) {
    if history.conversations.is_empty() {
        println!("No conversations on {}", history.date);
        return;
    }
    for entry in &history.conversations {
        println!("[{}] {}", entry.timestamp.format("%H:%M:%S"), entry.question);
        println!("  {}", entry.answer);
    }
}
