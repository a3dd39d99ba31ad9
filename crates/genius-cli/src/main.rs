use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use genius_core::{ChatEvent, Message, Role};
use genius_loop::{ChatClient, ChatConfig};
use genius_state::{AccessGate, ClearScope, DurableStorage, SessionStore, StoredTokenGate};

#[derive(Parser)]
#[command(name = "genius")]
#[command(about = "Personal conversational assistant in your terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation (Ctrl-C stops the current answer)
    Chat,
    /// Send a single message and stream the answer
    Send {
        /// Message content
        message: String,
        /// Attach an image (repeatable, up to 5)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Show the submitted-query history
    History,
    /// Clear cached conversation state (both logs unless narrowed)
    Clear {
        /// Only the message transcript
        #[arg(long)]
        messages: bool,
        /// Only the query history
        #[arg(long)]
        history: bool,
    },
    /// Store an externally issued auth token
    Login { token: String },
    /// Drop the stored token and the cached conversation
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = ChatConfig::from_env();
    let storage: Arc<dyn DurableStorage> = Arc::new(config.build_storage());
    if !storage.is_available() {
        log::warn!("no profile directory found; conversation will not persist");
    }
    let gate = StoredTokenGate::load(storage.clone()).await;
    let store = Arc::new(SessionStore::new(storage));

    match cli.command {
        Commands::Login { token } => {
            gate.login(token).await;
            println!("Logged in.");
        }
        Commands::Logout => {
            gate.logout().await;
            store.clear(ClearScope::Both).await;
            println!("Logged out; cached conversation cleared.");
        }
        Commands::History => {
            require_login(&gate)?;
            store.bootstrap(&gate).await;
            let history = store.history().await;
            if history.is_empty() {
                println!("No submitted queries yet.");
            }
            for entry in history {
                println!(
                    "{}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    entry.text
                );
            }
        }
        Commands::Clear { messages, history } => {
            let scope = match (messages, history) {
                (true, false) => ClearScope::Transcript,
                (false, true) => ClearScope::History,
                _ => ClearScope::Both,
            };
            store.clear(scope).await;
            println!("Cleared.");
        }
        Commands::Send { message, images } => {
            require_login(&gate)?;
            store.bootstrap(&gate).await;
            let client = build_client(&config, store)?;
            run_once(&client, &message, &images).await?;
        }
        Commands::Chat => {
            require_login(&gate)?;
            store.bootstrap(&gate).await;
            let client = build_client(&config, store)?;
            run_repl(&client).await?;
        }
    }

    Ok(())
}

fn require_login(gate: &StoredTokenGate) -> anyhow::Result<()> {
    if !gate.is_authenticated() {
        bail!("not logged in; run `genius login <token>` first");
    }
    Ok(())
}

fn build_client(config: &ChatConfig, store: Arc<SessionStore>) -> anyhow::Result<ChatClient> {
    let provider = config
        .build_provider()
        .context("upstream credential missing; set GOOGLE_API_KEY")?;
    Ok(ChatClient::new(Arc::new(provider), store))
}

fn print_turn(message: &Message) {
    match message.role {
        Role::User => println!("{} {}", "you:".blue().bold(), message.content),
        Role::Assistant => println!("{} {}", "genius:".green().bold(), message.content),
    }
}

async fn run_once(client: &ChatClient, message: &str, images: &[PathBuf]) -> anyhow::Result<()> {
    let (event_tx, event_rx) = mpsc::channel(64);
    client
        .submit(message, images, event_tx)
        .await
        .map_err(|error| anyhow::anyhow!("{error}"))?;

    print!("{} ", "genius:".green().bold());
    drain_events(client, event_rx).await;
    Ok(())
}

/// Stream events to the terminal until the generation ends; Ctrl-C cancels
/// the generation instead of killing the process.
async fn drain_events(client: &ChatClient, mut event_rx: mpsc::Receiver<ChatEvent>) {
    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                client.cancel().await;
                continue;
            }
            event = event_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            ChatEvent::Token { content } => {
                print!("{content}");
                let _ = std::io::stdout().flush();
            }
            ChatEvent::Complete => {
                println!();
                break;
            }
            ChatEvent::Cancelled => {
                println!();
                println!("{}", "[stopped]".yellow());
                break;
            }
            ChatEvent::Error { message } => {
                println!();
                eprintln!("{} {message}", "error:".red().bold());
                break;
            }
        }
    }
}

async fn run_repl(client: &ChatClient) -> anyhow::Result<()> {
    let transcript = client.store().transcript().await;
    if !transcript.is_empty() {
        println!("{}", "-- cached conversation --".dimmed());
        for message in &transcript {
            print_turn(message);
        }
        println!("{}", "-- end of cache --".dimmed());
    }
    println!("{}", "Type a message, or /quit to exit.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you:".blue().bold());
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            _ => {}
        }

        let (event_tx, event_rx) = mpsc::channel(64);
        match client.submit(input, &[], event_tx).await {
            Ok(()) => {
                print!("{} ", "genius:".green().bold());
                drain_events(client, event_rx).await;
            }
            Err(error) => eprintln!("{} {error}", "error:".red().bold()),
        }
    }

    Ok(())
}
