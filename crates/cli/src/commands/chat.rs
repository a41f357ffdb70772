//! `ragchat chat` — Interactive or single-message chat mode.

use std::io::Write;

use ragchat_agent::ChatSession;
use ragchat_config::ChatConfig;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{build_session, print_knowledge_stats, print_results};

/// Slash commands understood by the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Quit,
    Reset,
    Stats,
    History,
    Knowledge,
    Search(String),
    Categories,
    Reload,
    Help,
    Unknown(String),
}

/// Command words that also get a hint when typed without the slash.
const COMMAND_WORDS: &[&str] = &[
    "quit",
    "exit",
    "bye",
    "reset",
    "stats",
    "history",
    "knowledge",
    "search",
    "categories",
    "reload",
    "help",
];

impl SlashCommand {
    /// `None` when `line` is not a slash command and should go to the model.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix('/')?;
        let (word, arg) = match rest.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (rest, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "quit" | "exit" | "bye" => Self::Quit,
            "reset" => Self::Reset,
            "stats" => Self::Stats,
            "history" => Self::History,
            "knowledge" => Self::Knowledge,
            "search" => Self::Search(arg.to_string()),
            "categories" => Self::Categories,
            "reload" => Self::Reload,
            "help" => Self::Help,
            _ => Self::Unknown(word.to_string()),
        };
        Some(command)
    }
}

/// "Did you mean '/reset'?" for a bare command word typed on its own,
/// or for `search <query>` typed without the slash.
pub fn bare_command_hint(line: &str) -> Option<String> {
    let line = line.trim().to_lowercase();
    if line.starts_with("search ") {
        return Some("Did you mean '/search <query>'?".to_string());
    }
    COMMAND_WORDS
        .contains(&line.as_str())
        .then(|| format!("Did you mean '/{line}'?"))
}

pub async fn run(config: ChatConfig, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = build_session(config)?;

    if !session.healthy().await {
        let config = session.config();
        eprintln!();
        eprintln!("  WARNING: Could not reach model '{}' at {}", config.model_name, config.ollama_base_url);
        eprintln!("  Make sure Ollama is running (`ollama serve`) and the model is pulled:");
        eprintln!("    ollama pull {}", config.model_name);
        eprintln!();
    }

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let response = session.turn(&msg).await;
        eprint!("\r              \r");
        println!("{response}");
        return Ok(());
    }

    print_banner(&session);
    interactive(&mut session).await?;

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn print_banner(session: &ChatSession) {
    let config = session.config();
    let knowledge = session.knowledge_stats();

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          ragchat — Interactive Mode          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:   {}", session.provider().name());
    println!("  Model:      {}", config.model_name);
    println!("  Server:     {}", config.ollama_base_url);
    println!("  Memory:     {} exchanges", config.conversation_memory_limit);
    if knowledge.enabled {
        println!("  Knowledge:  {} entries", knowledge.total_entries);
    } else {
        println!("  Knowledge:  disabled");
    }
    println!();
    println!("  Type your message and press Enter. /help lists commands.");
    println!();
}

async fn interactive(session: &mut ChatSession) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = SlashCommand::parse(line) {
            if !handle_command(session, command) {
                break;
            }
            continue;
        }

        if let Some(hint) = bare_command_hint(line) {
            println!("  {hint}");
            continue;
        }

        eprint!("  ...");
        let response = session.turn(line).await;
        eprint!("\r     \r");
        println!();
        for text in response.lines() {
            println!("  Bot > {text}");
        }
        println!();
    }

    Ok(())
}

/// Returns `false` when the loop should end.
fn handle_command(session: &mut ChatSession, command: SlashCommand) -> bool {
    debug!(?command, "Slash command");
    match command {
        SlashCommand::Quit => return false,
        SlashCommand::Reset => {
            session.reset();
            println!("  Conversation reset.");
        }
        SlashCommand::Stats => {
            let stats = session.stats();
            println!("  Messages:   {} total", stats.total_messages);
            println!("              {} user / {} assistant / {} system",
                stats.user_messages, stats.assistant_messages, stats.system_messages);
            println!("  Knowledge:  {}", if stats.rag_enabled { "enabled" } else { "disabled" });
            println!("  Entries:    {}", stats.knowledge_entries);
            println!("  Categories: {}", stats.knowledge_categories);
        }
        SlashCommand::History => {
            for line in session.history(true).lines() {
                println!("  {line}");
            }
        }
        SlashCommand::Knowledge => print_knowledge_stats(&session.knowledge_stats()),
        SlashCommand::Search(query) if query.is_empty() => println!("  Usage: /search <query>"),
        SlashCommand::Search(query) => print_results(&query, &session.search(&query)),
        SlashCommand::Categories => {
            let categories = session.categories();
            if categories.is_empty() {
                println!("  No categories");
            } else {
                println!("  Categories: {}", categories.join(", "));
            }
        }
        SlashCommand::Reload => {
            if session.reload_knowledge() {
                println!("  Knowledge reloaded ({} entries).", session.knowledge_stats().total_entries);
            } else {
                println!("  Reload failed; previous knowledge kept.");
            }
        }
        SlashCommand::Help => print_help(),
        SlashCommand::Unknown(word) => println!("  Unknown command '/{word}'. Type /help for commands."),
    }
    true
}

fn print_help() {
    println!("  Commands:");
    println!("    /quit, /exit, /bye   Leave the chat");
    println!("    /reset               Clear the conversation");
    println!("    /stats               Conversation statistics");
    println!("    /history             Show the conversation");
    println!("    /knowledge           Knowledge base summary");
    println!("    /search <query>      Search the knowledge base");
    println!("    /categories          List knowledge categories");
    println!("    /reload              Re-read the knowledge file");
    println!("    /help                This list");
}
