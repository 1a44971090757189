//! Slash-command REPL over the chat engine, per C11: reads stdin a line at
//! a time, dispatches `/`-prefixed lines to a command handler (with
//! unique-prefix matching), and passes everything else to the chat engine.

use std::io::Write;

use hackare_prompts::PromptLibrary;
use hackare_registry::{self as registry, Provider};
use hackare_tools::ToolRegistry;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chat_session::ChatSession;

const COMMANDS: &[&str] = &["help", "clear", "compact", "history", "model", "system", "save", "tokens", "config", "exit", "quit", "q"];

/// Run the interactive shell until `/exit` (or an alias), EOF, or two
/// consecutive idle `SIGINT` presses.
pub async fn run(session: &mut ChatSession, tools: &ToolRegistry, prompts: &mut PromptLibrary) {
    println!("hacka.re — type /help for commands, or start chatting.");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut sigint_count = 0u32;

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            biased;
            _ = idle_sigint() => {
                sigint_count += 1;
                if sigint_count >= 2 {
                    println!("\nInterrupted.");
                    return;
                }
                println!("\n(press Ctrl-C again to exit)");
                continue;
            }
            line = stdin.next_line() => line,
        };

        let Ok(Some(line)) = line else {
            println!();
            return;
        };
        sigint_count = 0;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('/') {
            if handle_command(rest, session, tools, prompts).await {
                return;
            }
            continue;
        }

        send_with_cancellation(session, line).await;
    }
}

async fn idle_sigint() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Send `text`, racing a repeating `SIGINT` against the in-flight request so
/// the first press during a send cancels it rather than killing the shell.
async fn send_with_cancellation(session: &mut ChatSession, text: &str) {
    session.new_cancel_token();
    let send_fut = session.send(text);
    tokio::pin!(send_fut);

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                session.cancel();
            }
            result = &mut send_fut => {
                if let Err(error) = result {
                    let message = hackare_common::error::format_failure(error.kind(), &error.to_string(), None);
                    eprintln!("{message}");
                }
                return;
            }
        }
    }
}

/// Returns `true` if the shell should exit.
async fn handle_command(rest: &str, session: &mut ChatSession, tools: &ToolRegistry, prompts: &mut PromptLibrary) -> bool {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    let Some(resolved) = resolve_command(name) else {
        println!("Unknown command /{name}. Type /help for the list.");
        return false;
    };

    match resolved {
        "help" => print_help(),
        "clear" => {
            session.clear();
            println!("History cleared.");
        },
        "compact" => {
            session.compact(2000, 6);
            println!("History compacted.");
        },
        "history" => print_history(session),
        "model" => handle_model(session, arg),
        "system" => handle_system(session, arg),
        "save" => handle_save(session, arg),
        "tokens" => print_tokens(session),
        "config" => print_config(session, tools),
        "exit" | "quit" | "q" => return true,
        _ => unreachable!(),
    }
    let _ = prompts;
    false
}

/// Matches `name` against [`COMMANDS`] by unique-prefix, per the shell's
/// autocompletion contract.
fn resolve_command(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return None;
    }
    let matches: Vec<&'static str> = COMMANDS.iter().copied().filter(|c| c.starts_with(name)).collect();
    match matches.as_slice() {
        [single] => Some(single),
        _ if matches.contains(&name) => Some(name),
        _ => None,
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /help               show this list");
    println!("  /clear              drop history, keep the system prompt");
    println!("  /compact            summarize older history");
    println!("  /history            print the conversation so far");
    println!("  /model [id]         show or change the active model");
    println!("  /system [text]      show or set the system prompt override");
    println!("  /save <path>        write the conversation to a JSON file");
    println!("  /tokens             show context-budget usage");
    println!("  /config             show the effective configuration");
    println!("  /exit, /quit, /q    leave the shell");
}

fn print_history(session: &ChatSession) {
    for message in &session.history {
        println!("[{:?}] {}", message.role, message.content);
    }
}

fn handle_model(session: &mut ChatSession, arg: &str) {
    if arg.is_empty() {
        println!("Current model: {}", session.config.model);
        let provider = registry::lookup(&session.config.model).map(|record| record.provider);
        print!("{}", format_model_catalog(provider));
        return;
    }
    session.config.model = arg.to_string();
    println!("Model set to {arg}.");
}

fn handle_system(session: &mut ChatSession, arg: &str) {
    if arg.is_empty() {
        match &session.config.system_prompt {
            Some(prompt) => println!("{prompt}"),
            None => println!("(no system prompt override set)"),
        }
        return;
    }
    session.config.system_prompt = Some(arg.to_string());
    println!("System prompt updated.");
}

fn handle_save(session: &ChatSession, arg: &str) {
    if arg.is_empty() {
        println!("Usage: /save <path>");
        return;
    }
    match serde_json::to_vec_pretty(&session.history) {
        Ok(bytes) => match std::fs::write(arg, bytes) {
            Ok(()) => println!("Saved conversation to {arg}."),
            Err(error) => eprintln!("[server] could not write {arg}: {error}"),
        },
        Err(error) => eprintln!("[server] could not serialize history: {error}"),
    }
}

fn print_tokens(session: &ChatSession) {
    let text: String = session.history.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n");
    let context_size = registry::context_window(&session.config.model);
    let estimate = hackare_prompts::estimate_tokens(&text, context_size);
    println!("{}/{} tokens ({:.1}%)", estimate.tokens, estimate.context_size, estimate.percentage);
}

fn print_config(session: &ChatSession, tools: &ToolRegistry) {
    let snapshot = session.config.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot).unwrap_or_default());
    println!("tools loaded: {}", tools.len());
}

/// List every catalog entry for `provider`, annotated with context window
/// and capability flags, for the `/model` and `models` surfaces.
pub fn format_model_catalog(provider: Option<Provider>) -> String {
    let records: Vec<_> = match provider {
        Some(p) => registry::models_for(p),
        None => Provider::ALL.iter().flat_map(|&p| registry::models_for(p)).collect(),
    };

    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "{:<10} {:<28} ctx={:<8} out={:<7} caps=[{}]{}\n",
            record.provider,
            record.id,
            record.context_window,
            record.max_output_tokens,
            record.capabilities.join(","),
            if record.is_default { "  (default)" } else { "" },
        ));
    }
    out
}
