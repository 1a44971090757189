mod chat_session;
mod config_commands;
mod error;
mod repl;
mod share_link;
mod tool_dispatch;

use std::{process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use hackare_common::{error::format_failure, event_bus::EventBus};
use hackare_config::{CliOverrides, HackareConfig};
use hackare_registry::Provider;
use hackare_store::NamespacedStore;
use hackare_tools::ToolRegistry;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{chat_session::ChatSession, config_commands::ConfigAction, tool_dispatch::RegistryDispatcher};

#[derive(Parser)]
#[command(name = "hacka.re", about = "hacka.re — privacy-oriented CLI chat client", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    common: CommonArgs,

    /// A `gpt=<token>` fragment or full share-link URL to load before
    /// chatting.
    share_link: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
struct CommonArgs {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Widen log verbosity and add structured context to error output.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Force offline mode: LLM traffic stays on loopback. `HACKARE_OFFLINE`
    /// is honored by the environment-variable layer beneath this flag, not
    /// here, since its truthy values (`1`, `yes`, ...) are broader than
    /// `bool`'s `true`/`false`.
    #[arg(long, global = true, default_value_t = false)]
    offline: bool,

    /// Permit remote MCP traffic while offline.
    #[arg(long = "allow-remote-mcp", global = true, default_value_t = false)]
    allow_remote_mcp: bool,

    /// Permit remote embeddings traffic while offline.
    #[arg(long = "allow-remote-embeddings", global = true, default_value_t = false)]
    allow_remote_embeddings: bool,

    /// Provider id (openai, groq, ollama, ...).
    #[arg(long = "api-provider", global = true, env = "HACKARE_PROVIDER")]
    api_provider: Option<String>,

    /// API key for the configured provider.
    #[arg(long = "api-key", global = true, env = "HACKARE_API_KEY")]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint.
    #[arg(long = "base-url", global = true, env = "HACKARE_BASE_URL")]
    base_url: Option<String>,

    /// Model id.
    #[arg(long, global = true, env = "HACKARE_MODEL")]
    model: Option<String>,

    /// System prompt override.
    #[arg(long, global = true, env = "HACKARE_SYSTEM_PROMPT")]
    system: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the embedded web client over HTTP.
    Serve {
        #[arg(long, default_value_t = hackare_server::DEFAULT_PORT, env = "HACKARE_PORT")]
        port: u16,
    },
    /// Serve the embedded web client and best-effort open the default
    /// browser.
    Browse {
        #[arg(long, default_value_t = hackare_server::DEFAULT_PORT, env = "HACKARE_PORT")]
        port: u16,
    },
    /// Run the interactive chat shell (default when no subcommand is given).
    Chat,
    /// List known provider/model catalog entries.
    Models {
        /// Restrict the listing to one provider id.
        provider: Option<String>,
    },
    /// Inspect or edit the project-local (or user-global) config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn init_telemetry(common: &CommonArgs) {
    let level = if common.verbose { "debug" } else { &common.log_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if common.json_logs {
        registry.with(fmt::layer().json().with_target(true).with_thread_ids(false)).init();
    } else {
        registry.with(fmt::layer().with_target(false).with_thread_ids(false).with_ansi(true)).init();
    }
}

fn data_dir() -> std::path::PathBuf {
    directories::ProjectDirs::from("", "", "hacka.re")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from(".hacka.re"))
}

fn cli_overrides(common: &CommonArgs) -> CliOverrides {
    CliOverrides {
        provider: common.api_provider.clone(),
        base_url: common.base_url.clone(),
        api_key: common.api_key.clone(),
        model: common.model.clone(),
        system_prompt: common.system.clone(),
        offline_mode: common.offline.then_some(true),
        allow_remote_mcp: Some(common.allow_remote_mcp),
        allow_remote_embeddings: Some(common.allow_remote_embeddings),
        ..Default::default()
    }
}

const DEFAULT_TITLE: &str = "hacka.re";
const DEFAULT_SUBTITLE: &str = "cli";

/// Establish the active namespace from the store's persisted `title`/
/// `subtitle` (falling back to process defaults on first run), or from a
/// share payload's `title`/`subtitle` when one overrides them.
async fn bootstrap_namespace(store: &NamespacedStore, payload: Option<&hackare_share::SharePayload>) -> error::Result<()> {
    let mut title = store.get("title").await?.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let mut subtitle =
        store.get("subtitle").await?.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_else(|| DEFAULT_SUBTITLE.to_string());

    if let Some(payload) = payload {
        if let Some(t) = &payload.title {
            title = t.clone();
        }
        if let Some(s) = &payload.subtitle {
            subtitle = s.clone();
        }
    }

    store.set("title", &serde_json::json!(title)).await?;
    store.set("subtitle", &serde_json::json!(subtitle)).await?;
    store.set_namespace(hackare_crypto::derive_namespace(&title, &subtitle));
    Ok(())
}

async fn build_config(common: &CommonArgs, share_link: Option<&str>, store: &NamespacedStore) -> error::Result<HackareConfig> {
    let cli = cli_overrides(common);

    let payload = match share_link {
        Some(arg) if share_link::looks_like_share_link(arg) => Some(share_link::resolve_share_link(arg)?),
        _ => None,
    };

    bootstrap_namespace(store, payload.as_ref()).await?;

    Ok(hackare_config::build(store, payload.as_ref(), &cli).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_telemetry(&cli.common);
    info!(version = env!("CARGO_PKG_VERSION"), "hacka.re starting");

    let result = run(cli).await;
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let kind = error.kind();
            eprintln!("{}", format_failure(kind, &error.to_string(), None));
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            ExitCode::from(kind.exit_code() as u8)
        },
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    match cli.command {
        Some(Commands::Serve { port }) => {
            hackare_server::serve(port).await?;
            Ok(())
        },
        Some(Commands::Browse { port }) => {
            let url = format!("http://localhost:{port}/");
            if let Err(error) = open::that(&url) {
                tracing::warn!(%error, "failed to open default browser");
            }
            hackare_server::serve(port).await?;
            Ok(())
        },
        Some(Commands::Models { provider }) => {
            let provider = provider.and_then(|p| parse_provider(&p));
            print!("{}", repl::format_model_catalog(provider));
            Ok(())
        },
        Some(Commands::Config { action }) => run_config(action, &cli.common, cli.share_link.as_deref()).await,
        Some(Commands::Chat) | None => run_chat(cli.common, cli.share_link).await,
    }
}

/// `get` needs the fully merged configuration (store, file, env, share link,
/// CLI flags); `set`/`edit` only touch the config file directly.
async fn run_config(action: ConfigAction, common: &CommonArgs, share_link: Option<&str>) -> error::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let events = EventBus::default();
            let store = NamespacedStore::new(data_dir(), events);
            let config = build_config(common, share_link, &store).await?;
            config_commands::get(&config, key.as_deref())
        },
        ConfigAction::Set { key, value } => config_commands::set(&key, &value),
        ConfigAction::Edit => config_commands::edit(),
    }
}

fn parse_provider(raw: &str) -> Option<Provider> {
    Provider::ALL.into_iter().find(|p| p.as_str().eq_ignore_ascii_case(raw))
}

async fn run_chat(common: CommonArgs, share_link: Option<String>) -> error::Result<()> {
    let events = EventBus::default();
    let store = NamespacedStore::new(data_dir(), events.clone());

    let config = build_config(&common, share_link.as_deref(), &store).await?;
    hackare_config::persist(&config, &store).await?;

    let tools = Arc::new(ToolRegistry::new());
    tools.load_group("text");
    tools.load_group("math");

    let mut prompts = hackare_prompts::PromptLibrary::new(events);
    prompts.select("default.concise");

    let dispatcher = RegistryDispatcher::new(tools.clone());
    let mut session = ChatSession::new(config, dispatcher);

    let enabled_tools: Vec<(String, String)> =
        tools.tool_schemas().iter().filter_map(|s| Some((s["function"]["name"].as_str()?.to_string(), s["function"]["description"].as_str().unwrap_or_default().to_string()))).collect();
    session.refresh_system_prompt(&mut prompts, &enabled_tools);

    repl::run(&mut session, &tools, &mut prompts).await;
    Ok(())
}
