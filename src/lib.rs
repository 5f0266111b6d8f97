pub mod cli;
pub mod config;
pub mod export;
pub mod llm;
pub mod models;
pub mod persona;
pub mod server;
pub mod session;
pub mod terminal;

use cli::{ Args, ChatArgs, Command, LlmArgs, ServeArgs };
use config::prompt::resolve_prompts;
use export::Exporter;
use export::pdf::PageSize;
use export::raster::TranscriptRenderer;
use llm::chat::new_client as new_chat_client;
use log::info;
use persona::PersonaProxy;
use server::Server;
use session::backend::{ HttpPersonaBackend, PersonaBackend };
use session::ChatSession;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use terminal::Terminal;

fn build_proxy(llm: &LlmArgs) -> Result<PersonaProxy, Box<dyn Error + Send + Sync>> {
    let prompts = resolve_prompts(llm.prompts_path.as_deref())?;
    let chat_client = new_chat_client(&llm.to_config())?;
    Ok(PersonaProxy::new(chat_client, prompts))
}

async fn serve(llm: &LlmArgs, serve: &ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let proxy = Arc::new(build_proxy(llm)?);
    info!("Starting server on: {}", serve.server_addr);
    Server::new(serve.server_addr.clone(), proxy).run().await
}

async fn chat(llm: &LlmArgs, chat: &ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let prompts = resolve_prompts(llm.prompts_path.as_deref())?;
    let backend: Arc<dyn PersonaBackend> = if chat.local {
        info!("Persona backend: in-process");
        Arc::new(build_proxy(llm)?)
    } else {
        let http = HttpPersonaBackend::new(&chat.proxy_url, Duration::from_secs(chat.request_timeout_secs))?;
        info!("Persona backend: {}", http.endpoint());
        Arc::new(http)
    };

    let session = ChatSession::new(backend, prompts)
        .with_request_timeout(Duration::from_secs(chat.request_timeout_secs));
    let exporter = Exporter::new(TranscriptRenderer::default(), PageSize::with_width_mm(chat.page_width_mm));
    Terminal::new(session, exporter, PathBuf::from(&chat.export_dir)).run().await
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat Model: {}", args.llm.chat_model);
    info!("Chat Base URL: {}", args.llm.chat_base_url);
    info!("API Key Variable: {}", args.llm.api_key_env);
    info!("Provider Timeout: {}s", args.llm.chat_timeout_secs);
    info!("Prompts Path: {}", args.llm.prompts_path.as_deref().unwrap_or("built-in"));
    match &args.command {
        Command::Serve(s) => info!("Server Address: {}", s.server_addr),
        Command::Chat(c) => {
            info!("Proxy: {}", if c.local { "in-process" } else { c.proxy_url.as_str() });
            info!("Export Dir: {}", c.export_dir);
        }
    }
    info!("-------------------------");

    match &args.command {
        Command::Serve(s) => serve(&args.llm, s).await,
        Command::Chat(c) => chat(&args.llm, c).await,
    }
}
