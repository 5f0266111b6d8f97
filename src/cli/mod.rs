use clap::{ Args as ClapArgs, Parser, Subcommand };
use std::time::Duration;

use crate::llm::LlmConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the persona proxy HTTP server.
    Serve(ServeArgs),
    /// Interview a simulated patient from the terminal.
    Chat(ChatArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LlmArgs {
    // --- Chat LLM Provider Args ---
    /// Model name for chat completion (e.g., gpt-4, gpt-4o)
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4", global = true)]
    pub chat_model: String,

    /// Base URL of the OpenAI-compatible provider; `/v1/chat/completions` is appended
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://api.openai.com", global = true)]
    pub chat_base_url: String,

    /// Name of the environment variable holding the provider API key. Read on every request.
    #[arg(long, env = "CHAT_API_KEY_ENV", default_value = "OPENAI_API_KEY", global = true)]
    pub api_key_env: String,

    /// Timeout in seconds for one provider call.
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "60", global = true)]
    pub chat_timeout_secs: u64,

    /// Optional JSON file overriding the persona instruction, case template and fallback reply.
    #[arg(long, env = "PROMPTS_PATH", global = true)]
    pub prompts_path: Option<String>,
}

impl LlmArgs {
    pub fn to_config(&self) -> LlmConfig {
        LlmConfig {
            api_key_env: self.api_key_env.clone(),
            completion_model: Some(self.chat_model.clone()),
            base_url: Some(self.chat_base_url.clone()),
            timeout: Duration::from_secs(self.chat_timeout_secs),
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// Base URL of a running `kinbot serve`.
    #[arg(long, env = "PROXY_URL", default_value = "http://127.0.0.1:3000")]
    pub proxy_url: String,

    /// Call the provider in-process instead of going through a proxy server.
    #[arg(long, env = "LOCAL", default_value = "false")]
    pub local: bool,

    /// Directory the PDF transcript is written to.
    #[arg(long, env = "EXPORT_DIR", default_value = ".")]
    pub export_dir: String,

    /// Seconds to wait for a reply before giving up on a message.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "90")]
    pub request_timeout_secs: u64,

    /// Page width of the exported PDF, in millimetres (A4 is 210).
    #[arg(long, env = "PAGE_WIDTH_MM", default_value = "210")]
    pub page_width_mm: f32,
}
