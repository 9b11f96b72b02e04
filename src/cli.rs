use clap::{Args, Parser, Subcommand};

use spa_concierge::config::{DEFAULT_API_URL, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "concierge")]
#[command(version, about = "Spa concierge streaming chat client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the concierge from the terminal
    Chat(ChatArgs),

    /// Run the local dev chat backend
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ChatArgs {
    /// Backend origin, without the /api/v1 prefix
    #[arg(long, env = "CONCIERGE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Tenant (med spa) the conversation belongs to
    #[arg(long, env = "CONCIERGE_TENANT_ID")]
    pub tenant: String,

    /// Bearer token for authenticated deployments
    #[arg(long, env = "CONCIERGE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Args, Clone, Copy, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}
