#[derive(Debug, clap::Parser)]
#[command(name = "mcp")]
#[command(about = "Serve the YouTube tools to an MCP host")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Line-delimited JSON-RPC on stdin/stdout, for hosts that spawn the server
    #[clap(name = "stdio")]
    Stdio,

    /// JSON-RPC over HTTP with an SSE stream, for hosts that connect to a URL
    #[clap(name = "sse")]
    Sse(SseOptions),
}

#[derive(Debug, clap::Args)]
pub struct SseOptions {
    /// Port to listen on
    #[arg(short, long, env = "YTMCP_SSE_PORT", default_value = "3000")]
    pub port: u16,

    /// Address to bind; keep it on loopback unless the host is remote
    #[arg(long, env = "YTMCP_SSE_HOST", default_value = "127.0.0.1")]
    pub host: String,
}

impl SseOptions {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
