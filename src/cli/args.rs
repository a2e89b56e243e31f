use clap::Parser;
use std::env;

use crate::cli::command::Command;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Track digital media accessions and serve the medialog JSON API",
    long_about = "Records repositories, resources, accessions and media entries in SQLite and serves them over a token-authenticated REST API with cookie-backed browser sessions.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        env = "MEDIALOG_DATA_DIR",
        default_value = ".medialog/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long = "log-file",
        env = "MEDIALOG_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "MEDIALOG_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8080",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[arg(
        long = "expire-tokens-on-start",
        env = "MEDIALOG_EXPIRE_TOKENS_ON_START",
        default_value_t = false,
        help = "Invalidate every API token and browser session before serving"
    )]
    pub expire_tokens_on_start: bool,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    println!("Loaded env from {}", dotenv_path);
    Cli::parse()
}
