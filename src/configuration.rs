use std::net::SocketAddr;
use std::path::PathBuf;

pub const DB_FILE: &str = "medialog.sqlite";

#[derive(Clone, Debug)]
pub struct Configuration {
    pub data_dir: String,
    pub api_listen: SocketAddr,
    pub log_file: Option<String>,
    pub reset: bool,
    pub expire_tokens_on_start: bool,
}

impl Configuration {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }
}
