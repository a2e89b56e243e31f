mod app;
mod auth;
mod cli;
mod commands;
mod configuration;
mod context;
mod pagination;
mod rest;
mod storage;
mod summary;
mod tracing;
mod types;
mod vocabulary;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
