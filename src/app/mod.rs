mod wiring;

use crate::{cli, context, rest, storage, storage::StorageWrite};
use anyhow::{Context as AnyhowContext, Result};
use std::{future::Future, path::Path};
use tokio_util::sync::CancellationToken;

pub struct App {
    pub ctx: context::Context,
    pub storage: storage::SqliteStorage,
}

impl App {
    pub fn from_cli() -> Result<(Self, cli::Cli)> {
        let cli = crate::cli::parse();
        let ctx = context::Context::from_cli(&cli);

        crate::tracing::init(ctx.config.log_file.as_deref().map(Path::new));
        log::info!("🚀 Starting medialog {}", env!("CARGO_PKG_VERSION"));
        log::info!("📂 Data dir: {}", ctx.config.data_dir);

        wiring::init_data_dir(&ctx).context("initializing data dir")?;
        let storage = wiring::init_storage(&ctx)?;

        Ok((Self { ctx, storage }, cli))
    }
}

pub async fn run_daemon(app: App) -> Result<()> {
    log::info!("🌐 REST API: http://{}", app.ctx.config.api_listen);
    if let Some(path) = app.ctx.config.log_file.as_deref() {
        log::info!("📝 Log file: {}", path);
    }

    if app.ctx.config.expire_tokens_on_start {
        let expired = app
            .storage
            .expire_tokens(None)
            .context("expiring tokens on start")?;
        log::info!("🧹 {} tokens invalidated on start", expired);
    }

    serve_until(app, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("🧨 Ctrl-C received, shutting down"),
            Err(e) => log::error!("listening for Ctrl-C failed: {}", e),
        }
    })
    .await?;

    log::info!("✅ Shutdown complete");
    Ok(())
}

/// Run the REST server until `stop` resolves or the server itself exits.
async fn serve_until(app: App, stop: impl Future<Output = ()>) -> Result<()> {
    let shutdown = CancellationToken::new();
    let mut rest_handle = tokio::spawn(rest::serve(
        app.ctx.config.api_listen,
        app.storage.clone(),
        shutdown.clone(),
    ));

    let finished = tokio::select! {
        _ = stop => None,
        res = &mut rest_handle => Some(res),
    };

    shutdown.cancel();
    let res = match finished {
        Some(res) => res,
        None => rest_handle.await,
    };
    res.context("REST task panicked")?
        .context("REST server failed")?;
    Ok(())
}

pub async fn run() -> Result<()> {
    let (app, cli) = App::from_cli()?;

    if let Some(cmd) = &cli.cmd {
        // one-shot command mode
        cmd.run(&app.storage)?;
        return Ok(());
    }

    run_daemon(app).await
}
