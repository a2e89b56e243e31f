use super::CommandRunner;
use crate::cli;
use crate::storage::Storage;
use anyhow::{Context, Result};

impl CommandRunner for cli::TokensCmd {
    fn run<S: Storage>(&self, storage: &S) -> Result<()> {
        match self {
            cli::TokensCmd::ExpireAll { kind } => {
                let expired = storage
                    .expire_tokens(kind.map(Into::into))
                    .context("expiring tokens")?;
                log::info!("🧹 {} tokens invalidated", expired);
                Ok(())
            }
        }
    }
}
