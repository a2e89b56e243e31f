use crate::cli::Command;
use crate::storage::Storage;

pub mod tokens;
pub mod user;

pub trait CommandRunner {
    fn run<S: Storage>(&self, storage: &S) -> anyhow::Result<()>;
}

impl Command {
    pub fn run<S: Storage>(&self, storage: &S) -> anyhow::Result<()> {
        match self {
            Command::User { cmd } => cmd.run(storage),
            Command::Tokens { cmd } => cmd.run(storage),
        }
    }
}
