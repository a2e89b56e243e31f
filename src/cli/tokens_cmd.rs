use clap::{Subcommand, ValueEnum};

use crate::types::TokenKind;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum KindArg {
    Api,
    Application,
}

impl From<KindArg> for TokenKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Api => TokenKind::Api,
            KindArg::Application => TokenKind::Application,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TokensCmd {
    #[command(
        about = "Invalidate every valid token",
        long_about = "Mark every valid token as invalid, logging out all API clients and browser sessions. Restrict to one kind with --kind."
    )]
    ExpireAll {
        #[arg(long, value_enum, value_name = "KIND")]
        kind: Option<KindArg>,
    },
}
