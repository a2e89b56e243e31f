use clap::Subcommand;

use crate::cli::tokens_cmd::TokensCmd;
use crate::cli::user_cmd::UserCmd;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "User account management",
        long_about = "Create accounts and list existing users without going through the web interface. Useful for bootstrapping the first administrator."
    )]
    User {
        #[command(subcommand)]
        cmd: UserCmd,
    },
    #[command(
        about = "Token maintenance",
        long_about = "Invalidate API tokens and browser sessions."
    )]
    Tokens {
        #[command(subcommand)]
        cmd: TokensCmd,
    },
}
