mod args;
mod command;
mod tokens_cmd;
mod user_cmd;

pub use args::Cli;
pub use command::Command;
pub use tokens_cmd::TokensCmd;
pub use user_cmd::UserCmd;

pub use args::parse;
