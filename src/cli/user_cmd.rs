use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum UserCmd {
    #[command(
        about = "Create a user",
        long_about = "Create an active user with the given email and password. Use --admin and --api to grant the administrator role and API access."
    )]
    Create {
        #[arg(long, value_name = "EMAIL", help = "Login email, must be unique")]
        email: String,
        #[arg(
            long,
            env = "MEDIALOG_USER_PASSWORD",
            value_name = "PASSWORD",
            help = "Initial password"
        )]
        password: String,
        #[arg(long, default_value = "", value_name = "NAME")]
        first_name: String,
        #[arg(long, default_value = "", value_name = "NAME")]
        last_name: String,
        #[arg(long, default_value_t = false, help = "Grant the administrator role")]
        admin: bool,
        #[arg(long, default_value_t = false, help = "Allow API logins")]
        api: bool,
    },
    #[command(about = "List users")]
    List,
}
