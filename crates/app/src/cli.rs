//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Storekeeper command-line client
#[derive(Debug, Parser)]
#[command(name = "storekeeper")]
#[command(about = "Sign in to a Storekeeper backend and call its API")]
#[command(version)]
pub struct Args {
    /// Configuration file path (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding the configuration file
    #[arg(long, global = true, env = "STOREKEEPER_BASE_URL")]
    pub base_url: Option<String>,

    /// Keep the session in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login(LoginArgs),

    /// Create a store-owner account (or promote an existing one) and sign in
    Register(RegisterArgs),

    /// Sign out and wipe the stored session
    Logout,

    /// Print the signed-in user
    Whoami,

    /// Print the session status
    Status,

    /// Send an authenticated GET
    Get {
        /// Path resolved against the base URL, e.g. /api/shops
        path: String,
    },

    /// Send an authenticated JSON POST
    Post {
        /// Path resolved against the base URL
        path: String,

        /// JSON body
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
}

/// Arguments of `login`.
#[derive(Debug, ClapArgs)]
pub struct LoginArgs {
    /// Login identifier, usually an email address
    pub identifier: String,

    /// Password
    #[arg(long, env = "STOREKEEPER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments of `register`.
#[derive(Debug, ClapArgs)]
pub struct RegisterArgs {
    /// Given name
    #[arg(long)]
    pub first_name: String,

    /// Family name
    #[arg(long)]
    pub last_name: String,

    /// Contact email
    #[arg(long)]
    pub email: String,

    /// Login identifier (defaults to the email)
    #[arg(long)]
    pub login: Option<String>,

    /// Password
    #[arg(long, env = "STOREKEEPER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_login_arguments() {
        let args = Args::try_parse_from([
            "storekeeper",
            "login",
            "alice@example.com",
            "--password",
            "secret",
            "--ephemeral",
        ])
        .unwrap();

        assert!(args.ephemeral);
        assert_eq!(args.log_level, "warn");
        let Command::Login(login) = args.command else {
            panic!("expected login, got {:?}", args.command);
        };
        assert_eq!(login.identifier, "alice@example.com");
        assert_eq!(login.password, "secret");
    }

    #[test]
    fn test_post_defaults_to_empty_object() {
        let args = Args::try_parse_from(["storekeeper", "post", "/api/shops"]).unwrap();

        let Command::Post { path, data } = args.command else {
            panic!("expected post, got {:?}", args.command);
        };
        assert_eq!(path, "/api/shops");
        assert_eq!(data, "{}");
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Args::try_parse_from(["storekeeper"]).is_err());
    }

    #[test]
    fn test_arguments_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
