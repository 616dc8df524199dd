//! Subcommand handlers.

use anyhow::{Context, Result, bail};
use storekeeper_application::{GatewayError, LoginInput, RegisterInput};
use storekeeper_domain::{AuthError, ResponseSpec, SignupRequest};

use crate::cli::{Command, LoginArgs, RegisterArgs};
use crate::context::AppContext;

/// Runs `command` against `context`.
///
/// # Errors
///
/// Returns the user-facing failure of the command.
pub async fn run(context: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Login(args) => login(context, args).await,
        Command::Register(args) => register(context, args).await,
        Command::Logout => {
            context.sessions.logout().await?;
            println!("Signed out");
            Ok(())
        }
        Command::Whoami => whoami(context).await,
        Command::Status => {
            println!("{}", context.sessions.status().await.display_message());
            println!("Backend: {}", context.config.base_url);
            Ok(())
        }
        Command::Get { path } => print_response(context.gateway.get(&path).await),
        Command::Post { path, data } => {
            let body: serde_json::Value =
                serde_json::from_str(&data).context("--data must be valid JSON")?;
            print_response(context.gateway.post_json(&path, &body).await)
        }
    }
}

async fn login(context: &AppContext, args: LoginArgs) -> Result<()> {
    let session = context
        .sessions
        .login(LoginInput {
            identifier: args.identifier,
            password: args.password,
        })
        .await
        .map_err(user_error)?;
    println!("Signed in as {}", session.identity.display_name());
    Ok(())
}

async fn register(context: &AppContext, args: RegisterArgs) -> Result<()> {
    let login = args.login.unwrap_or_else(|| args.email.clone());
    let session = context
        .sessions
        .register(RegisterInput {
            request: SignupRequest {
                first_name: args.first_name,
                last_name: args.last_name,
                login,
                email: args.email,
                password: args.password,
            },
        })
        .await
        .map_err(user_error)?;
    println!(
        "Registered and signed in as {}",
        session.identity.display_name()
    );
    Ok(())
}

async fn whoami(context: &AppContext) -> Result<()> {
    let Some(identity) = context.store.identity().await else {
        bail!("Not signed in. Run `storekeeper login` first.");
    };
    println!("{} ({})", identity.display_name(), identity.user_id);
    Ok(())
}

fn print_response(result: Result<ResponseSpec, GatewayError>) -> Result<()> {
    let response = result.map_err(|e| user_error(e.into()))?;
    println!("{}", render_body(&response.body));
    Ok(())
}

/// Pretty-prints JSON bodies; anything else is returned unchanged.
fn render_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}

fn user_error(error: AuthError) -> anyhow::Error {
    anyhow::anyhow!("{} ({:?})", error.message(), error.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storekeeper_domain::AuthErrorKind;

    #[test]
    fn test_json_bodies_are_pretty_printed() {
        assert_eq!(render_body(r#"{"id":1}"#), "{\n  \"id\": 1\n}");
        assert_eq!(render_body("plain text"), "plain text");
        assert_eq!(render_body(""), "");
    }

    #[test]
    fn test_user_error_names_the_kind() {
        let error = user_error(AuthError::NetworkError {
            message: "connection refused".to_string(),
        });
        assert_eq!(
            error.to_string(),
            format!("connection refused ({:?})", AuthErrorKind::NetworkError)
        );
    }
}
