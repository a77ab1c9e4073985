//! Clinica CLI - command-line client for the clinic API
//!
//! Signs in against a running `clinica-server`, keeps the token in a local
//! session file and reports the current authentication state.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use clinica::auth::models::{AuthUser, LoginRequest, SignUpRequest, UserType};
use clinica::client::{ApiClient, AuthClient, FileTokenStore, Session};
use clinica::config::ClientConfig;
use clinica::format::{clean_numbers, format_cpf, validate_cpf};
use clinica::logging;

#[derive(Parser)]
#[command(name = "clinica")]
#[command(author, version, about = "Clinic API command-line client", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the API (or set API_URL / VITE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session token is kept (or set CLINICA_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with e-mail or CPF
    Login {
        identifier: String,

        #[arg(long, env = "CLINICA_PASSWORD", hide_env_values = true)]
        password: String,

        /// paciente, medico, gestor, recepcionista, estoque or farmacia
        #[arg(long)]
        user_type: UserType,
    },

    /// Create an account and sign in
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long, env = "CLINICA_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        cpf: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        user_type: UserType,
    },

    /// Revoke the token and clear the local session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Print every auth-state change until Ctrl-C
    Watch {
        /// Seconds between server-side checks (at least 1)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Mask a CPF and check its verification digits
    Cpf { value: String },
}

fn print_user(user: &AuthUser) {
    println!("{} ({})", user.name.as_deref().unwrap_or("-"), user.user_type);
    if let Some(email) = &user.email {
        println!("  e-mail: {email}");
    }
    println!("  id:     {}", user.id);
}

fn auth_client(cli: &Cli, config: ClientConfig) -> Result<AuthClient> {
    let api_url = cli.api_url.clone().unwrap_or(config.api_url);
    let session_file = cli.session_file.clone().unwrap_or(config.session_file);
    tracing::debug!("session file: {}", session_file.display());

    let session = Session::new(FileTokenStore::new(session_file));
    let api = ApiClient::new(&api_url, session)?;
    Ok(AuthClient::new(api).with_poll_interval(config.poll_interval))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_tracing("warn");

    let cli = Cli::parse();

    if let Commands::Cpf { value } = &cli.command {
        let digits = clean_numbers(value);
        let verdict = if validate_cpf(&digits) { "válido" } else { "inválido" };
        println!("{} ({verdict})", format_cpf(&digits));
        return Ok(());
    }

    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let auth = auth_client(&cli, config)?;

    match cli.command {
        Commands::Login {
            identifier,
            password,
            user_type,
        } => {
            let user = auth
                .login(&LoginRequest {
                    identifier,
                    password,
                    user_type,
                })
                .await?;
            println!("Login realizado com sucesso");
            print_user(&user);
        }
        Commands::Signup {
            email,
            password,
            cpf,
            name,
            user_type,
        } => {
            let user = auth
                .sign_up(&SignUpRequest {
                    email,
                    password,
                    cpf,
                    name,
                    user_type,
                })
                .await?;
            println!("Cadastro realizado com sucesso");
            print_user(&user);
        }
        Commands::Logout => {
            let result = auth.logout().await;
            println!("Sessão encerrada");
            result.context("servidor não confirmou o logout")?;
        }
        Commands::Whoami => {
            let user = auth.current_user().await?;
            print_user(&user);
        }
        Commands::Watch { interval } => {
            let auth = match interval {
                Some(secs) => auth.with_poll_interval(Duration::from_secs(secs)),
                None => auth,
            };
            println!(
                "Monitorando sessão a cada {}s (Ctrl-C para sair)",
                auth.poll_interval().as_secs()
            );

            let subscription = auth.on_auth_state_change(|user| match user {
                Some(user) => println!("autenticado: {} ({})", user.id, user.user_type),
                None => println!("não autenticado"),
            });
            tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
            subscription.unsubscribe().await;
        }
        Commands::Cpf { .. } => {}
    }

    Ok(())
}
