mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use wapi_api::{ScopedSession, Session};
use wapi_config::{Config, Profile};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the network
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        cmd => {
            let cfg = wapi_config::load_config()?;
            let target = Target::resolve(&cfg, &cli.global)?;
            let mut session = target.connect().await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &mut session, &cli.global, target.page_size).await;

            // Log out even when the command failed; its error wins.
            let closed = session.close().await;
            result?;
            closed?;
            Ok(())
        }
    }
}

// ── Connection ──────────────────────────────────────────────────────

/// Everything needed to open a session, after merging profile and flags.
struct Target {
    profile_name: String,
    profile: Profile,
    url: String,
    transport: wapi_api::TransportConfig,
    page_size: u32,
}

impl Target {
    /// Merge the active profile with CLI flags (flag > env > profile).
    fn resolve(cfg: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let profile_name = global
            .profile
            .clone()
            .or_else(|| cfg.default_profile.clone())
            .unwrap_or_else(|| "default".into());

        let mut profile = cfg.profiles.get(&profile_name).cloned().unwrap_or_default();
        if let Some(ref url) = global.url {
            profile.url.clone_from(url);
        }
        if let Some(ref bundle) = global.ca_bundle {
            profile.ca_bundle = Some(bundle.clone());
        }
        if global.insecure {
            profile.insecure = Some(true);
        }
        if let Some(timeout) = global.timeout {
            profile.timeout = Some(timeout);
        }

        if profile.url.is_empty() {
            return Err(CliError::NoConfig {
                profile: profile_name,
                path: wapi_config::config_path().display().to_string(),
            });
        }

        let url = wapi_config::validate_url(&profile.url)?;
        let transport = wapi_config::profile_transport(&profile, &cfg.defaults);
        let page_size = wapi_config::profile_page_size(&profile, &cfg.defaults);

        Ok(Self {
            profile_name,
            profile,
            url,
            transport,
            page_size,
        })
    }

    /// Log in and wrap the session so it logs out when the command ends.
    async fn connect(&self) -> Result<ScopedSession, CliError> {
        let (username, password) = self.credentials()?;

        let mut session = Session::with_base_url(&self.url, self.transport.clone())?;
        session.login(&username, &password).await?;
        if !session.is_authenticated() {
            return Err(CliError::AuthFailed {
                profile: self.profile_name.clone(),
            });
        }

        Ok(session.enter()?)
    }

    /// Config chain first, then an interactive password prompt.
    fn credentials(&self) -> Result<(String, SecretString), CliError> {
        let username = wapi_config::resolve_username(&self.profile).ok_or_else(|| {
            CliError::NoCredentials {
                profile: self.profile_name.clone(),
            }
        })?;

        let password = match wapi_config::resolve_password(&self.profile, &self.profile_name) {
            Some(password) => password,
            None => {
                let typed = rpassword::prompt_password(format!("Password for {username}: "))?;
                if typed.is_empty() {
                    return Err(CliError::NoCredentials {
                        profile: self.profile_name.clone(),
                    });
                }
                SecretString::from(typed)
            }
        };

        Ok((username, password))
    }
}
