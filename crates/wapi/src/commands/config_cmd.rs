//! Config subcommand handlers.

use wapi_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Replace every plaintext password so `config show` is safe to paste.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
    }
    cfg
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = wapi_config::config_path();
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(wapi_config::load_config()?);
            let out = match global.output {
                OutputFormat::Plain => {
                    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
                    names.sort_unstable();
                    names.join("\n")
                }
                format => output::render(format, &cfg)?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = wapi_config::load_config()?;
            let profile_name = global
                .profile
                .clone()
                .or(cfg.default_profile)
                .unwrap_or_else(|| "default".into());

            let password = rpassword::prompt_password(format!("Password for '{profile_name}': "))?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            wapi_config::store_password(&profile_name, &password)?;
            if !global.quiet {
                eprintln!("Password for '{profile_name}' stored in the system keyring");
            }
            Ok(())
        }
    }
}
