//! Clap derive structures for the `wapi` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wapi -- query and manage an Infoblox grid over WAPI
#[derive(Debug, Parser)]
#[command(
    name = "wapi",
    version,
    about = "Query and manage a grid manager through its WAPI REST interface",
    long_about = "Logs in once per invocation, runs the command, and logs out.\n\n\
        Connection details come from a profile in the config file, \
        overridable with flags or WAPI_* environment variables.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "WAPI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// WAPI base URL including the version (overrides profile)
    #[arg(long, short = 'u', env = "WAPI_URL", global = true)]
    pub url: Option<String>,

    /// PEM bundle used to verify the grid manager certificate
    #[arg(long, env = "WAPI_CA_BUNDLE", global = true)]
    pub ca_bundle: Option<PathBuf>,

    /// Skip certificate verification
    #[arg(long, short = 'k', env = "WAPI_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "WAPI_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WAPI_OUTPUT",
        default_value = "json",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// One object reference per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the schema returned at login
    Schema,

    /// Fetch objects of a type in a single request
    Get(GetArgs),

    /// Fetch one object by reference
    #[command(name = "ref")]
    Ref(RefArgs),

    /// Fetch every object of a type, following page cursors
    #[command(alias = "ls")]
    List(ListArgs),

    /// Delete an object by reference
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Manage host records
    Host(HostArgs),

    /// Download a grid backup
    Backup(BackupArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Query parameters as repeated `key=value` pairs.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query parameter as key=value (repeatable), e.g. -P name~=web
    #[arg(long = "param", short = 'P', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Comma-separated `_return_fields`
    #[arg(long, short = 'f')]
    pub fields: Option<String>,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

// ── Object Commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Object type, e.g. network or record:a
    pub object_type: String,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Args)]
pub struct RefArgs {
    /// Object reference (`_ref`)
    pub reference: String,

    /// Comma-separated `_return_fields`
    #[arg(long, short = 'f')]
    pub fields: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Object type, e.g. networkview
    pub object_type: String,

    /// Objects requested per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Print objects as pages arrive instead of after the last page
    #[arg(long)]
    pub stream: bool,

    /// Fail instead of printing partial results when a page is refused
    #[arg(long, conflicts_with = "stream")]
    pub strict: bool,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Object reference (`_ref`)
    pub reference: String,
}

// ── Host Records ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HostArgs {
    #[command(subcommand)]
    pub command: HostCommand,
}

#[derive(Debug, Subcommand)]
pub enum HostCommand {
    /// Find host records by name
    Find {
        /// Fully qualified host name
        name: String,

        /// DNS view
        #[arg(long, default_value = "default")]
        view: String,
    },

    /// Create a host record
    Create {
        /// Fully qualified host name
        name: String,

        /// IPv4 addresses (one or more)
        #[arg(required = true)]
        addresses: Vec<String>,

        /// DNS view
        #[arg(long, default_value = "default")]
        view: String,

        /// Record TTL in seconds
        #[arg(long)]
        ttl: Option<u32>,

        /// Free-form comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Check whether no host record holds an address
    Available {
        /// IPv4 address
        address: String,

        /// Network view
        #[arg(long, default_value = "default")]
        network_view: String,
    },

    /// Set the TTL of a host record
    SetTtl {
        /// Host record reference
        reference: String,

        /// TTL in seconds
        ttl: u32,
    },

    /// Set the comment of a host record
    SetComment {
        /// Host record reference
        reference: String,

        /// New comment
        comment: String,
    },

    /// Replace the addresses of a host record
    SetAddresses {
        /// Host record reference
        reference: String,

        /// IPv4 addresses (one or more)
        #[arg(required = true)]
        addresses: Vec<String>,
    },
}

// ── Backup ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Folder receiving `<request id>/<file>`
    pub folder: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration (passwords redacted)
    Show,

    /// Store a profile password in the system keyring
    SetPassword,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("name~=web=1"),
            Ok(("name~".to_owned(), "web=1".to_owned()))
        );
        assert_eq!(parse_key_val("comment="), Ok(("comment".to_owned(), String::new())));
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn command_tree_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
