//! Host record command handlers.

use serde_json::json;

use wapi_api::{NewHost, Session};

use crate::cli::{GlobalOpts, HostArgs, HostCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::json_response;

fn as_strs(addresses: &[String]) -> Vec<&str> {
    addresses.iter().map(String::as_str).collect()
}

pub async fn handle(
    session: &mut Session,
    args: HostArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = match args.command {
        HostCommand::Find { name, view } => {
            let found = json_response(session.find_host(&name, &view).await?).await?;
            if found.as_array().is_some_and(Vec::is_empty) {
                return Err(CliError::NotFound {
                    resource_type: "host record".into(),
                    identifier: name,
                });
            }
            found
        }

        HostCommand::Create {
            name,
            addresses,
            view,
            ttl,
            comment,
        } => {
            let host = NewHost::new(name, &as_strs(&addresses))?
                .view(view)
                .ttl(ttl.unwrap_or_default())
                .comment(comment.unwrap_or_default());
            json_response(session.create_host(&host).await?).await?
        }

        HostCommand::Available {
            address,
            network_view,
        } => {
            let available = session.is_ip_available(&address, &network_view).await?;
            json!({ "ipv4addr": address, "network_view": network_view, "available": available })
        }

        HostCommand::SetTtl { reference, ttl } => {
            json_response(session.update_host_ttl(&reference, ttl).await?).await?
        }

        HostCommand::SetComment { reference, comment } => {
            json_response(session.update_host_comment(&reference, &comment).await?).await?
        }

        HostCommand::SetAddresses {
            reference,
            addresses,
        } => {
            let resp = session
                .update_host_addresses(&reference, &as_strs(&addresses))
                .await?;
            json_response(resp).await?
        }
    };

    let out = match (global.output, result.get("available")) {
        // `plain` has no `_ref` to print for an availability check
        (OutputFormat::Plain, Some(available)) => available.to_string(),
        _ => output::render(global.output, &result)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
