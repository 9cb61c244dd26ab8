//! Command handlers.

pub mod backup;
pub mod config_cmd;
pub mod host;
pub mod objects;

use reqwest::Response;
use serde_json::Value;

use wapi_api::{Params, Session};

use crate::cli::{Command, GlobalOpts, QueryArgs};
use crate::error::CliError;

/// Dispatch a connected command to its handler.
pub async fn dispatch(
    cmd: Command,
    session: &mut Session,
    global: &GlobalOpts,
    page_size: u32,
) -> Result<(), CliError> {
    match cmd {
        Command::Schema => objects::schema(session, global),
        Command::Get(args) => objects::get(session, args, global).await,
        Command::Ref(args) => objects::by_reference(session, args, global).await,
        Command::List(args) => objects::list(session, args, global, page_size).await,
        Command::Delete(args) => objects::delete(session, args, global).await,
        Command::Host(args) => host::handle(session, args, global).await,
        Command::Backup(args) => backup::handle(session, args, global).await,
        // Config is handled before a session exists
        Command::Config(_) => unreachable!(),
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Build request parameters from `-P key=value` pairs and `--fields`.
pub fn query_params(query: &QueryArgs) -> Params {
    let mut params: Params = query.params.iter().cloned().collect();
    if let Some(ref fields) = query.fields {
        params.insert("_return_fields", fields);
    }
    params
}

/// Read a dispatcher response as JSON, turning a non-2xx status into an
/// error carrying the appliance's message.
pub async fn json_response(resp: Response) -> Result<Value, CliError> {
    let status = resp.status();
    let body = resp.text().await.map_err(wapi_api::Error::from)?;

    if !status.is_success() {
        return Err(CliError::ApiError {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| CliError::UnexpectedResponse {
        message: format!("{e} (body: {})", body.chars().take(200).collect::<String>()),
    })
}

/// WAPI errors are `{"Error": ..., "code": ..., "text": ...}`; prefer
/// the human-readable `text`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("text")
                .or_else(|| v.get("Error"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_text() {
        let body = r#"{"Error": "AdmConDataError: None (IBDataConflictError)",
                       "code": "Client.Ibap.Data.Conflict",
                       "text": "The record 'web.example.com' already exists."}"#;
        assert_eq!(
            error_message(body),
            "The record 'web.example.com' already exists."
        );
        assert_eq!(
            error_message(r#"{"Error": "AdmConProtoError: Unknown object type"}"#),
            "AdmConProtoError: Unknown object type"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn query_params_keep_order_and_fields() {
        let query = QueryArgs {
            params: vec![
                ("name~".into(), "web".into()),
                ("view".into(), "default".into()),
            ],
            fields: Some("name,ttl".into()),
        };

        let params = query_params(&query);

        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name~", "view", "_return_fields"]);
        assert_eq!(params.get("_return_fields"), Some("name,ttl"));
    }
}
