//! Output formatting: JSON, YAML, plain.
//!
//! Structured formats serialize the value as-is; plain emits one object
//! reference per line so results pipe into other commands.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render any serializable value in the chosen format.
///
/// `plain` walks the JSON form: arrays emit one line per element,
/// objects emit their `_ref` and strings print as-is.
pub fn render<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => plain(&serde_json::to_value(data)?),
    })
}

/// Render one object of a stream. JSON is compacted to a single line so
/// the stream stays line-delimited.
pub fn render_item(format: OutputFormat, item: &Value) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => Ok(serde_json::to_string(item)?),
        OutputFormat::Yaml => Ok(format!("---\n{}", serde_yaml::to_string(item)?)),
        OutputFormat::Plain => Ok(plain(item)),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(plain)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .get("_ref")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_default(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_prints_references() {
        let objects = json!([
            { "_ref": "network/ZG5z:10.0.0.0/8/default", "network": "10.0.0.0/8" },
            { "network": "no-ref" },
            { "_ref": "network/ZG5z:192.168.0.0/16/default" }
        ]);

        assert_eq!(
            render(OutputFormat::Plain, &objects).unwrap(),
            "network/ZG5z:10.0.0.0/8/default\nnetwork/ZG5z:192.168.0.0/16/default"
        );
    }

    #[test]
    fn plain_prints_bare_strings() {
        // create and update return the new reference as a JSON string
        let created = json!("record:host/ZG5z:web.example.com/default");
        assert_eq!(
            render(OutputFormat::Plain, &created).unwrap(),
            "record:host/ZG5z:web.example.com/default"
        );
        assert_eq!(render(OutputFormat::Plain, &json!(true)).unwrap(), "true");
    }

    #[test]
    fn stream_items_are_single_line() {
        let item = json!({ "_ref": "networkview/ZG5z:default/true", "name": "default" });
        let line = render_item(OutputFormat::Json, &item).unwrap();
        assert!(!line.contains('\n'));
        assert!(render_item(OutputFormat::Yaml, &item).unwrap().starts_with("---\n"));
    }
}
