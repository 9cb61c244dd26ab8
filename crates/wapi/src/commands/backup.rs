//! Grid backup download.

use serde_json::json;

use wapi_api::Session;

use crate::cli::{BackupArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    session: &mut Session,
    args: BackupArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let written = session.download_backup(&args.folder).await?;
    let path = written.display().to_string();

    let out = if global.output == OutputFormat::Plain {
        path
    } else {
        output::render(global.output, &json!({ "path": path }))?
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
