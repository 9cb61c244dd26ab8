//! Generic object commands: schema, get, ref, list, delete.

use futures_util::StreamExt;
use tracing::warn;

use wapi_api::{Params, Session};

use crate::cli::{DeleteArgs, GetArgs, GlobalOpts, ListArgs, OutputFormat, RefArgs};
use crate::error::CliError;
use crate::output;

use super::{json_response, query_params};

pub fn schema(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let schema = session.schema();
    let out = if global.output == OutputFormat::Plain {
        schema.supported_objects().join("\n")
    } else {
        output::render(global.output, schema)?
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn get(session: &mut Session, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let params = query_params(&args.query);
    let resp = session.get(&args.object_type, &params).await?;
    let objects = json_response(resp).await?;

    output::print_output(&output::render(global.output, &objects)?, global.quiet);
    Ok(())
}

pub async fn by_reference(
    session: &mut Session,
    args: RefArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut params = Params::new();
    if let Some(ref fields) = args.fields {
        params.insert("_return_fields", fields);
    }

    let resp = session.get_by_reference(&args.reference, &params).await?;
    let object = match json_response(resp).await {
        Err(CliError::ApiError { status: 404, .. }) => {
            return Err(CliError::NotFound {
                resource_type: "object".into(),
                identifier: args.reference,
            });
        }
        other => other?,
    };

    output::print_output(&output::render(global.output, &object)?, global.quiet);
    Ok(())
}

pub async fn list(
    session: &mut Session,
    args: ListArgs,
    global: &GlobalOpts,
    default_page_size: u32,
) -> Result<(), CliError> {
    let params = query_params(&args.query);
    let page_size = args.page_size.unwrap_or(default_page_size);

    if args.stream {
        let mut stream = session.stream(&args.object_type, &params, page_size)?;
        while let Some(item) = stream.next().await {
            let object = item?;
            output::print_output(&output::render_item(global.output, &object)?, global.quiet);
        }
        return Ok(());
    }

    let set = session
        .pager(&args.object_type)
        .params(params)
        .page_size(page_size)
        .collect()
        .await?;

    let objects = if args.strict {
        set.into_complete()?
    } else {
        if let Some(ref halted) = set.halted {
            warn!(
                status = %halted.status,
                page = halted.page,
                "printing partial results"
            );
        }
        set.objects
    };

    output::print_output(&output::render(global.output, &objects)?, global.quiet);
    Ok(())
}

pub async fn delete(
    session: &mut Session,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resp = session.delete(&args.reference).await?;
    let deleted = json_response(resp).await?;

    output::print_output(&output::render(global.output, &deleted)?, global.quiet);
    Ok(())
}
