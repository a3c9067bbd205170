use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Data, ErrorExtensionValues, Executor, Request, Response, ServerError};
use binding::BindingError;
use futures::stream::BoxStream;
use futures::StreamExt;

/// Normalize an execution error for the public payload
///
/// When the error wraps exactly one upstream error carrying the same
/// message, its `code` and `requestId` are copied into the extensions.
pub fn format_error(mut error: ServerError) -> ServerError {
    let upstream = match error
        .source::<BindingError>()
        .and_then(BindingError::upstream_errors)
    {
        Some([only]) if only.message == error.message => only.clone(),
        _ => return error,
    };

    if upstream.code.is_none() && upstream.request_id.is_none() {
        return error;
    }
    let extensions = error.extensions.get_or_insert_with(ErrorExtensionValues::default);
    if let Some(code) = upstream.code {
        extensions.set("code", code);
    }
    if let Some(request_id) = upstream.request_id {
        extensions.set("requestId", request_id);
    }
    error
}

/// Apply [`format_error`] to every error of a response
pub fn format_response(mut response: Response) -> Response {
    response.errors = response.errors.into_iter().map(format_error).collect();
    response
}

/// Executor running the schema and formatting every response it emits,
/// subscription events included
#[derive(Clone)]
pub struct FormattingExecutor {
    schema: Schema,
}

impl FormattingExecutor {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }
}

impl Executor for FormattingExecutor {
    async fn execute(&self, request: Request) -> Response {
        format_response(self.schema.execute(request).await)
    }

    fn execute_stream(
        &self,
        request: Request,
        session_data: Option<Arc<Data>>,
    ) -> BoxStream<'static, Response> {
        self.schema
            .execute_stream_with_session_data(request, session_data.unwrap_or_default())
            .map(format_response)
            .boxed()
    }
}
