use crate::store::{lookup_to_json, DirectoryRecord, DirectoryStore, StoreError};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use lambda_http::http::{header, StatusCode};
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const PUT_DIR: &str = "putDir";
const GET_DIR: &str = "getDir";

#[derive(Deserialize)]
struct PutDirectoryRequest {
    #[serde(rename = "userID")]
    user_id: Option<String>,
    #[serde(rename = "userDir")]
    user_dir: Option<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode response body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to build response: {0}")]
    Http(#[from] lambda_http::http::Error),
}

/// Every response carries the same two headers, whatever the status.
fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
) -> Result<Response<Body>, HandlerError> {
    let body = serde_json::to_string(body)?;
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::Text(body))?)
}

fn bad_request(message: impl Into<String>) -> Result<Response<Body>, HandlerError> {
    json_response(StatusCode::BAD_REQUEST, &MessageResponse::new(message))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// Renders a supplied value for error messages: quoted, or `None` when absent.
fn shown(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("'{}'", v),
        None => "None".to_string(),
    }
}

// The body must be a JSON object; positional arrays are rejected.
fn decode_put_request(body: &[u8]) -> Result<PutDirectoryRequest, serde_json::Error> {
    let fields: Map<String, Value> = serde_json::from_slice(body)?;
    serde_json::from_value(Value::Object(fields))
}

async fn put_dir<S>(store: &S, event: &Request) -> Result<Response<Body>, HandlerError>
where
    S: DirectoryStore + ?Sized,
{
    let req = match decode_put_request(event.body().as_ref()) {
        Ok(req) => req,
        Err(e) => return bad_request(format!("Invalid JSON: {}", e)),
    };

    let user_id = req.user_id.as_deref();
    let user_dir = req.user_dir.as_deref();
    tracing::info!("Updating directory for userID={}", shown(user_id));

    let (Some(id), Some(dir)) = (non_empty(user_id), non_empty(user_dir)) else {
        return bad_request(format!(
            "Could not update directory. Check userID={} and userDir={}",
            shown(user_id),
            shown(user_dir)
        ));
    };

    let record = DirectoryRecord {
        user_id: id.to_string(),
        user_dir: dir.to_string(),
    };
    store.put_directory(&record).await?;

    json_response(
        StatusCode::OK,
        &MessageResponse::new("Successfully created item!"),
    )
}

async fn get_dir<S>(store: &S, event: &Request) -> Result<Response<Body>, HandlerError>
where
    S: DirectoryStore + ?Sized,
{
    let user_id = event
        .query_string_parameters_ref()
        .and_then(|params| params.first("userID"));
    tracing::info!("Getting directory for userID={}", shown(user_id));

    let Some(user_id) = non_empty(user_id) else {
        return bad_request(format!(
            "Unable to fetch user directory for userID={}",
            shown(user_id)
        ));
    };

    let item = store.get_directory(user_id).await?;
    json_response(StatusCode::OK, &lookup_to_json(item.as_ref()))
}

async fn dispatch<S>(store: &S, event: &Request) -> Result<Response<Body>, HandlerError>
where
    S: DirectoryStore + ?Sized,
{
    let action = event
        .query_string_parameters_ref()
        .and_then(|params| params.first("action"));
    tracing::info!("Processing event with action={}", shown(action));

    match action {
        Some(PUT_DIR) => put_dir(store, event).await,
        Some(GET_DIR) => get_dir(store, event).await,
        _ => bad_request("Invalid request"),
    }
}

pub(crate) async fn function_handler<S>(
    store: &S,
    event: Request,
) -> Result<Response<Body>, Error>
where
    S: DirectoryStore + ?Sized,
{
    match dispatch(store, &event).await {
        Ok(response) => Ok(response),
        Err(err) => {
            match &err {
                HandlerError::Store(e) => tracing::error!(
                    error = %DisplayErrorContext(e),
                    "directory store call failed"
                ),
                other => tracing::error!(error = %other, "failed to produce response"),
            }
            Ok(json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &MessageResponse::new("Internal server error"),
            )?)
        }
    }
}
