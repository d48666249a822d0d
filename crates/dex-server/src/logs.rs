//! Relays orchestrator log chunks to HTTP clients as newline-delimited JSON.
//!
//! Each chunk becomes one line, `{"data": <base64>, "labels": {...}}`, sent
//! as its own body frame as soon as it arrives. A failed stream ends with a
//! single error line.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dex_proto::entropy_v1beta1::{GetLogRequest, LogChunk};
use futures_util::StreamExt;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::orchestrator::{LogStream, ResourceService};

pub const CONTENT_TYPE_NDJSON: &str = "application/x-ndjson";

/// Picks the allow-listed filters out of the query string. Keys that are not
/// present are left out, so an empty value still reaches the orchestrator.
pub fn collect_filters(
    query: &HashMap<String, String>,
    keys: &[String],
) -> HashMap<String, String> {
    keys.iter()
        .filter_map(|k| query.get(k).map(|v| (k.clone(), v.clone())))
        .collect()
}

#[derive(Debug, Serialize)]
struct LogLine {
    data: String,
    labels: BTreeMap<String, String>,
}

fn encode_chunk(chunk: LogChunk) -> Bytes {
    let line = LogLine {
        data: STANDARD.encode(&chunk.data),
        labels: chunk.labels.into_iter().collect(),
    };
    let mut buf = serde_json::to_vec(&line).unwrap_or_default();
    buf.push(b'\n');
    Bytes::from(buf)
}

/// Opens the orchestrator log stream for `urn`. Failing to open is reported
/// as a regular error response; nothing has been written yet.
pub async fn open(
    resources: &dyn ResourceService,
    urn: &str,
    filter: HashMap<String, String>,
) -> ApiResult<Response> {
    let req = GetLogRequest {
        urn: urn.to_string(),
        filter,
    };
    let stream = resources
        .get_log(req)
        .await
        .map_err(ApiError::from_log_status)?;

    tracing::debug!(urn, "log stream opened");
    Ok(stream_response(urn.to_string(), stream))
}

/// Turns a log stream into a streaming response body.
///
/// The body owns the stream: when the client goes away the body is dropped
/// and so is the orchestrator call.
pub fn stream_response(urn: String, stream: LogStream) -> Response {
    let frames = futures_util::stream::unfold(Some(stream), move |state| {
        let urn = urn.clone();
        async move {
            let mut stream = state?;
            match stream.next().await? {
                Ok(chunk) => Some((Ok::<_, Infallible>(encode_chunk(chunk)), Some(stream))),
                Err(status) => {
                    tracing::warn!(
                        urn = %urn,
                        code = ?status.code(),
                        message = status.message(),
                        "log stream failed"
                    );
                    let err = ApiError::from_log_status(status);
                    Some((Ok(Bytes::from(err.to_json_line())), None))
                }
            }
        }
    });

    (
        [(header::CONTENT_TYPE, CONTENT_TYPE_NDJSON)],
        Body::from_stream(frames),
    )
        .into_response()
}
