use crate::models::report::{ReportInput, SubmissionResult};
use crate::services::submission as service;
use crate::state::AppState;
use ntex::util::BytesMut;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

fn respond(result: SubmissionResult) -> HttpResponse {
    if result.ok {
        HttpResponse::Ok().json(&result)
    } else {
        HttpResponse::BadRequest().json(&result)
    }
}

/// Collects the request body, refusing anything over `limit` bytes.
async fn read_body(mut payload: web::types::Payload, limit: usize) -> Result<BytesMut, SubmissionResult> {
    let mut body = BytesMut::new();
    while let Some(chunk) = ntex::util::stream_recv(&mut payload).await {
        let chunk = chunk.map_err(|e| service::rejected(format!("failed to read report: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(service::rejected(format!("report exceeds {} bytes", limit)));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

async fn submit(
    state: &AppState,
    payload: web::types::Payload,
    decode: fn(&[u8]) -> Result<ReportInput, SubmissionResult>,
) -> HttpResponse {
    let input = match read_body(payload, state.settings.max_report_size).await {
        Ok(body) => decode(&body),
        Err(result) => Err(result),
    };
    match input {
        Ok(input) => respond(service::submit_match(state, input)),
        Err(result) => respond(result),
    }
}

pub async fn submit_report(
    state: web::types::State<Arc<AppState>>,
    payload: web::types::Payload,
) -> HttpResponse {
    submit(&state, payload, service::decode_raw).await
}

pub async fn submit_parsed_report(
    state: web::types::State<Arc<AppState>>,
    payload: web::types::Payload,
) -> HttpResponse {
    submit(&state, payload, service::decode_parsed).await
}
