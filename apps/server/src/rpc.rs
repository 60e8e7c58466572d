//! JSON-RPC request handling

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rpc_router::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::state::AppState;

/// Handle a JSON-RPC request
///
/// Always answers 200 with a JSON envelope; failures are reported in the
/// envelope's `error` field. The call's cancellation token fires when the
/// request finishes or the connection drops.
pub async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();

    let mut ctx = Context::new().with_cancellation(token);
    if let Some(timeout) = state.request_timeout() {
        ctx = ctx.with_timeout(timeout);
    }

    let request_id = Uuid::new_v4();
    let response = state
        .dispatcher
        .handle(ctx, &body)
        .instrument(info_span!("rpc", request_id = %request_id))
        .await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        response,
    )
        .into_response()
}
