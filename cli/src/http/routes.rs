//! HTTP路由handlers

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use chatbridge_core::api::{DispatchOutcome, HealthSnapshot, PairingSnapshot};

use crate::http::{models::*, state::AppState};

/// 创建所有路由
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.http_server.body_limit_bytes;
    Router::new()
        .route("/qr", get(qr_handler))
        .route("/health", get(health_handler))
        .route("/check-number", post(check_number_handler))
        .route("/send", post(send_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, HttpServerError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| HttpServerError::InvalidRequest(rejection.body_text()))
}

/// GET /qr - 当前配对二维码
async fn qr_handler(State(state): State<AppState>) -> Json<PairingSnapshot> {
    Json(state.reporter.pairing().await)
}

/// GET /health - 会话健康状态
async fn health_handler(State(state): State<AppState>) -> Json<HealthSnapshot> {
    Json(state.reporter.health().await)
}

/// POST /check-number - 查询号码是否注册
async fn check_number_handler(
    State(state): State<AppState>,
    body: Result<Json<CheckNumberBody>, JsonRejection>,
) -> Result<Json<CheckNumberResponse>, HttpServerError> {
    state.gate.ensure_ready().await?;
    let req = json_body(body)?;
    state.gate.check_number(req.number).await?;
    Ok(Json(CheckNumberResponse { registered: true }))
}

/// POST /send - 发送文本和/或PDF
async fn send_handler(
    State(state): State<AppState>,
    body: Result<Json<SendBody>, JsonRejection>,
) -> Result<Json<SendResponse>, HttpServerError> {
    // Readiness wins over body errors.
    state.gate.ensure_ready().await?;
    let req = json_body(body)?;
    tracing::debug!(
        target: "chatbridge.http",
        message_id = ?req.message_id,
        has_text = req.message.is_some(),
        has_pdf = req.pdf_path.is_some(),
        "send requested"
    );

    let duplicate = match state.gate.dispatch(req.into()).await? {
        DispatchOutcome::Sent => None,
        DispatchOutcome::Duplicate => Some(true),
    };
    Ok(Json(SendResponse {
        success: true,
        duplicate,
    }))
}
