use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    anyhow::Context,
    axum::{
        Router,
        extract::{Query, State},
        response::{Html, IntoResponse, Json},
        routing::get,
    },
    pesan_channels::{MessagingTransport, event_channel},
    pesan_config::PesanConfig,
    pesan_whatsapp::{AuthStateDir, BridgeTransport},
    serde::Deserialize,
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
};

use crate::{
    access::SendRequest, error::SendError, events::run_event_pump, pages, state::GatewayState,
};

/// How long in-flight responses may take to finish after a shutdown request.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/qr", get(qr_handler))
        .route("/send-message", get(send_message_handler))
        .route("/disconnect", get(disconnect_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Spawn the bridge, serve HTTP until a shutdown is requested, and return
/// the shutdown reason.
pub async fn start_gateway(config: PesanConfig) -> anyhow::Result<Option<String>> {
    let (events_tx, events_rx) = event_channel();
    let transport = BridgeTransport::from_config(&config.whatsapp, events_tx)
        .await
        .with_context(|| {
            format!(
                "failed to start whatsapp bridge `{}`",
                config.whatsapp.bridge_command
            )
        })?;
    let artifacts = Arc::new(AuthStateDir::new(&config.whatsapp.session_dir));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .context("invalid bind address")?;

    let state = GatewayState::new(
        config,
        Arc::clone(&transport) as Arc<dyn MessagingTransport>,
        artifacts,
    );
    tokio::spawn(run_event_pump(Arc::clone(&state), events_rx));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let delay = state.queue.delay_range();
    info!(
        version = %state.version,
        addr = %addr,
        url = %state.config.server.public_url(),
        restricted = state.access.is_restricted(),
        min_delay_ms = delay.min().as_millis() as u64,
        max_delay_ms = delay.max().as_millis() as u64,
        "pesan gateway listening"
    );

    let graceful = state.shutdown.clone();
    let server = axum::serve(listener, build_gateway_app(Arc::clone(&state)))
        .with_graceful_shutdown(async move { graceful.wait().await });

    let deadline = state.shutdown.clone();
    tokio::select! {
        res = server.into_future() => res.context("http server failed")?,
        () = async move {
            deadline.wait().await;
            tokio::time::sleep(SHUTDOWN_GRACE).await;
        } => warn!(grace_secs = SHUTDOWN_GRACE.as_secs(), "open connections did not finish, forcing shutdown"),
    }

    transport.kill().await;
    Ok(state.shutdown.reason())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendMessageQuery {
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    pub message: Option<String>,
}

async fn root_handler(State(state): State<Arc<GatewayState>>) -> Html<String> {
    Html(pages::status_page(
        &state.session.current_status(),
        &state.config.server.public_url(),
    ))
}

async fn qr_handler(State(state): State<Arc<GatewayState>>) -> Html<String> {
    let status = state.session.current_status();
    Html(pages::qr_page(status.pairing.get()))
}

async fn send_message_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<SendMessageQuery>,
) -> Result<Json<serde_json::Value>, SendError> {
    let request = SendRequest::parse(query.phone_number.as_deref(), query.message.as_deref())?;
    state.send_message(&request).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Message sent successfully",
    })))
}

async fn disconnect_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    state.disconnect().await;
    Json(serde_json::json!({
        "success": true,
        "message": "Client disconnected successfully",
    }))
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "session": state.session.state(),
        "queued": state.queue.len(),
        "uptime_secs": state.uptime_secs(),
    }))
}

async fn status_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "session": state.session.current_status(),
        "queue": {
            "queued": state.queue.len(),
            "worker_active": state.queue.is_worker_active(),
        },
        "restricted": state.access.is_restricted(),
    }))
}
