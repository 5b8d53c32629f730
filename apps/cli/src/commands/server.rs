// [apps/cli/src/commands/server.rs]
/*!
 * =================================================================
 * APARATO: LEADER SERVICE COMMAND (V4.3 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L4)
 * RESPONSABILIDAD: ROL LÍDER COMO SERVICIO HTTP
 *
 * Expone POST /runReplicates: recibe el formulario del protocolo,
 * abanica las réplicas contra el endpoint trabajador configurado y
 * retransmite el flujo fusionado (índices verdaderos + progreso
 * acumulativo) como cuerpo en streaming. Un fallo del abanico se
 * emite como línea '[error …]' del propio protocolo.
 * =================================================================
 */

use crate::exit::CliFault;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use clap::Args;
use futures::StreamExt;
use josh_core_wire::{to_wire_format, WireMessage};
use josh_infra_dispatch::{
    normalize_endpoint, CancelSignal, HttpTransportConfig, HttpWorkerTransport,
    LocalLeaderDispatcher, WorkerCallContext,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct ServerArguments {
    /// Puerto de escucha del servicio líder.
    #[arg(long, default_value_t = 8085)]
    pub port: u16,

    /// Endpoint trabajador aguas abajo hacia el que se abanican las réplicas.
    #[arg(long = "worker-endpoint", env = "JOSH_WORKER_ENDPOINT")]
    pub worker_endpoint: String,

    /// Cota K de trabajadores simultáneos por petición entrante.
    #[arg(long = "concurrent-workers", default_value_t = 4)]
    pub concurrent_workers: usize,

    /// Clave exigida a los clientes entrantes; sin ella el servicio es abierto.
    #[arg(long = "require-api-key", env = "JOSH_SERVER_API_KEY")]
    pub require_api_key: Option<String>,
}

struct LeaderServiceState {
    dispatcher: LocalLeaderDispatcher,
    required_api_key: Option<String>,
}

/// Formulario del protocolo líder (§ rol HTTP `runReplicates`).
#[derive(Deserialize)]
struct LeaderFormPayload {
    code: String,
    name: String,
    replicates: u32,
    #[serde(rename = "apiKey", default)]
    api_key: String,
    #[serde(rename = "externalData", default)]
    external_data: String,
    #[serde(rename = "favorBigDecimal", default)]
    favor_big_decimal: String,
}

pub async fn execute(arguments: &ServerArguments) -> Result<(), CliFault> {
    let endpoint_plan = normalize_endpoint(&arguments.worker_endpoint)?;
    let transport = Arc::new(HttpWorkerTransport::new(
        endpoint_plan,
        HttpTransportConfig::default(),
    )?);
    let dispatcher = LocalLeaderDispatcher::new(transport, arguments.concurrent_workers);

    let service_state = Arc::new(LeaderServiceState {
        dispatcher,
        required_api_key: arguments.require_api_key.clone(),
    });

    let leader_router = Router::new()
        .route("/runReplicates", post(handle_run_replicates))
        .route("/health", get(|| async { "OK" }))
        .with_state(service_state);

    let bind_address = format!("0.0.0.0:{}", arguments.port);
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|bind_fault| CliFault::Unknown(format!("bind {}: {}", bind_address, bind_fault)))?;

    info!(
        "🛰️ [LEADER_SERVICE]: Listening on {} (downstream worker: {})",
        bind_address, arguments.worker_endpoint
    );

    axum::serve(tcp_listener, leader_router)
        .await
        .map_err(|serve_fault| CliFault::Unknown(serve_fault.to_string()))
}

async fn handle_run_replicates(
    State(service_state): State<Arc<LeaderServiceState>>,
    Form(form_payload): Form<LeaderFormPayload>,
) -> Response {
    info!(
        "📥 [LEADER_SERVICE]: '{}' requested ({} replicates)",
        form_payload.name, form_payload.replicates
    );
    if let Some(required_api_key) = &service_state.required_api_key {
        if form_payload.api_key != *required_api_key {
            warn!("🔐 [LEADER_SERVICE]: Request rejected by API key gate");
            return (StatusCode::UNAUTHORIZED, "API key rejected").into_response();
        }
    }
    if form_payload.replicates < 1 {
        return (StatusCode::BAD_REQUEST, "replicates must be >= 1").into_response();
    }

    let call_context = WorkerCallContext {
        simulation_code: form_payload.code,
        simulation_name: form_payload.name,
        api_key: Some(form_payload.api_key).filter(|api_key| !api_key.is_empty()),
        packed_external_data: form_payload.external_data,
        favor_big_decimal: form_payload.favor_big_decimal == "true",
    };

    let merged_stream = service_state.dispatcher.merged_wire_stream(
        call_context,
        form_payload.replicates,
        CancelSignal::new(),
    );

    // Los fallos del abanico viajan dentro del propio protocolo.
    let body_stream = merged_stream.map(|stream_item| -> Result<String, std::convert::Infallible> {
        Ok(match stream_item {
            Ok(merged_line) => format!("{}\n", merged_line),
            Err(fan_out_fault) => {
                let error_line = to_wire_format(&WireMessage::Error {
                    replicate: fan_out_fault.replicate(),
                    message: fan_out_fault.to_string(),
                })
                .unwrap_or_default();
                format!("{}\n", error_line)
            }
        })
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
