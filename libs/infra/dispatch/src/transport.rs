// [libs/infra/dispatch/src/transport.rs]
/*!
 * =================================================================
 * APARATO: WORKER TRANSPORT UPLINK (V4.5 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: NEGOCIACIÓN HTTP Y ENMARCADO DE LÍNEAS EN STREAMING
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. SEAM FIRST: El contrato 'WorkerTransport' desacopla la
 *    coordinación de réplicas del transporte físico; el Proving
 *    Grounds inyecta flujos guionizados sin tocar la red.
 * 2. BACKPRESSURE REAL: El enmarcador de líneas es pull-based; un
 *    sumidero lento frena al lector HTTP en lugar de bufferizar sin
 *    límite.
 * =================================================================
 */

use crate::cancel::CancelSignal;
use crate::endpoint::EndpointPlan;
use crate::errors::DispatchFault;
use crate::reducer::ResponseReducer;
use async_trait::async_trait;
use futures::stream::Stream;
use futures::StreamExt;
use josh_core_wire::pack_external_data;
use josh_domain_models::SimulationRequest;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Flujo de líneas del protocolo, ya desenmarcadas del cuerpo HTTP.
pub type WireLineStream = Pin<Box<dyn Stream<Item = Result<String, DispatchFault>> + Send>>;

type FramedByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, DispatchFault>> + Send>>;

/// Timeout de establecimiento de conexión por defecto.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout de petición completa por defecto (streaming incluido).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Contexto inmutable compartido por todas las llamadas de un trabajo.
#[derive(Debug, Clone)]
pub struct WorkerCallContext {
    pub simulation_code: String,
    pub simulation_name: String,
    pub api_key: Option<String>,
    pub packed_external_data: String,
    pub favor_big_decimal: bool,
}

impl WorkerCallContext {
    /// Congela el contexto de red de una petición sellada, empacando
    /// el mapa de datos externos en su sobre de línea.
    pub fn from_request(request: &SimulationRequest) -> Self {
        Self {
            simulation_code: request.simulation_code().to_string(),
            simulation_name: request.simulation_name().to_string(),
            api_key: request.api_key().map(str::to_string),
            packed_external_data: pack_external_data(request.external_data()),
            favor_big_decimal: request.favor_big_decimal(),
        }
    }

    /// Campos del formulario del protocolo líder/trabajador.
    pub fn form_fields(
        &self,
        replicate_count: u32,
        replicate_number: Option<u32>,
    ) -> Vec<(&'static str, String)> {
        let mut form_fields = vec![
            ("code", self.simulation_code.clone()),
            ("name", self.simulation_name.clone()),
            ("replicates", replicate_count.to_string()),
            ("apiKey", self.api_key.clone().unwrap_or_default()),
            ("externalData", self.packed_external_data.clone()),
            (
                "favorBigDecimal",
                if self.favor_big_decimal { "true" } else { "false" }.to_string(),
            ),
        ];
        if let Some(assigned_index) = replicate_number {
            form_fields.push(("replicateNumber", assigned_index.to_string()));
        }
        form_fields
    }
}

/// Costura de transporte hacia los roles HTTP del protocolo.
#[async_trait]
pub trait WorkerTransport: Send + Sync {
    /// POST `…/runReplicate` con `replicates=1` y `replicateNumber`.
    async fn open_replicate_stream(
        &self,
        call_context: &WorkerCallContext,
        replicate_number: u32,
    ) -> Result<WireLineStream, DispatchFault>;

    /// POST `…/runReplicates` con `replicates=N`.
    async fn open_leader_stream(
        &self,
        call_context: &WorkerCallContext,
        replicate_count: u32,
    ) -> Result<WireLineStream, DispatchFault>;
}

/// Contrato común de las estrategias de ejecución: líder local, líder
/// remoto o cualquier motor simétrico futuro.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn execute(
        &self,
        request: &SimulationRequest,
        reducer: &mut ResponseReducer,
        cancel: &CancelSignal,
    ) -> Result<(), DispatchFault>;
}

/// Configuración de timeouts del transporte físico.
#[derive(Debug, Clone, Copy)]
pub struct HttpTransportConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Transporte físico sobre reqwest con cuerpo en streaming.
pub struct HttpWorkerTransport {
    http_client: reqwest::Client,
    endpoint_plan: EndpointPlan,
}

impl HttpWorkerTransport {
    pub fn new(
        endpoint_plan: EndpointPlan,
        transport_config: HttpTransportConfig,
    ) -> Result<Self, DispatchFault> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(transport_config.connect_timeout)
            .timeout(transport_config.request_timeout)
            .build()
            .map_err(|build_fault| DispatchFault::Transport {
                replicate: None,
                detail: build_fault.to_string(),
            })?;

        Ok(Self {
            http_client,
            endpoint_plan,
        })
    }

    pub fn endpoint_plan(&self) -> &EndpointPlan {
        &self.endpoint_plan
    }

    #[instrument(skip(self, form_fields))]
    async fn open_stream(
        &self,
        target_uri: &Url,
        form_fields: Vec<(&'static str, String)>,
        replicate: Option<u32>,
    ) -> Result<WireLineStream, DispatchFault> {
        debug!("📡 [UPLINK]: POST {}", target_uri);

        let network_response = self
            .http_client
            .post(target_uri.clone())
            .form(&form_fields)
            .send()
            .await
            .map_err(|network_fault| DispatchFault::Transport {
                replicate,
                detail: network_fault.to_string(),
            })?;

        if network_response.status() != reqwest::StatusCode::OK {
            return Err(DispatchFault::RemoteHttp {
                status: network_response.status().as_u16(),
                peer: target_uri.to_string(),
                replicate,
            });
        }

        let framed_byte_stream: FramedByteStream =
            Box::pin(network_response.bytes_stream().map(move |chunk_result| {
                chunk_result
                    .map(|chunk_bytes| chunk_bytes.to_vec())
                    .map_err(|network_fault| DispatchFault::Transport {
                        replicate,
                        detail: network_fault.to_string(),
                    })
            }));

        Ok(Box::pin(WireLineFramer::new(framed_byte_stream)))
    }
}

#[async_trait]
impl WorkerTransport for HttpWorkerTransport {
    async fn open_replicate_stream(
        &self,
        call_context: &WorkerCallContext,
        replicate_number: u32,
    ) -> Result<WireLineStream, DispatchFault> {
        self.open_stream(
            &self.endpoint_plan.worker_uri,
            call_context.form_fields(1, Some(replicate_number)),
            Some(replicate_number),
        )
        .await
    }

    async fn open_leader_stream(
        &self,
        call_context: &WorkerCallContext,
        replicate_count: u32,
    ) -> Result<WireLineStream, DispatchFault> {
        self.open_stream(
            &self.endpoint_plan.leader_uri,
            call_context.form_fields(replicate_count, None),
            None,
        )
        .await
    }
}

/// Enmarcador incremental: bytes HTTP → líneas de protocolo.
///
/// Pull-based: solo consume del flujo de bytes cuando el consumidor
/// pide la siguiente línea, propagando la contrapresión del sumidero
/// hasta el socket.
pub struct WireLineFramer {
    byte_stream: FramedByteStream,
    carry_buffer: Vec<u8>,
    decoded_lines: VecDeque<String>,
    source_exhausted: bool,
}

impl WireLineFramer {
    pub fn new(byte_stream: FramedByteStream) -> Self {
        Self {
            byte_stream,
            carry_buffer: Vec::new(),
            decoded_lines: VecDeque::new(),
            source_exhausted: false,
        }
    }

    fn drain_complete_lines(&mut self) {
        while let Some(newline_position) = self.carry_buffer.iter().position(|byte| *byte == b'\n')
        {
            let line_bytes: Vec<u8> = self.carry_buffer.drain(..=newline_position).collect();
            let decoded_line = String::from_utf8_lossy(&line_bytes[..newline_position]);
            self.decoded_lines
                .push_back(decoded_line.trim_end_matches('\r').to_string());
        }
    }
}

impl Stream for WireLineFramer {
    type Item = Result<String, DispatchFault>;

    fn poll_next(self: Pin<&mut Self>, task_context: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let framer = self.get_mut();

        loop {
            if let Some(ready_line) = framer.decoded_lines.pop_front() {
                return Poll::Ready(Some(Ok(ready_line)));
            }

            if framer.source_exhausted {
                if framer.carry_buffer.is_empty() {
                    return Poll::Ready(None);
                }
                let final_line = String::from_utf8_lossy(&framer.carry_buffer)
                    .trim_end_matches('\r')
                    .to_string();
                framer.carry_buffer.clear();
                return Poll::Ready(Some(Ok(final_line)));
            }

            match framer.byte_stream.as_mut().poll_next(task_context) {
                Poll::Ready(Some(Ok(chunk_bytes))) => {
                    framer.carry_buffer.extend_from_slice(&chunk_bytes);
                    framer.drain_complete_lines();
                }
                Poll::Ready(Some(Err(stream_fault))) => return Poll::Ready(Some(Err(stream_fault))),
                Poll::Ready(None) => framer.source_exhausted = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Guion de respuesta de una réplica en el Proving Grounds.
#[derive(Debug, Default)]
pub struct ScriptedReplicateFeed {
    scripted_lines: Vec<Result<String, DispatchFault>>,
    reject_with_status: Option<u16>,
}

/// Transporte guionizado: reproduce flujos predefinidos y mide la
/// concurrencia real observada (cota K verificable). Cada réplica
/// mantiene una cola de guiones: aperturas sucesivas del mismo índice
/// (un trabajo del lote tras otro) consumen el siguiente guion.
#[derive(Default)]
pub struct ScriptedWorkerTransport {
    replicate_feeds: Mutex<HashMap<u32, VecDeque<ScriptedReplicateFeed>>>,
    leader_feeds: Mutex<VecDeque<Vec<Result<String, DispatchFault>>>>,
    inter_line_delay: Option<Duration>,
    in_flight_gauge: Arc<AtomicUsize>,
    peak_in_flight_gauge: Arc<AtomicUsize>,
}

impl ScriptedWorkerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta una pausa fija entre líneas para forzar intercalado.
    pub fn with_line_delay(mut self, inter_line_delay: Duration) -> Self {
        self.inter_line_delay = Some(inter_line_delay);
        self
    }

    pub fn script_replicate(&self, replicate_number: u32, scripted_lines: &[&str]) {
        self.enqueue_feed(
            replicate_number,
            ScriptedReplicateFeed {
                scripted_lines: scripted_lines
                    .iter()
                    .map(|line| Ok((*line).to_string()))
                    .collect(),
                reject_with_status: None,
            },
        );
    }

    /// Flujo que colapsa a mitad de transmisión tras las líneas dadas.
    pub fn script_replicate_collapse(
        &self,
        replicate_number: u32,
        lines_before_collapse: &[&str],
        collapse_detail: &str,
    ) {
        let mut scripted_lines: Vec<Result<String, DispatchFault>> = lines_before_collapse
            .iter()
            .map(|line| Ok((*line).to_string()))
            .collect();
        scripted_lines.push(Err(DispatchFault::Transport {
            replicate: Some(replicate_number),
            detail: collapse_detail.to_string(),
        }));
        self.enqueue_feed(
            replicate_number,
            ScriptedReplicateFeed {
                scripted_lines,
                reject_with_status: None,
            },
        );
    }

    /// Rechazo no-200 en la apertura de la réplica.
    pub fn script_replicate_rejection(&self, replicate_number: u32, http_status: u16) {
        self.enqueue_feed(
            replicate_number,
            ScriptedReplicateFeed {
                scripted_lines: Vec::new(),
                reject_with_status: Some(http_status),
            },
        );
    }

    pub fn script_leader(&self, scripted_lines: &[&str]) {
        self.leader_feeds
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            .push_back(
                scripted_lines
                    .iter()
                    .map(|line| Ok((*line).to_string()))
                    .collect(),
            );
    }

    fn enqueue_feed(&self, replicate_number: u32, scripted_feed: ScriptedReplicateFeed) {
        self.locked_feeds()
            .entry(replicate_number)
            .or_default()
            .push_back(scripted_feed);
    }

    /// Máximo de flujos simultáneamente abiertos durante la corrida.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight_gauge.load(Ordering::SeqCst)
    }

    fn locked_feeds(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<u32, VecDeque<ScriptedReplicateFeed>>> {
        self.replicate_feeds
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
    }

    fn open_scripted(
        &self,
        scripted_lines: Vec<Result<String, DispatchFault>>,
    ) -> WireLineStream {
        let climbed_gauge = self.in_flight_gauge.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight_gauge.fetch_max(climbed_gauge, Ordering::SeqCst);

        let release_guard = InFlightGuard {
            in_flight_gauge: Arc::clone(&self.in_flight_gauge),
        };
        let inter_line_delay = self.inter_line_delay;

        let playback_state = ScriptedPlayback {
            queued_items: scripted_lines.into(),
            inter_line_delay,
            _release_guard: release_guard,
        };

        Box::pin(futures::stream::unfold(
            playback_state,
            |mut playback_state| async move {
                let next_item = playback_state.queued_items.pop_front()?;
                match playback_state.inter_line_delay {
                    Some(configured_delay) => tokio::time::sleep(configured_delay).await,
                    None => tokio::task::yield_now().await,
                }
                Some((next_item, playback_state))
            },
        ))
    }
}

struct ScriptedPlayback {
    queued_items: VecDeque<Result<String, DispatchFault>>,
    inter_line_delay: Option<Duration>,
    _release_guard: InFlightGuard,
}

struct InFlightGuard {
    in_flight_gauge: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight_gauge.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkerTransport for ScriptedWorkerTransport {
    async fn open_replicate_stream(
        &self,
        _call_context: &WorkerCallContext,
        replicate_number: u32,
    ) -> Result<WireLineStream, DispatchFault> {
        let scripted_feed = self
            .locked_feeds()
            .get_mut(&replicate_number)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| DispatchFault::Transport {
                replicate: Some(replicate_number),
                detail: "no scripted feed for replicate".to_string(),
            })?;

        if let Some(http_status) = scripted_feed.reject_with_status {
            return Err(DispatchFault::RemoteHttp {
                status: http_status,
                peer: "scripted-worker".to_string(),
                replicate: Some(replicate_number),
            });
        }

        Ok(self.open_scripted(scripted_feed.scripted_lines))
    }

    async fn open_leader_stream(
        &self,
        _call_context: &WorkerCallContext,
        _replicate_count: u32,
    ) -> Result<WireLineStream, DispatchFault> {
        let scripted_lines = self
            .leader_feeds
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            .pop_front()
            .ok_or_else(|| DispatchFault::Transport {
                replicate: None,
                detail: "no scripted leader feed".to_string(),
            })?;

        Ok(self.open_scripted(scripted_lines))
    }
}
