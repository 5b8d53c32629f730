// [libs/infra/dispatch/src/local_leader.rs]
/*!
 * =================================================================
 * APARATO: LOCAL LEADER DISPATCHER (V4.6 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: COORDINACIÓN PARALELA DE RÉPLICAS DESDE EL CLI
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. TRUE INDEX SOVEREIGNTY: El trabajador siempre reporta réplica 0;
 *    cada tarea reescribe toda línea portadora de réplica a su índice
 *    verdadero antes de la fusión.
 * 2. MONOTONE MERGE: Los PROGRESS se reescriben a forma acumulativa a
 *    través del libro mayor atómico compartido: el consumidor observa
 *    un único flujo monótono a través de las N réplicas.
 * 3. BOUNDED FAN-OUT: Como máximo K peticiones HTTP en vuelo; los
 *    arranques siguen el índice ascendente, la finalización no
 *    promete orden alguno.
 * 4. FIRST FAILURE CANCELS: ERROR de protocolo, no-200 o colapso de
 *    transporte en una tarea cancela a todos los pares en vuelo y
 *    emerge como fallo único; tras observarse la cancelación no se
 *    emite ni una escritura de sumidero más.
 * =================================================================
 */

use crate::cancel::CancelSignal;
use crate::errors::DispatchFault;
use crate::reducer::ResponseReducer;
use crate::task_board::{TaskPhaseBoard, WorkerTaskPhase};
use crate::transport::{ExecutionStrategy, WireLineStream, WorkerCallContext, WorkerTransport};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use josh_core_wire::{parse, to_wire_format, CumulativeStepLedger, WireMessage};
use josh_domain_models::SimulationRequest;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, instrument, warn};

/// Capacidad del canal de fusión: acota la memoria y propaga la
/// contrapresión del reductor hacia los lectores HTTP.
const MERGE_CHANNEL_CAPACITY: usize = 256;

pub struct LocalLeaderDispatcher {
    transport: Arc<dyn WorkerTransport>,
    concurrent_worker_bound: usize,
}

impl LocalLeaderDispatcher {
    pub fn new(transport: Arc<dyn WorkerTransport>, concurrent_worker_bound: usize) -> Self {
        Self {
            transport,
            concurrent_worker_bound: concurrent_worker_bound.max(1),
        }
    }

    /// Flujo fusionado y reescrito de las N réplicas, para el rol de
    /// servidor líder: las líneas ya portan índices verdaderos y
    /// progreso acumulativo. Un fallo del abanico emerge como último
    /// elemento del flujo.
    pub fn merged_wire_stream(
        &self,
        call_context: WorkerCallContext,
        replicate_count: u32,
        cancel: CancelSignal,
    ) -> WireLineStream {
        let (line_sender, line_receiver) = mpsc::channel::<String>(MERGE_CHANNEL_CAPACITY);
        let (fault_sender, fault_receiver) = tokio::sync::oneshot::channel::<DispatchFault>();

        let transport = Arc::clone(&self.transport);
        let concurrent_worker_bound = self.concurrent_worker_bound;
        let phase_board = Arc::new(TaskPhaseBoard::new(replicate_count as usize));

        tokio::spawn(async move {
            let fan_out_outcome = Self::fan_out_rewritten_lines(
                transport,
                Arc::new(call_context),
                replicate_count,
                concurrent_worker_bound,
                Arc::new(CumulativeStepLedger::new()),
                phase_board,
                cancel,
                CancelSignal::new(),
                line_sender,
            )
            .await;
            if let Err(fan_out_fault) = fan_out_outcome {
                let _ = fault_sender.send(fan_out_fault);
            }
        });

        let trailing_fault_stream = futures::stream::unfold(
            Some(fault_receiver),
            |pending_receiver| async move {
                let fault_receiver = pending_receiver?;
                match fault_receiver.await {
                    Ok(fan_out_fault) => Some((Err(fan_out_fault), None)),
                    Err(_) => None,
                }
            },
        );

        Box::pin(
            ReceiverStream::new(line_receiver)
                .map(Ok)
                .chain(trailing_fault_stream),
        )
    }

    /// Abanico acotado: arranca tareas en orden ascendente de réplica,
    /// con a lo sumo K en vuelo; cada línea se reescribe y se envía al
    /// canal de fusión. El primer fallo descarta a los pares en vuelo.
    #[allow(clippy::too_many_arguments)]
    async fn fan_out_rewritten_lines(
        transport: Arc<dyn WorkerTransport>,
        call_context: Arc<WorkerCallContext>,
        replicate_count: u32,
        concurrent_worker_bound: usize,
        shared_ledger: Arc<CumulativeStepLedger>,
        phase_board: Arc<TaskPhaseBoard>,
        cancel: CancelSignal,
        abort_signal: CancelSignal,
        line_sender: mpsc::Sender<String>,
    ) -> Result<(), DispatchFault> {
        let fan_out_outcome = futures::stream::iter(0..replicate_count)
            .map(Ok)
            .try_for_each_concurrent(Some(concurrent_worker_bound), |replicate_index| {
                let transport = Arc::clone(&transport);
                let call_context = Arc::clone(&call_context);
                let shared_ledger = Arc::clone(&shared_ledger);
                let phase_board = Arc::clone(&phase_board);
                let cancel = cancel.clone();
                let abort_signal = abort_signal.clone();
                let line_sender = line_sender.clone();

                async move {
                    if cancel.is_triggered() || abort_signal.is_triggered() {
                        phase_board
                            .mark_terminal(replicate_index as usize, WorkerTaskPhase::Cancelled);
                        return Err(DispatchFault::Cancelled);
                    }

                    phase_board.mark_in_flight(replicate_index as usize);
                    let task_outcome = Self::run_worker_task(
                        transport,
                        call_context,
                        replicate_index,
                        shared_ledger,
                        cancel,
                        abort_signal,
                        line_sender,
                    )
                    .await;

                    let terminal_phase = match &task_outcome {
                        Ok(()) => WorkerTaskPhase::Done,
                        Err(DispatchFault::Cancelled) => WorkerTaskPhase::Cancelled,
                        Err(_) => WorkerTaskPhase::Failed,
                    };
                    phase_board.mark_terminal(replicate_index as usize, terminal_phase);
                    task_outcome
                }
            })
            .await;

        if fan_out_outcome.is_err() {
            // Cancelación de pares: las tareas en vuelo fueron
            // descartadas con sus conexiones; las pendientes se omiten.
            abort_signal.trigger();
            phase_board.cancel_non_terminal();
        }

        fan_out_outcome
    }

    async fn run_worker_task(
        transport: Arc<dyn WorkerTransport>,
        call_context: Arc<WorkerCallContext>,
        replicate_index: u32,
        shared_ledger: Arc<CumulativeStepLedger>,
        cancel: CancelSignal,
        abort_signal: CancelSignal,
        line_sender: mpsc::Sender<String>,
    ) -> Result<(), DispatchFault> {
        let mut line_stream: WireLineStream = transport
            .open_replicate_stream(&call_context, replicate_index)
            .await
            .map_err(|open_fault| open_fault.for_replicate(replicate_index))?;

        while let Some(line_result) = line_stream.next().await {
            if cancel.is_triggered() || abort_signal.is_triggered() {
                return Err(DispatchFault::Cancelled);
            }

            let raw_line = line_result.map_err(|stream_fault| stream_fault.for_replicate(replicate_index))?;

            match parse(&raw_line) {
                WireMessage::Ignored => continue,
                WireMessage::Error { message, .. } => {
                    warn!("🚨 [WORKER_ERROR]: Replicate {} reported: {}", replicate_index, message);
                    return Err(DispatchFault::WireError {
                        replicate: Some(replicate_index),
                        message,
                    });
                }
                carried_message => {
                    let rewritten_message =
                        shared_ledger.rewrite(carried_message.with_replicate(replicate_index));
                    let Some(rewritten_line) = to_wire_format(&rewritten_message) else {
                        continue;
                    };
                    if line_sender.send(rewritten_line).await.is_err() {
                        // Consumidor retirado: cancelación observada.
                        return Err(DispatchFault::Cancelled);
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ExecutionStrategy for LocalLeaderDispatcher {
    #[instrument(skip_all, fields(simulation = %request.simulation_name(), replicates = request.replicate_count()))]
    async fn execute(
        &self,
        request: &SimulationRequest,
        reducer: &mut ResponseReducer,
        cancel: &CancelSignal,
    ) -> Result<(), DispatchFault> {
        let call_context = Arc::new(WorkerCallContext::from_request(request));
        let shared_ledger = Arc::new(CumulativeStepLedger::new());
        let phase_board = Arc::new(TaskPhaseBoard::new(request.replicate_count() as usize));
        let abort_signal = CancelSignal::new();
        let (line_sender, line_receiver) = mpsc::channel::<String>(MERGE_CHANNEL_CAPACITY);

        info!(
            "🧭 [LOCAL_LEADER]: Coordinating {} replicates of '{}' (bound K={})",
            request.replicate_count(),
            request.simulation_name(),
            self.concurrent_worker_bound
        );

        let producer_future = Self::fan_out_rewritten_lines(
            Arc::clone(&self.transport),
            Arc::clone(&call_context),
            request.replicate_count(),
            self.concurrent_worker_bound,
            Arc::clone(&shared_ledger),
            Arc::clone(&phase_board),
            cancel.clone(),
            abort_signal.clone(),
            line_sender,
        );

        let consumer_abort_signal = abort_signal.clone();
        let consumer_reducer = &mut *reducer;
        let consumer_future = async move {
            // El receptor vive dentro del consumidor: al salir se
            // suelta y los emisores observan la cancelación.
            let mut line_receiver = line_receiver;
            while let Some(merged_line) = line_receiver.recv().await {
                if consumer_abort_signal.is_triggered() {
                    break;
                }
                if let Err(ingest_fault) = consumer_reducer.ingest(parse(&merged_line)) {
                    consumer_abort_signal.trigger();
                    return Err(ingest_fault);
                }
            }
            Ok(())
        };

        let (producer_outcome, consumer_outcome) = tokio::join!(producer_future, consumer_future);
        let sealing_outcome = reducer.seal_sinks();

        // El primer fallo real gana; Cancelled solo si nadie aporta
        // una causa más concreta.
        let execution_outcome = match (producer_outcome, consumer_outcome) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(DispatchFault::Cancelled), Err(consumer_fault)) => Err(consumer_fault),
            (Err(producer_fault), _) => Err(producer_fault),
            (Ok(()), Err(consumer_fault)) => Err(consumer_fault),
        };

        execution_outcome.and(sealing_outcome)
    }
}
