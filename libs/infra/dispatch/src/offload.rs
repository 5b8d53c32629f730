// [libs/infra/dispatch/src/offload.rs]
/*!
 * =================================================================
 * APARATO: OFFLOAD LEADER STRATEGY (V4.2 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: DELEGACIÓN DE COORDINACIÓN AL LÍDER REMOTO
 *
 * Un único POST al rol líder; el remoto multiplexa las N réplicas y
 * emite un flujo de progreso ya coherente, así que el reductor se
 * alimenta sin reescritura acumulativa.
 * =================================================================
 */

use crate::cancel::CancelSignal;
use crate::errors::DispatchFault;
use crate::reducer::ResponseReducer;
use crate::transport::{ExecutionStrategy, WorkerCallContext, WorkerTransport};
use async_trait::async_trait;
use futures::StreamExt;
use josh_domain_models::SimulationRequest;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct OffloadLeaderStrategy {
    transport: Arc<dyn WorkerTransport>,
}

impl OffloadLeaderStrategy {
    pub fn new(transport: Arc<dyn WorkerTransport>) -> Self {
        Self { transport }
    }

    async fn drive(
        &self,
        request: &SimulationRequest,
        reducer: &mut ResponseReducer,
        cancel: &CancelSignal,
    ) -> Result<(), DispatchFault> {
        if cancel.is_triggered() {
            return Err(DispatchFault::Cancelled);
        }

        let call_context = WorkerCallContext::from_request(request);
        let mut line_stream = self
            .transport
            .open_leader_stream(&call_context, request.replicate_count())
            .await?;

        info!(
            "🛰️ [OFFLOAD]: Remote leader coordinating {} replicates of '{}'",
            request.replicate_count(),
            request.simulation_name()
        );

        while let Some(line_result) = line_stream.next().await {
            if cancel.is_triggered() {
                return Err(DispatchFault::Cancelled);
            }
            reducer.ingest_line(&line_result?)?;
        }

        Ok(())
    }
}

#[async_trait]
impl ExecutionStrategy for OffloadLeaderStrategy {
    #[instrument(skip_all, fields(simulation = %request.simulation_name()))]
    async fn execute(
        &self,
        request: &SimulationRequest,
        reducer: &mut ResponseReducer,
        cancel: &CancelSignal,
    ) -> Result<(), DispatchFault> {
        let execution_outcome = self.drive(request, reducer, cancel).await;
        let sealing_outcome = reducer.seal_sinks();
        execution_outcome.and(sealing_outcome)
    }
}
