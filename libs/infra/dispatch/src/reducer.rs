// [libs/infra/dispatch/src/reducer.rs]
/*!
 * =================================================================
 * APARATO: STREAMED RESPONSE REDUCER (V4.4 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PLIEGUE DEL FLUJO DE LÍNEAS EN RESULTADOS Y SUMIDEROS
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. SINGLE CONSUMER: Un reductor por invocación de estrategia posee
 *    en exclusiva los constructores de resultado, los sumideros y el
 *    calculador de progreso.
 * 2. SEAL EXACTLY ONCE: Todo sumidero abierto se sella exactamente
 *    una vez en cualquier salida (éxito, fallo o cancelación); el
 *    sellado es idempotente y corre también desde Drop.
 * 3. COHERENT INPUT: El flujo entrante ya es coherente en progreso:
 *    el líder remoto lo emite así y el despachador líder-local lo
 *    reescribe a forma acumulativa antes de alimentar al reductor.
 * =================================================================
 */

use crate::errors::DispatchFault;
use crate::progress::ProgressCalculator;
use futures::{Stream, StreamExt};
use josh_core_wire::{parse, WireMessage};
use josh_domain_models::{ReplicateResult, ReplicateResultBuilder};
use josh_infra_exports::{ExportSink, ExportSinkProvider, SinkRecord};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, error};

/// Atributo que, de estar presente y ser numérico, fija el paso de la
/// fila exportada; en su ausencia rige el último PROGRESS de la réplica.
const STEP_ATTRIBUTE: &str = "step";

pub struct ResponseReducer {
    sink_provider: Box<dyn ExportSinkProvider>,
    open_sinks: HashMap<String, Box<dyn ExportSink>>,
    replicate_builders: HashMap<u32, ReplicateResultBuilder>,
    last_progress_step_by_replicate: HashMap<u32, i64>,
    completed_results: Vec<ReplicateResult>,
    progress_calculator: ProgressCalculator,
    total_replicates: u32,
    sinks_sealed: bool,
}

impl ResponseReducer {
    pub fn new(
        sink_provider: Box<dyn ExportSinkProvider>,
        progress_calculator: ProgressCalculator,
        total_replicates: u32,
    ) -> Self {
        Self {
            sink_provider,
            open_sinks: HashMap::new(),
            replicate_builders: HashMap::new(),
            last_progress_step_by_replicate: HashMap::new(),
            completed_results: Vec::new(),
            progress_calculator,
            total_replicates,
            sinks_sealed: false,
        }
    }

    /// Clasifica e incorpora una línea cruda del flujo.
    pub fn ingest_line(&mut self, raw_line: &str) -> Result<(), DispatchFault> {
        self.ingest(parse(raw_line))
    }

    /// Incorpora un mensaje ya clasificado.
    pub fn ingest(&mut self, message: WireMessage) -> Result<(), DispatchFault> {
        match message {
            WireMessage::Ignored => Ok(()),

            WireMessage::Datum { replicate, datum } => {
                let exported_step = datum
                    .attributes
                    .get(STEP_ATTRIBUTE)
                    .and_then(|attribute_value| attribute_value.as_number())
                    .map(|numeric_step| numeric_step as i64)
                    .or_else(|| {
                        self.last_progress_step_by_replicate.get(&replicate).copied()
                    })
                    .unwrap_or(0);

                // Destinos desconocidos no abren sumidero ni bucket.
                if datum.target().is_some() {
                    let projection = SinkRecord {
                        replicate,
                        step: exported_step,
                        attributes: &datum.attributes,
                    };
                    let target_sink = match self.open_sinks.entry(datum.target_label.clone()) {
                        Entry::Occupied(occupied_slot) => occupied_slot.into_mut(),
                        Entry::Vacant(vacant_slot) => {
                            let mut provisioned_sink =
                                self.sink_provider.provision_sink(&datum.target_label)?;
                            provisioned_sink.start()?;
                            vacant_slot.insert(provisioned_sink)
                        }
                    };
                    target_sink.write(&projection)?;
                }

                self.replicate_builders
                    .entry(replicate)
                    .or_insert_with(|| ReplicateResultBuilder::new(replicate))
                    .add(datum);
                Ok(())
            }

            WireMessage::Progress { replicate, step } => {
                self.last_progress_step_by_replicate.insert(replicate, step);
                self.progress_calculator.update_step(step);
                Ok(())
            }

            WireMessage::End { replicate } => {
                let finalized_builder = self
                    .replicate_builders
                    .remove(&replicate)
                    .unwrap_or_else(|| ReplicateResultBuilder::new(replicate));
                self.completed_results.push(finalized_builder.build());

                let completed_count = self.completed_results.len() as u32;
                self.progress_calculator
                    .update_replicate_completed(completed_count);
                if completed_count < self.total_replicates {
                    self.progress_calculator.reset_for_next_replicate();
                }
                debug!("🧬 [REDUCER]: Replicate {} sealed ({}/{})", replicate, completed_count, self.total_replicates);
                Ok(())
            }

            WireMessage::Error { replicate, message } => {
                Err(DispatchFault::WireError { replicate, message })
            }
        }
    }

    /// Consume el flujo completo garantizando el sellado de sumideros
    /// en toda salida.
    pub async fn reduce_stream<LineStream>(
        &mut self,
        mut line_stream: LineStream,
    ) -> Result<(), DispatchFault>
    where
        LineStream: Stream<Item = Result<String, DispatchFault>> + Unpin,
    {
        let consumption_outcome = async {
            while let Some(line_result) = line_stream.next().await {
                self.ingest_line(&line_result?)?;
            }
            Ok(())
        }
        .await;

        let sealing_outcome = self.seal_sinks();
        consumption_outcome.and(sealing_outcome)
    }

    /// Sella todos los sumideros abiertos exactamente una vez.
    /// Idempotente; un fallo de sellado no impide sellar los demás.
    pub fn seal_sinks(&mut self) -> Result<(), DispatchFault> {
        if self.sinks_sealed {
            return Ok(());
        }
        self.sinks_sealed = true;

        let mut first_sealing_fault: Option<DispatchFault> = None;
        for (target_label, open_sink) in self.open_sinks.iter_mut() {
            if let Err(sealing_fault) = open_sink.join() {
                error!("❌ [SINK_SEAL_FAULT]: '{}' failed to join: {}", target_label, sealing_fault);
                first_sealing_fault.get_or_insert(DispatchFault::Sink(sealing_fault));
            }
        }

        match first_sealing_fault {
            Some(sealing_fault) => Err(sealing_fault),
            None => Ok(()),
        }
    }

    /// Resultados congelados de las réplicas completadas, sellando
    /// los sumideros si aún estuviera pendiente.
    pub fn into_results(mut self) -> Result<Vec<ReplicateResult>, DispatchFault> {
        self.seal_sinks()?;
        Ok(std::mem::take(&mut self.completed_results))
    }

    pub fn completed_replicates(&self) -> usize {
        self.completed_results.len()
    }
}

impl Drop for ResponseReducer {
    fn drop(&mut self) {
        // Red de seguridad: una estrategia que salga por pánico o
        // cancelación abrupta no deja sumideros sin sellar.
        let _ = self.seal_sinks();
    }
}
