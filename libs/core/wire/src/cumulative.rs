// [libs/core/wire/src/cumulative.rs]
/*!
 * =================================================================
 * APARATO: CUMULATIVE PROGRESS LEDGER (V4.2 - GOLD MASTER)
 * CLASIFICACIÓN: PROTOCOL CORE (ESTRATO L1)
 * RESPONSABILIDAD: NORMALIZACIÓN ACUMULATIVA DEL PROGRESO PARALELO
 *
 * # Contrato:
 * Con N flujos de réplica intercalados, cada uno emitiendo pasos
 * absolutos estrictamente crecientes, la secuencia acumulativa
 * emitida es monótona no-decreciente y su valor final es
 * Σ por réplica de (último paso − primer paso + 1): la primera
 * observación de una réplica contribuye exactamente un paso.
 * =================================================================
 */

use crate::message::WireMessage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Libro mayor compartido entre las tareas del despachador líder-local.
///
/// Un único add atómico por línea PROGRESS; el candado del mapa de
/// últimos pasos se toma solo para calcular el delta, nunca sobre I/O.
#[derive(Debug, Default)]
pub struct CumulativeStepLedger {
    cumulative_total: AtomicI64,
    last_step_by_replicate: Mutex<HashMap<u32, i64>>,
}

impl CumulativeStepLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reescribe un PROGRESS absoluto a su forma acumulativa.
    /// Cualquier otro mensaje atraviesa intacto.
    pub fn rewrite(&self, message: WireMessage) -> WireMessage {
        let WireMessage::Progress { replicate, step } = message else {
            return message;
        };

        let step_delta = {
            let mut last_step_map = self
                .last_step_by_replicate
                .lock()
                .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner());
            let computed_delta = match last_step_map.get(&replicate) {
                // Pasos no crecientes se saturan a cero: la monotonía
                // del flujo agregado no es negociable.
                Some(previous_step) => (step - previous_step).max(0),
                None => 1,
            };
            last_step_map.insert(replicate, step);
            computed_delta
        };

        let cumulative_after_add =
            self.cumulative_total.fetch_add(step_delta, Ordering::SeqCst) + step_delta;

        WireMessage::Progress {
            replicate,
            step: cumulative_after_add,
        }
    }

    /// Valor acumulado observable (telemetría y certificación).
    pub fn total(&self) -> i64 {
        self.cumulative_total.load(Ordering::SeqCst)
    }
}
