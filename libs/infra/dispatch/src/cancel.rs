// [libs/infra/dispatch/src/cancel.rs]
/*!
 * =================================================================
 * APARATO: COOPERATIVE CANCEL SIGNAL (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SEÑAL DE ABORTO COOPERATIVO ENTRE TAREAS
 * =================================================================
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Señal de cancelación compartida entre el llamador y las tareas de
/// despacho. Cooperativa pero pronta: cada tarea la consulta antes de
/// arrancar y en cada línea recibida.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    triggered_flag: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.triggered_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered_flag.load(Ordering::SeqCst)
    }
}
