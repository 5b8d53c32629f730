// INICIO DEL ARCHIVO [libs/domain/source/src/errors.rs]
//! =================================================================
//! APARATO: SOURCE FRONTEND ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE ESCANEO ESTRUCTURAL
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SourceFault {
    #[error("SIMULATION_MISSING: No simulation named '{0}' in the supplied program")]
    SimulationMissing(String),

    #[error("BRACES_UNBALANCED: Block opened at offset {opened_at} never closes")]
    UnbalancedBraces { opened_at: usize },

    #[error("BRACES_ORPHANED: Closing brace at offset {closed_at} has no open block")]
    OrphanedBrace { closed_at: usize },
}
// FIN DEL ARCHIVO [libs/domain/source/src/errors.rs]
