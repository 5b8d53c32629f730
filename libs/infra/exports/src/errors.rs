// INICIO DEL ARCHIVO [libs/infra/exports/src/errors.rs]
//! =================================================================
//! APARATO: EXPORT SINK ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE PERSISTENCIA
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportFault {
    #[error("SINK_OPEN_FAULT: Unable to open export target '{target_label}': {source}")]
    OpenFault {
        target_label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SINK_WRITE_FAULT: Append to '{target_label}' failed: {source}")]
    WriteFault {
        target_label: String,
        #[source]
        source: csv::Error,
    },

    #[error("SINK_FLUSH_FAULT: Flush of '{target_label}' failed: {source}")]
    FlushFault {
        target_label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SINK_NOT_OPEN: Write issued against '{0}' outside its open window")]
    NotOpen(String),
}
// FIN DEL ARCHIVO [libs/infra/exports/src/errors.rs]
