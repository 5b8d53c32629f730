// [libs/infra/exports/src/lib.rs]
/*!
 * =================================================================
 * APARATO: EXPORT SINK INFRASTRUCTURE (V4.0 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA APPEND-ONLY DE REGISTROS POR ENTIDAD
 * =================================================================
 */

pub mod errors;
pub mod provider;
pub mod sink;

pub use errors::ExportFault;
pub use provider::{CsvDirectoryProvider, ExportSinkProvider, MemorySinkProvider, NullSinkProvider};
pub use sink::{
    CsvExportSink, ExportSink, MemoryExportSink, MemorySinkRow, MemorySinkState, SinkRecord,
};
