// [libs/infra/exports/src/provider.rs]
/*!
 * =================================================================
 * APARATO: SINK PROVISIONING SEAM (V4.1)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: APERTURA DE SUMIDEROS POR NOMBRE DE ENTIDAD
 *
 * Cada invocación de estrategia recibe sumideros frescos: el reductor
 * abre perezosamente uno por nombre de entidad observado y los sella
 * todos exactamente una vez al salir.
 * =================================================================
 */

use crate::errors::ExportFault;
use crate::sink::{CsvExportSink, ExportSink, MemoryExportSink, MemorySinkState, SinkRecord};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Costura de aprovisionamiento: el reductor pide un sumidero nuevo la
/// primera vez que observa cada nombre de entidad.
pub trait ExportSinkProvider: Send + Sync {
    fn provision_sink(&self, target_label: &str) -> Result<Box<dyn ExportSink>, ExportFault>;
}

/// Aprovisionador CSV: un archivo por entidad bajo el directorio de
/// salida, con las etiquetas personalizadas como columnas fijas.
pub struct CsvDirectoryProvider {
    output_directory: PathBuf,
    file_stem: String,
    custom_tag_columns: Vec<(String, String)>,
}

impl CsvDirectoryProvider {
    pub fn new(
        output_directory: PathBuf,
        file_stem: impl Into<String>,
        custom_tag_columns: Vec<(String, String)>,
    ) -> Self {
        Self {
            output_directory,
            file_stem: file_stem.into(),
            custom_tag_columns,
        }
    }
}

impl ExportSinkProvider for CsvDirectoryProvider {
    fn provision_sink(&self, target_label: &str) -> Result<Box<dyn ExportSink>, ExportFault> {
        let sanitized_stem: String = self
            .file_stem
            .chars()
            .map(|stem_char| if stem_char.is_alphanumeric() { stem_char } else { '_' })
            .collect();
        let output_path = self
            .output_directory
            .join(format!("{}_{}.csv", sanitized_stem, target_label));
        Ok(Box::new(CsvExportSink::new(
            target_label,
            output_path,
            self.custom_tag_columns.clone(),
        )))
    }
}

/// Aprovisionador nulo para ejecuciones sin exportación a disco.
pub struct NullSinkProvider;

struct NullExportSink;

impl ExportSink for NullExportSink {
    fn start(&mut self) -> Result<(), ExportFault> {
        Ok(())
    }

    fn write(&mut self, _record: &SinkRecord<'_>) -> Result<(), ExportFault> {
        Ok(())
    }

    fn join(&mut self) -> Result<(), ExportFault> {
        Ok(())
    }
}

impl ExportSinkProvider for NullSinkProvider {
    fn provision_sink(&self, _target_label: &str) -> Result<Box<dyn ExportSink>, ExportFault> {
        Ok(Box::new(NullExportSink))
    }
}

/// Aprovisionador de memoria: conserva un asidero observable por
/// entidad para que las pruebas auditen filas y ciclo de vida. Los
/// clones comparten el registro observable.
#[derive(Default, Clone)]
pub struct MemorySinkProvider {
    observable_registry: Arc<Mutex<HashMap<String, Arc<Mutex<MemorySinkState>>>>>,
    fail_writes: bool,
}

impl MemorySinkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variante que rechaza toda escritura: certifica que un fallo de
    /// sumidero es fatal para el trabajo pero aún sella los demás.
    pub fn with_failing_writes() -> Self {
        Self {
            observable_registry: Arc::default(),
            fail_writes: true,
        }
    }

    pub fn state_for(&self, target_label: &str) -> Option<Arc<Mutex<MemorySinkState>>> {
        self.observable_registry
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            .get(target_label)
            .cloned()
    }

    pub fn observed_targets(&self) -> Vec<String> {
        let mut target_labels: Vec<String> = self
            .observable_registry
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            .keys()
            .cloned()
            .collect();
        target_labels.sort();
        target_labels
    }
}

impl ExportSinkProvider for MemorySinkProvider {
    fn provision_sink(&self, target_label: &str) -> Result<Box<dyn ExportSink>, ExportFault> {
        let observable_state = Arc::new(Mutex::new(MemorySinkState::default()));
        self.observable_registry
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            .insert(target_label.to_string(), Arc::clone(&observable_state));

        let provisioned_sink = MemoryExportSink::new(target_label, observable_state);
        Ok(Box::new(if self.fail_writes {
            provisioned_sink.failing_writes()
        } else {
            provisioned_sink
        }))
    }
}
