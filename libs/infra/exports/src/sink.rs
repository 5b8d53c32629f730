// [libs/infra/exports/src/sink.rs]
/*!
 * =================================================================
 * APARATO: ENTITY EXPORT SINKS (V4.4 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ESCRITURA APPEND-ONLY POR NOMBRE DE ENTIDAD
 *
 * # Ciclo de vida:
 *   start → write(registro)* → join
 *
 * 'join' descarga y libera los recursos del sistema; es idempotente y
 * debe poder invocarse desde una ruta de limpieza tras un fallo
 * parcial a mitad de escritura.
 *
 * # Esquema CSV (decisión documentada):
 * Las columnas se congelan con el PRIMER registro del sumidero:
 * 'replicate', 'step', una columna por etiqueta personalizada y una
 * por atributo observado. Registros posteriores descartan atributos
 * nuevos y serializan vacíos los ausentes.
 * =================================================================
 */

use crate::errors::ExportFault;
use josh_domain_models::AttributeRow;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Proyección de un registro hacia un sumidero: réplica de origen,
/// paso de simulación y atributos en orden de observación.
pub struct SinkRecord<'datum> {
    pub replicate: u32,
    pub step: i64,
    pub attributes: &'datum AttributeRow,
}

/// Contrato de sumidero por nombre de entidad.
pub trait ExportSink: Send {
    fn start(&mut self) -> Result<(), ExportFault>;
    fn write(&mut self, record: &SinkRecord<'_>) -> Result<(), ExportFault>;
    fn join(&mut self) -> Result<(), ExportFault>;
}

/// Columnas integradas que preceden a las de atributo.
const BUILTIN_COLUMNS: &[&str] = &["replicate", "step"];

enum CsvSinkState {
    Dormant,
    Open {
        csv_writer: csv::Writer<File>,
        frozen_attribute_columns: Option<Vec<String>>,
    },
    Sealed,
}

/// Sumidero CSV en streaming: una fila por registro, esquema congelado
/// con el primer registro observado.
pub struct CsvExportSink {
    target_label: String,
    output_path: PathBuf,
    custom_tag_columns: Vec<(String, String)>,
    state: CsvSinkState,
}

impl CsvExportSink {
    pub fn new(
        target_label: impl Into<String>,
        output_path: PathBuf,
        custom_tag_columns: Vec<(String, String)>,
    ) -> Self {
        Self {
            target_label: target_label.into(),
            output_path,
            custom_tag_columns,
            state: CsvSinkState::Dormant,
        }
    }

    fn freeze_schema(&self, first_record: &SinkRecord<'_>) -> Vec<String> {
        first_record
            .attributes
            .names()
            .filter(|attribute_name| {
                !BUILTIN_COLUMNS.contains(attribute_name)
                    && !self
                        .custom_tag_columns
                        .iter()
                        .any(|(tag_name, _)| tag_name == attribute_name)
            })
            .map(str::to_string)
            .collect()
    }
}

impl ExportSink for CsvExportSink {
    fn start(&mut self) -> Result<(), ExportFault> {
        match self.state {
            CsvSinkState::Dormant => {
                if let Some(parent_directory) = self.output_path.parent() {
                    std::fs::create_dir_all(parent_directory).map_err(|io_fault| {
                        ExportFault::OpenFault {
                            target_label: self.target_label.clone(),
                            source: io_fault,
                        }
                    })?;
                }
                let output_file =
                    File::create(&self.output_path).map_err(|io_fault| ExportFault::OpenFault {
                        target_label: self.target_label.clone(),
                        source: io_fault,
                    })?;
                debug!(
                    "🗃️ [SINK_OPEN]: '{}' streaming into {:?}",
                    self.target_label, self.output_path
                );
                self.state = CsvSinkState::Open {
                    csv_writer: csv::Writer::from_writer(output_file),
                    frozen_attribute_columns: None,
                };
                Ok(())
            }
            CsvSinkState::Open { .. } => Ok(()),
            CsvSinkState::Sealed => Err(ExportFault::NotOpen(self.target_label.clone())),
        }
    }

    fn write(&mut self, record: &SinkRecord<'_>) -> Result<(), ExportFault> {
        let frozen_columns = match &self.state {
            CsvSinkState::Open {
                frozen_attribute_columns: Some(existing_columns),
                ..
            } => Some(existing_columns.clone()),
            CsvSinkState::Open { .. } => None,
            _ => return Err(ExportFault::NotOpen(self.target_label.clone())),
        };
        let attribute_columns = frozen_columns.unwrap_or_else(|| self.freeze_schema(record));

        let CsvSinkState::Open {
            csv_writer,
            frozen_attribute_columns,
        } = &mut self.state
        else {
            return Err(ExportFault::NotOpen(self.target_label.clone()));
        };

        if frozen_attribute_columns.is_none() {
            let mut header_row: Vec<String> =
                BUILTIN_COLUMNS.iter().map(|column| column.to_string()).collect();
            header_row.extend(self.custom_tag_columns.iter().map(|(tag_name, _)| tag_name.clone()));
            header_row.extend(attribute_columns.iter().cloned());
            csv_writer
                .write_record(&header_row)
                .map_err(|csv_fault| ExportFault::WriteFault {
                    target_label: self.target_label.clone(),
                    source: csv_fault,
                })?;
            *frozen_attribute_columns = Some(attribute_columns.clone());
        }

        let mut data_row: Vec<String> = vec![record.replicate.to_string(), record.step.to_string()];
        data_row.extend(self.custom_tag_columns.iter().map(|(_, tag_value)| tag_value.clone()));
        data_row.extend(attribute_columns.iter().map(|column_name| {
            record
                .attributes
                .get(column_name)
                .map(|attribute_value| attribute_value.render())
                .unwrap_or_default()
        }));

        csv_writer
            .write_record(&data_row)
            .map_err(|csv_fault| ExportFault::WriteFault {
                target_label: self.target_label.clone(),
                source: csv_fault,
            })
    }

    fn join(&mut self) -> Result<(), ExportFault> {
        match std::mem::replace(&mut self.state, CsvSinkState::Sealed) {
            CsvSinkState::Open { mut csv_writer, .. } => {
                csv_writer.flush().map_err(|io_fault| ExportFault::FlushFault {
                    target_label: self.target_label.clone(),
                    source: io_fault,
                })?;
                debug!("🏁 [SINK_JOIN]: '{}' flushed and released", self.target_label);
                Ok(())
            }
            CsvSinkState::Dormant | CsvSinkState::Sealed => Ok(()),
        }
    }
}

impl Drop for CsvExportSink {
    fn drop(&mut self) {
        if matches!(self.state, CsvSinkState::Open { .. }) {
            warn!(
                "⚠️ [SINK_LEAK]: '{}' dropped while open; forcing terminal flush",
                self.target_label
            );
            let _ = self.join();
        }
    }
}

/// Fila registrada por el sumidero de memoria del Proving Grounds.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySinkRow {
    pub replicate: u32,
    pub step: i64,
    pub rendered_attributes: Vec<(String, String)>,
}

/// Estado observable de un sumidero de memoria.
#[derive(Debug, Default)]
pub struct MemorySinkState {
    pub start_invocations: usize,
    pub join_invocations: usize,
    pub rows: Vec<MemorySinkRow>,
}

/// Sumidero de memoria: registra el ciclo de vida completo para que
/// las pruebas certifiquen la liberación exactamente-una-vez.
pub struct MemoryExportSink {
    target_label: String,
    observable_state: Arc<Mutex<MemorySinkState>>,
    fail_writes: bool,
}

impl MemoryExportSink {
    pub fn new(target_label: impl Into<String>, observable_state: Arc<Mutex<MemorySinkState>>) -> Self {
        Self {
            target_label: target_label.into(),
            observable_state,
            fail_writes: false,
        }
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl ExportSink for MemoryExportSink {
    fn start(&mut self) -> Result<(), ExportFault> {
        self.observable_state
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            .start_invocations += 1;
        Ok(())
    }

    fn write(&mut self, record: &SinkRecord<'_>) -> Result<(), ExportFault> {
        if self.fail_writes {
            return Err(ExportFault::NotOpen(self.target_label.clone()));
        }
        let mut unlocked_state = self
            .observable_state
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner());
        unlocked_state.rows.push(MemorySinkRow {
            replicate: record.replicate,
            step: record.step,
            rendered_attributes: record
                .attributes
                .iter()
                .map(|(attribute_name, attribute_value)| {
                    (attribute_name.to_string(), attribute_value.render())
                })
                .collect(),
        });
        Ok(())
    }

    fn join(&mut self) -> Result<(), ExportFault> {
        self.observable_state
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            .join_invocations += 1;
        Ok(())
    }
}
