// [apps/cli/src/exit.rs]
/*!
 * =================================================================
 * APARATO: EXIT CODE TRIAGE (V4.2 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L4)
 * RESPONSABILIDAD: TABLA DE CÓDIGOS DE SALIDA POR CLASE DE FALLO
 *
 * # Tabla:
 *   0   éxito            | 101 HTTP/URI
 *   1   carga            | 102 serialización
 *   2   lectura          | 103 red
 *   3   parseo           | 110 capacidad de rejilla ausente
 *   4   simulación ausente | 404 desconocido
 * Los códigos específicos de comando extienden la tabla sin reutilizar
 * el rango 0–3.
 * =================================================================
 */

use josh_domain_models::ModelFault;
use josh_domain_planner::PlannerFault;
use josh_domain_source::SourceFault;
use josh_infra_dispatch::DispatchFault;
use std::path::PathBuf;
use thiserror::Error;

pub const EXIT_LOAD: i32 = 1;
pub const EXIT_READ: i32 = 2;
pub const EXIT_PARSE: i32 = 3;
pub const EXIT_SIMULATION_MISSING: i32 = 4;
pub const EXIT_HTTP_URI: i32 = 101;
pub const EXIT_SERIALIZATION: i32 = 102;
pub const EXIT_NETWORK: i32 = 103;
pub const EXIT_GRID_CAPABILITY: i32 = 110;
pub const EXIT_UNKNOWN: i32 = 404;

/// Fallo de la superficie de mando, con su código de salida asociado.
#[derive(Error, Debug)]
pub enum CliFault {
    #[error("INPUT_FAULT: {0}")]
    Input(String),

    #[error("LOAD_FAULT: Program file '{path}' could not be located")]
    Load { path: PathBuf },

    #[error("READ_FAULT: '{path}' could not be read: {detail}")]
    Read { path: PathBuf, detail: String },

    #[error(transparent)]
    Source(#[from] SourceFault),

    #[error(transparent)]
    Planner(#[from] PlannerFault),

    #[error(transparent)]
    Model(#[from] ModelFault),

    #[error(transparent)]
    Dispatch(#[from] DispatchFault),

    #[error("REPORT_SERIALIZATION_FAULT: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("GRID_CAPABILITY_ABSENT: {0}")]
    GridCapability(String),

    #[error("UNEXPECTED_FAULT: {0}")]
    Unknown(String),
}

impl CliFault {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliFault::Input(_) | CliFault::Planner(_) | CliFault::Model(_) | CliFault::Load { .. } => {
                EXIT_LOAD
            }
            CliFault::Read { .. } => EXIT_READ,
            CliFault::Source(SourceFault::SimulationMissing(_)) => EXIT_SIMULATION_MISSING,
            CliFault::Source(_) => EXIT_PARSE,
            CliFault::Serialization(_) => EXIT_SERIALIZATION,
            CliFault::GridCapability(_) => EXIT_GRID_CAPABILITY,
            CliFault::Dispatch(dispatch_fault) => match dispatch_fault {
                DispatchFault::EndpointInvalid { .. }
                | DispatchFault::ApiKeyRequired(_)
                | DispatchFault::RemoteHttp { .. } => EXIT_HTTP_URI,
                DispatchFault::ExternalDataUnreadable { .. } => EXIT_READ,
                DispatchFault::Model(_) => EXIT_LOAD,
                DispatchFault::Sink(_) => EXIT_SERIALIZATION,
                DispatchFault::Transport { .. }
                | DispatchFault::WireError { .. }
                | DispatchFault::Cancelled => EXIT_NETWORK,
            },
            CliFault::Unknown(_) => EXIT_UNKNOWN,
        }
    }

    /// Línea única y accionable para el operador; el rastro completo
    /// queda disponible en modo verbose a través de la bitácora.
    pub fn operator_line(&self) -> String {
        match self {
            CliFault::Dispatch(dispatch_fault) => match dispatch_fault.replicate() {
                Some(replicate_index) => {
                    format!("{} (replicate {})", dispatch_fault, replicate_index)
                }
                None => dispatch_fault.to_string(),
            },
            other_fault => other_fault.to_string(),
        }
    }
}

/// Mapea fallos de E/S sobre el archivo de programa: inexistente es un
/// fallo de carga; cualquier otro contratiempo es un fallo de lectura.
pub fn classify_program_io_fault(path: &std::path::Path, io_fault: std::io::Error) -> CliFault {
    if io_fault.kind() == std::io::ErrorKind::NotFound {
        CliFault::Load {
            path: path.to_path_buf(),
        }
    } else {
        CliFault::Read {
            path: path.to_path_buf(),
            detail: io_fault.to_string(),
        }
    }
}
