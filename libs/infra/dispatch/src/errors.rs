// INICIO DEL ARCHIVO [libs/infra/dispatch/src/errors.rs]
//! =================================================================
//! APARATO: DISPATCH ERRORS (V4.1)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE DESPACHO DISTRIBUIDO
//! =================================================================

use josh_domain_models::ModelFault;
use josh_infra_exports::ExportFault;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchFault {
    #[error("ENDPOINT_INVALID: '{uri}' rejected: {reason}")]
    EndpointInvalid { uri: String, reason: String },

    #[error("API_KEY_REQUIRED: Endpoint '{0}' is the public cloud leader; supply --api-key to authenticate")]
    ApiKeyRequired(String),

    #[error("REMOTE_HTTP_{status}: Peer '{peer}' rejected the replicate request")]
    RemoteHttp {
        status: u16,
        peer: String,
        replicate: Option<u32>,
    },

    #[error("TRANSPORT_FAULT: Replicate stream collapsed: {detail}")]
    Transport {
        replicate: Option<u32>,
        detail: String,
    },

    #[error("WIRE_PROTOCOL_FAULT: {message}")]
    WireError {
        replicate: Option<u32>,
        message: String,
    },

    #[error("EXTERNAL_DATA_UNREADABLE: '{path}' could not be loaded: {detail}")]
    ExternalDataUnreadable { path: PathBuf, detail: String },

    #[error("JOB_CANCELLED: Dispatch aborted by caller signal")]
    Cancelled,

    #[error(transparent)]
    Sink(#[from] ExportFault),

    #[error(transparent)]
    Model(#[from] ModelFault),
}

impl DispatchFault {
    /// Réplica afectada, cuando el fallo la conoce. La superficie de
    /// mando la añade a la línea de error visible para el operador.
    pub fn replicate(&self) -> Option<u32> {
        match self {
            DispatchFault::RemoteHttp { replicate, .. }
            | DispatchFault::Transport { replicate, .. }
            | DispatchFault::WireError { replicate, .. } => *replicate,
            _ => None,
        }
    }

    /// Adjunta el índice de réplica a fallos que viajaron sin él.
    pub fn for_replicate(self, replicate_index: u32) -> Self {
        match self {
            DispatchFault::RemoteHttp {
                status,
                peer,
                replicate: None,
            } => DispatchFault::RemoteHttp {
                status,
                peer,
                replicate: Some(replicate_index),
            },
            DispatchFault::Transport {
                detail,
                replicate: None,
            } => DispatchFault::Transport {
                detail,
                replicate: Some(replicate_index),
            },
            DispatchFault::WireError {
                message,
                replicate: None,
            } => DispatchFault::WireError {
                message,
                replicate: Some(replicate_index),
            },
            other => other,
        }
    }
}
// FIN DEL ARCHIVO [libs/infra/dispatch/src/errors.rs]
