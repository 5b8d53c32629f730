// [libs/core/wire/src/message.rs]
/*!
 * =================================================================
 * APARATO: WIRE MESSAGE UNION (V4.1)
 * CLASIFICACIÓN: PROTOCOL CORE (ESTRATO L1)
 * RESPONSABILIDAD: UNIÓN ETIQUETADA DE MENSAJES DEL PROTOCOLO
 * =================================================================
 */

use josh_domain_models::OutputDatum;

/// Mensaje clasificado del protocolo de línea.
///
/// `Ignored` cubre líneas en blanco, comentarios y el marcador de
/// réplica vacío `[n]`; nunca se retransmite.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    /// Registro de datos de una réplica.
    Datum { replicate: u32, datum: OutputDatum },
    /// Latido de progreso; el paso es absoluto, no un delta.
    Progress { replicate: u32, step: i64 },
    /// Fin del flujo de una réplica.
    End { replicate: u32 },
    /// Fallo reportado por el par remoto; la réplica es opcional.
    Error {
        replicate: Option<u32>,
        message: String,
    },
    /// Línea benigna sin contenido de protocolo.
    Ignored,
}

impl WireMessage {
    /// Réplica portada por el mensaje, si este la referencia.
    pub fn replicate(&self) -> Option<u32> {
        match self {
            WireMessage::Datum { replicate, .. }
            | WireMessage::Progress { replicate, .. }
            | WireMessage::End { replicate } => Some(*replicate),
            WireMessage::Error { replicate, .. } => *replicate,
            WireMessage::Ignored => None,
        }
    }

    /// Reescribe el campo de réplica. El despachador líder-local es la
    /// fuente de verdad del índice: el trabajador siempre reporta 0.
    pub fn with_replicate(self, true_replicate_index: u32) -> Self {
        match self {
            WireMessage::Datum { datum, .. } => WireMessage::Datum {
                replicate: true_replicate_index,
                datum,
            },
            WireMessage::Progress { step, .. } => WireMessage::Progress {
                replicate: true_replicate_index,
                step,
            },
            WireMessage::End { .. } => WireMessage::End {
                replicate: true_replicate_index,
            },
            WireMessage::Error { message, .. } => WireMessage::Error {
                replicate: Some(true_replicate_index),
                message,
            },
            WireMessage::Ignored => WireMessage::Ignored,
        }
    }
}
