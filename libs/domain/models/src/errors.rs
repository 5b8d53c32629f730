// INICIO DEL ARCHIVO [libs/domain/models/src/errors.rs]
//! =================================================================
//! APARATO: DOMAIN MODEL ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE CONSTRUCCIÓN DE DOMINIO
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelFault {
    #[error("REPLICATE_COUNT_INVALID: At least one replicate is required, got {0}")]
    ReplicateCountInvalid(u32),

    #[error("TAG_NAME_RESERVED: Custom tag '{0}' collides with a built-in export column")]
    ReservedTagName(String),

    #[error("TAG_NAME_DUPLICATED: Custom tag '{0}' was supplied more than once")]
    DuplicateTagName(String),
}
// FIN DEL ARCHIVO [libs/domain/models/src/errors.rs]
