// INICIO DEL ARCHIVO [libs/domain/planner/src/errors.rs]
//! =================================================================
//! APARATO: PLANNER ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE PLANIFICACIÓN
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlannerFault {
    #[error("DATA_BINDING_SYNTAX: Expected 'name=path', got '{0}'")]
    BindingSyntax(String),

    #[error("DATA_GROUP_MIXED_NAMES: Variation group binds both '{first}' and '{second}'; one logical filename per group")]
    MixedGroupNames { first: String, second: String },

    #[error("DATA_GROUP_EMPTY: Variation group '{0}' declares no candidate paths")]
    EmptyGroup(String),
}
// FIN DEL ARCHIVO [libs/domain/planner/src/errors.rs]
