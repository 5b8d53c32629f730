// [libs/domain/planner/src/lib.rs]
/*!
 * =================================================================
 * APARATO: BATCH PLANNER CORE (V4.0 - GOLD MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: PLAN DETERMINISTA DE TRABAJOS DEL LOTE
 *
 * # Invariante de determinismo:
 * Para una entrada fija, la lista de trabajos es una función pura:
 * sin aleatoriedad y sin dependencia del orden de iteración de mapas.
 * =================================================================
 */

pub mod binding;
pub mod errors;
pub mod expansion;

pub use binding::parse_data_binding;
pub use errors::PlannerFault;
pub use expansion::expand_job_plan;
