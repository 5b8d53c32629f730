// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SIMULATION DOMAIN MODELS (V4.0 - PRODUCTION MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS SOBERANOS DEL NÚCLEO DE EJECUCIÓN
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. SINGLE SOURCE OF TRUTH: Peticiones, trabajos, registros de salida
 *    y resultados por réplica viven en un único estrato de dominio.
 * 2. IMMUTABILITY FIRST: La petición de simulación se sella en su
 *    constructor; los resultados se congelan en 'build()'.
 * 3. NOMINAL PRECISION: Nomenclatura nominal absoluta en los campos.
 * =================================================================
 */

pub mod datum;
pub mod errors;
pub mod request;
pub mod results;
pub mod variation;

pub use datum::{AttributeRow, AttributeValue, DatumTarget, OutputDatum};
pub use errors::ModelFault;
pub use request::{CustomTagSet, ExternalDataSet, SimulationRequest, RESERVED_TAG_NAMES};
pub use results::{ReplicateResult, ReplicateResultBuilder, SpatialBounds};
pub use variation::{Job, VariationGroup};
