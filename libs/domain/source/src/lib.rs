// [libs/domain/source/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SOURCE FRONTEND SEAM (V4.0 - GOLD MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: INTERFAZ NOMINAL SOBRE EL TEXTO DE SIMULACIÓN
 *
 * El intérprete del lenguaje de simulación es un colaborador externo:
 * el núcleo de ejecución consume el programa como texto opaco. Este
 * estrato aporta el escaneo estructural mínimo que la superficie de
 * mando necesita: localizar el bloque 'simulation' pedido, descubrir
 * referencias 'config.*' y 'external.*', y extraer los límites de
 * pasos que alimentan el cálculo de progreso.
 * =================================================================
 */

pub mod errors;
pub mod scanner;

pub use errors::SourceFault;
pub use scanner::{
    discover_config_variables, discover_external_resources, find_simulation, list_simulations,
    step_bounds, validate_program, SimulationBlock, StepBounds,
};
