// [apps/cli/src/commands/validate.rs]
/*!
 * =================================================================
 * APARATO: VALIDATE COMMAND (V4.1)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L4)
 * RESPONSABILIDAD: VALIDACIÓN ESTRUCTURAL SIN TOCAR LA RED
 * =================================================================
 */

use crate::exit::{classify_program_io_fault, CliFault};
use clap::Args;
use josh_domain_source::{find_simulation, list_simulations, validate_program};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct ValidateArguments {
    /// Ruta al programa de simulación (.josh).
    pub program_file: PathBuf,

    /// Simulación concreta a verificar; sin ella solo se valida la
    /// estructura del programa.
    pub simulation_name: Option<String>,
}

pub fn execute(arguments: &ValidateArguments) -> Result<(), CliFault> {
    let program_code = std::fs::read_to_string(&arguments.program_file)
        .map_err(|io_fault| classify_program_io_fault(&arguments.program_file, io_fault))?;

    validate_program(&program_code)?;

    match &arguments.simulation_name {
        Some(requested_name) => {
            find_simulation(&program_code, requested_name)?;
            info!("✅ [VALIDATE]: Simulation '{}' is structurally sound.", requested_name);
        }
        None => {
            let declared_simulations = list_simulations(&program_code);
            info!(
                "✅ [VALIDATE]: Program is structurally sound ({} simulation(s): {}).",
                declared_simulations.len(),
                declared_simulations.join(", ")
            );
        }
    }

    Ok(())
}
