// [apps/cli/src/commands/discover_config.rs]
/*!
 * =================================================================
 * APARATO: DISCOVER CONFIG COMMAND (V4.1)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L4)
 * RESPONSABILIDAD: REPORTE JSON DE VARIABLES DE CONFIGURACIÓN
 * =================================================================
 */

use crate::exit::{classify_program_io_fault, CliFault};
use clap::Args;
use josh_domain_source::discover_config_variables;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DiscoverConfigArguments {
    /// Ruta al programa de simulación (.josh).
    pub program_file: PathBuf,
}

#[derive(Serialize)]
struct ConfigDiscoveryReport {
    program: String,
    config_variables: Vec<String>,
}

pub fn execute(arguments: &DiscoverConfigArguments) -> Result<(), CliFault> {
    let program_code = std::fs::read_to_string(&arguments.program_file)
        .map_err(|io_fault| classify_program_io_fault(&arguments.program_file, io_fault))?;

    let discovery_report = ConfigDiscoveryReport {
        program: arguments.program_file.display().to_string(),
        config_variables: discover_config_variables(&program_code).into_iter().collect(),
    };

    println!("{}", serde_json::to_string_pretty(&discovery_report)?);
    Ok(())
}
