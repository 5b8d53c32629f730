// [apps/cli/src/commands/export_deps.rs]
/*!
 * =================================================================
 * APARATO: EXPORT DEPS COMMAND (V4.1)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L4)
 * RESPONSABILIDAD: REPORTE JSON DE DEPENDENCIAS DE DATOS EXTERNOS
 * =================================================================
 */

use crate::exit::{classify_program_io_fault, CliFault};
use clap::Args;
use josh_domain_source::discover_external_resources;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportDepsArguments {
    /// Ruta al programa de simulación (.josh).
    pub program_file: PathBuf,
}

#[derive(Serialize)]
struct ExternalDependencyReport {
    program: String,
    /// Nombres lógicos que el mapa '--data' debe satisfacer.
    external_resources: Vec<String>,
}

pub fn execute(arguments: &ExportDepsArguments) -> Result<(), CliFault> {
    let program_code = std::fs::read_to_string(&arguments.program_file)
        .map_err(|io_fault| classify_program_io_fault(&arguments.program_file, io_fault))?;

    let dependency_report = ExternalDependencyReport {
        program: arguments.program_file.display().to_string(),
        external_resources: discover_external_resources(&program_code).into_iter().collect(),
    };

    println!("{}", serde_json::to_string_pretty(&dependency_report)?);
    Ok(())
}
