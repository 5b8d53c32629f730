// [apps/cli/src/commands/grid.rs]
/*!
 * =================================================================
 * APARATO: GRID CATALOG COMMANDS (V4.1)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L4)
 * RESPONSABILIDAD: SHELLS DE 'preprocess' E 'inspect' SOBRE LA COSTURA
 *
 * El preprocesado geoespacial y el formato binario de rejilla son
 * colaboradores externos del núcleo de ejecución. Estos comandos
 * validan sus argumentos, delegan en la costura 'GridCatalog' y
 * emergen con el código 110 cuando la capacidad no está instalada.
 * =================================================================
 */

use crate::exit::{classify_program_io_fault, CliFault};
use clap::Args;
use josh_domain_source::{find_simulation, validate_program};
use std::path::PathBuf;

/// Costura hacia la cadena de herramientas de rejilla precomputada.
pub trait GridCatalog: Send + Sync {
    fn preprocess(
        &self,
        program_file: &PathBuf,
        simulation_name: &str,
        output_grid: &PathBuf,
    ) -> Result<(), CliFault>;

    fn inspect(&self, grid_file: &PathBuf, query: &str) -> Result<String, CliFault>;
}

/// Capacidad ausente: instalación sin la cadena de rejilla.
pub struct UnavailableGridCatalog;

impl GridCatalog for UnavailableGridCatalog {
    fn preprocess(
        &self,
        _program_file: &PathBuf,
        _simulation_name: &str,
        _output_grid: &PathBuf,
    ) -> Result<(), CliFault> {
        Err(CliFault::GridCapability(
            "geospatial preprocessing toolchain is not installed in this build".to_string(),
        ))
    }

    fn inspect(&self, _grid_file: &PathBuf, _query: &str) -> Result<String, CliFault> {
        Err(CliFault::GridCapability(
            "precomputed grid reader is not installed in this build".to_string(),
        ))
    }
}

#[derive(Args, Debug)]
pub struct PreprocessArguments {
    /// Ruta al programa de simulación (.josh).
    pub program_file: PathBuf,

    /// Simulación cuyos insumos geoespaciales se precomputan.
    pub simulation_name: String,

    /// Ruta de la rejilla precomputada de salida.
    #[arg(long = "output-grid", default_value = "preprocessed.jshd")]
    pub output_grid: PathBuf,
}

pub fn execute_preprocess(
    arguments: &PreprocessArguments,
    grid_catalog: &dyn GridCatalog,
) -> Result<(), CliFault> {
    let program_code = std::fs::read_to_string(&arguments.program_file)
        .map_err(|io_fault| classify_program_io_fault(&arguments.program_file, io_fault))?;
    validate_program(&program_code)?;
    find_simulation(&program_code, &arguments.simulation_name)?;

    grid_catalog.preprocess(
        &arguments.program_file,
        &arguments.simulation_name,
        &arguments.output_grid,
    )
}

#[derive(Args, Debug)]
pub struct InspectArguments {
    /// Rejilla precomputada a consultar.
    pub grid_file: PathBuf,

    /// Consulta 'variable@x,y[,paso]'.
    pub query: String,
}

pub fn execute_inspect(
    arguments: &InspectArguments,
    grid_catalog: &dyn GridCatalog,
) -> Result<(), CliFault> {
    if !arguments.grid_file.exists() {
        return Err(CliFault::Load {
            path: arguments.grid_file.clone(),
        });
    }

    let inspection_report = grid_catalog.inspect(&arguments.grid_file, &arguments.query)?;
    println!("{}", inspection_report);
    Ok(())
}
