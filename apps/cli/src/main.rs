// [apps/cli/src/main.rs]
/*!
 * =================================================================
 * APARATO: JOSH COMMAND SHELL (V4.4 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO Y DESPACHO DE SUBCOMANDOS
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. PURE SWITCHBOARD: El binario delega la totalidad de la lógica en
 *    la librería de mando; aquí solo viven el parseo de directivas,
 *    la ignición de telemetría y el triaje de códigos de salida.
 * 2. ONE LINE PER FAILURE: Cada fallo emerge como una única línea
 *    accionable; el rastro completo queda en la bitácora verbose.
 * =================================================================
 */

use clap::{Parser, Subcommand};
use josh_cli_lib::commands::grid::UnavailableGridCatalog;
use josh_cli_lib::commands::{discover_config, export_deps, grid, run, server, validate};
use josh_cli_lib::exit::CliFault;
use tracing::{debug, error};

/// Directivas de mando del núcleo de ejecución distribuida Josh.
#[derive(Parser, Debug)]
#[command(
    name = "josh",
    version = "0.4.0",
    about = "Josh distributed execution core // batch runs, remote offload, leader service"
)]
struct JoshCommandLine {
    #[command(subcommand)]
    command: JoshSubcommand,
}

#[derive(Subcommand, Debug)]
enum JoshSubcommand {
    /// Ejecuta un lote coordinando trabajadores como líder local.
    Run(run::ExecutionArguments),
    /// Delega el lote completo al líder remoto (un POST por trabajo).
    #[command(alias = "runRemote")]
    RunRemote(run::ExecutionArguments),
    /// Valida la estructura del programa sin tocar la red.
    Validate(validate::ValidateArguments),
    /// Precomputa los insumos geoespaciales de una simulación.
    Preprocess(grid::PreprocessArguments),
    /// Consulta una rejilla precomputada.
    Inspect(grid::InspectArguments),
    /// Sirve el rol líder por HTTP sobre un endpoint trabajador.
    Server(server::ServerArguments),
    /// Descubre las variables 'config.*' referenciadas por el programa.
    #[command(alias = "discoverConfig")]
    DiscoverConfig(discover_config::DiscoverConfigArguments),
    /// Lista los recursos 'external.*' que el mapa de datos debe satisfacer.
    #[command(alias = "exportDeps")]
    ExportDeps(export_deps::ExportDepsArguments),
}

#[tokio::main]
async fn main() {
    // 1. IGNICIÓN DEL SISTEMA DE OBSERVABILIDAD
    josh_shared_telemetry::init_tracing("josh-cli");

    // 2. PARSEO DE DIRECTIVAS DE MANDO
    let command_line = JoshCommandLine::parse();

    // 3. DESPACHO Y TRIAJE DE SALIDA
    if let Err(command_fault) = dispatch_subcommand(command_line.command).await {
        error!("❌ [FAULT]: {}", command_fault.operator_line());
        debug!("🔬 [FAULT_DETAIL]: {:?}", command_fault);
        std::process::exit(command_fault.exit_code());
    }
}

async fn dispatch_subcommand(subcommand: JoshSubcommand) -> Result<(), CliFault> {
    match subcommand {
        JoshSubcommand::Run(execution_arguments) => {
            run::execute(&execution_arguments, false).await.map(|_| ())
        }
        JoshSubcommand::RunRemote(execution_arguments) => {
            run::execute(&execution_arguments, true).await.map(|_| ())
        }
        JoshSubcommand::Validate(validate_arguments) => validate::execute(&validate_arguments),
        JoshSubcommand::Preprocess(preprocess_arguments) => {
            grid::execute_preprocess(&preprocess_arguments, &UnavailableGridCatalog)
        }
        JoshSubcommand::Inspect(inspect_arguments) => {
            grid::execute_inspect(&inspect_arguments, &UnavailableGridCatalog)
        }
        JoshSubcommand::Server(server_arguments) => server::execute(&server_arguments).await,
        JoshSubcommand::DiscoverConfig(discover_arguments) => {
            discover_config::execute(&discover_arguments)
        }
        JoshSubcommand::ExportDeps(export_arguments) => export_deps::execute(&export_arguments),
    }
}
