// [apps/cli/src/commands/run.rs]
/*!
 * =================================================================
 * APARATO: BATCH RUN COMMAND (V4.5 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L4)
 * RESPONSABILIDAD: ENSAMBLADO DE PETICIÓN Y CONDUCCIÓN DEL LOTE
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. FAIL BEFORE THE WIRE: Toda validación de entrada (programa,
 *    etiquetas, vinculaciones, endpoint, clave de API) ocurre antes
 *    de emitir un solo byte de red.
 * 2. FRESH PER JOB: Cada trabajo del plan recibe su propio directorio
 *    de exportación, sumideros frescos y barra de progreso propia.
 * =================================================================
 */

use crate::exit::{classify_program_io_fault, CliFault};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use josh_domain_models::{
    CustomTagSet, ExternalDataSet, Job, SimulationRequest, VariationGroup,
};
use josh_domain_planner::{expand_job_plan, parse_data_binding};
use josh_domain_source::{find_simulation, step_bounds, validate_program, StepBounds};
use josh_infra_dispatch::{
    normalize_endpoint, preflight_api_key, run_batch, BatchRunConfig, CancelSignal,
    HttpTransportConfig, HttpWorkerTransport, JobEnvironment, JobExecutionReport,
    ProgressListener, ProgressUpdate, PUBLIC_CLOUD_ENDPOINT,
};
use josh_infra_exports::{CsvDirectoryProvider, ExportSinkProvider};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Directivas comunes de ejecución de lotes.
#[derive(Args, Debug)]
pub struct ExecutionArguments {
    /// Ruta al programa de simulación (.josh).
    pub program_file: PathBuf,

    /// Nombre de la simulación a ejecutar.
    pub simulation_name: String,

    /// Endpoint del clúster de ejecución.
    #[arg(long, env = "JOSH_ENDPOINT", default_value = PUBLIC_CLOUD_ENDPOINT)]
    pub endpoint: String,

    /// Clave de API del endpoint.
    #[arg(long = "api-key", env = "JOSH_API_KEY")]
    pub api_key: Option<String>,

    /// Vinculación 'nombre=ruta'; ';' separa candidatos de un grupo de
    /// variación (repetible, un grupo por flag).
    #[arg(long = "data", value_name = "NAME=PATH[;NAME=PATH…]")]
    pub data_bindings: Vec<String>,

    /// Réplicas por trabajo del lote.
    #[arg(long, default_value_t = 1)]
    pub replicates: u32,

    /// Cota K de trabajadores simultáneos en modo líder local.
    #[arg(long = "concurrent-workers", default_value_t = 4)]
    pub concurrent_workers: usize,

    /// Delegar la coordinación de réplicas al líder remoto.
    #[arg(long = "remote-leader", default_value_t = false)]
    pub remote_leader: bool,

    /// Preferir aritmética float64 sobre decimales de alta precisión.
    #[arg(long = "use-float-64", default_value_t = false)]
    pub use_float_64: bool,

    /// Etiqueta personalizada 'nombre=valor' (repetible). Nombres
    /// reservados: replicate, step, variable.
    #[arg(long = "custom-tag", value_name = "NAME=VALUE")]
    pub custom_tags: Vec<String>,

    /// Directorio raíz de las exportaciones CSV.
    #[arg(long = "output-directory", default_value = "josh_output")]
    pub output_directory: PathBuf,
}

/// Petición sellada más el plan de trabajos, listos para conducir.
#[derive(Debug)]
pub struct AssembledBatch {
    pub template_request: SimulationRequest,
    pub planned_jobs: Vec<Job>,
    pub step_bounds: StepBounds,
    pub custom_tag_pairs: Vec<(String, String)>,
}

/// Valida las directivas y ensambla el lote sin tocar la red.
pub fn assemble_batch(arguments: &ExecutionArguments) -> Result<AssembledBatch, CliFault> {
    // 1. CARGA Y VALIDACIÓN ESTRUCTURAL DEL PROGRAMA
    let program_code = std::fs::read_to_string(&arguments.program_file)
        .map_err(|io_fault| classify_program_io_fault(&arguments.program_file, io_fault))?;
    validate_program(&program_code)?;
    let simulation_block = find_simulation(&program_code, &arguments.simulation_name)?;

    let resolved_bounds = step_bounds(&simulation_block.block_body).unwrap_or(StepBounds {
        low_step: 0,
        high_step: 0,
    });

    // 2. ETIQUETAS PERSONALIZADAS (nombres reservados vetados)
    let custom_tag_pairs = arguments
        .custom_tags
        .iter()
        .map(|raw_tag| {
            raw_tag
                .split_once('=')
                .map(|(tag_name, tag_value)| (tag_name.trim().to_string(), tag_value.to_string()))
                .ok_or_else(|| {
                    CliFault::Input(format!("custom tag '{}' must be NAME=VALUE", raw_tag))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let custom_tag_set = CustomTagSet::try_from_pairs(custom_tag_pairs.clone())?;

    // 3. EJES DE VARIACIÓN Y PLAN DE TRABAJOS
    let variation_groups: Vec<VariationGroup> = arguments
        .data_bindings
        .iter()
        .map(|raw_binding| parse_data_binding(raw_binding))
        .collect::<Result<_, _>>()?;
    let planned_jobs = expand_job_plan(
        &BTreeMap::new(),
        &variation_groups,
        arguments.replicates,
        &custom_tag_set,
    )?;

    // 4. PETICIÓN TEMPLATE SELLADA
    let template_request = SimulationRequest::new(
        program_code,
        arguments.simulation_name.clone(),
        arguments.replicates,
        !arguments.use_float_64,
        arguments.endpoint.clone(),
        arguments.api_key.clone(),
        ExternalDataSet::new(),
        custom_tag_set,
    )?;

    Ok(AssembledBatch {
        template_request,
        planned_jobs,
        step_bounds: resolved_bounds,
        custom_tag_pairs,
    })
}

/// Ambiente de trabajo del operador: CSV por trabajo y barra de
/// progreso indicatif con alcance de un solo trabajo.
struct OperatorJobEnvironment {
    output_directory: PathBuf,
    simulation_name: String,
    custom_tag_pairs: Vec<(String, String)>,
    total_jobs: usize,
}

impl JobEnvironment for OperatorJobEnvironment {
    fn sink_provider(&self, job_position: usize, _job: &Job) -> Box<dyn ExportSinkProvider> {
        // Varios trabajos no deben pisarse los archivos: subdirectorio
        // por posición cuando el plan tiene más de un trabajo.
        let job_directory = if self.total_jobs > 1 {
            self.output_directory.join(format!("job_{:03}", job_position))
        } else {
            self.output_directory.clone()
        };
        Box::new(CsvDirectoryProvider::new(
            job_directory,
            self.simulation_name.clone(),
            self.custom_tag_pairs.clone(),
        ))
    }

    fn progress_listener(&self, job_position: usize) -> Box<dyn ProgressListener> {
        Box::new(OperatorProgressBar::new(job_position + 1, self.total_jobs))
    }
}

/// Barra de progreso del operador sobre indicatif.
struct OperatorProgressBar {
    progress_bar: ProgressBar,
}

impl OperatorProgressBar {
    fn new(job_ordinal: usize, total_jobs: usize) -> Self {
        let progress_bar = ProgressBar::new(100);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{prefix} [{bar:36}] {pos:>3}% · {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress_bar.set_prefix(format!("job {}/{}", job_ordinal, total_jobs));
        Self { progress_bar }
    }
}

impl ProgressListener for OperatorProgressBar {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.progress_bar.set_position(update.percent_complete as u64);
        self.progress_bar.set_message(format!(
            "{}/{} replicates",
            update.replicates_completed, update.total_replicates
        ));
        if update.percent_complete >= 100
            && update.replicates_completed >= update.total_replicates
        {
            self.progress_bar.finish_with_message("complete");
        }
    }
}

/// Ejecuta el lote completo. `force_remote_leader` fija la estrategia
/// de delegación sin importar el flag (subcomando runRemote).
pub async fn execute(
    arguments: &ExecutionArguments,
    force_remote_leader: bool,
) -> Result<Vec<JobExecutionReport>, CliFault> {
    let assembled_batch = assemble_batch(arguments)?;

    // 5. NORMALIZACIÓN DE ENDPOINT Y ANTESALA DE AUTENTICACIÓN
    let endpoint_plan = normalize_endpoint(&arguments.endpoint)?;
    preflight_api_key(&endpoint_plan, arguments.api_key.as_deref())?;

    let transport = Arc::new(HttpWorkerTransport::new(
        endpoint_plan,
        HttpTransportConfig::default(),
    )?);

    // 6. SEÑAL DE TERMINACIÓN ORDENADA (Ctrl-C)
    let cancel_signal = CancelSignal::new();
    let signal_reference = cancel_signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ [SIGNAL]: Termination requested by host. Cancelling dispatch…");
            signal_reference.trigger();
        }
    });

    let environment = OperatorJobEnvironment {
        output_directory: arguments.output_directory.clone(),
        simulation_name: arguments.simulation_name.clone(),
        custom_tag_pairs: assembled_batch.custom_tag_pairs.clone(),
        total_jobs: assembled_batch.planned_jobs.len(),
    };

    let batch_config = BatchRunConfig {
        use_remote_leader: force_remote_leader || arguments.remote_leader,
        concurrent_workers: arguments.concurrent_workers,
        low_step: assembled_batch.step_bounds.low_step,
        steps_per_replicate: assembled_batch.step_bounds.total_steps(),
    };

    info!(
        "🚀 [RUN]: '{}': {} job(s) × {} replicate(s), strategy: {}",
        arguments.simulation_name,
        assembled_batch.planned_jobs.len(),
        arguments.replicates,
        if batch_config.use_remote_leader { "offload-leader" } else { "local-leader" }
    );

    let execution_reports = run_batch(
        &assembled_batch.template_request,
        &assembled_batch.planned_jobs,
        transport,
        &environment,
        &batch_config,
        &cancel_signal,
    )
    .await?;

    for execution_report in &execution_reports {
        let replicate_count = execution_report.replicate_results.len();
        let record_volume: usize = execution_report
            .replicate_results
            .iter()
            .map(|replicate_result| {
                replicate_result.simulation_records.len()
                    + replicate_result.patch_records.len()
                    + replicate_result.entity_records.len()
            })
            .sum();
        info!(
            "📊 [SUMMARY]: Job {}: {} replicates, {} records",
            execution_report.job_position, replicate_count, record_volume
        );
    }

    Ok(execution_reports)
}
