// [libs/infra/dispatch/src/driver.rs]
/*!
 * =================================================================
 * APARATO: BATCH EXECUTION DRIVER (V4.3 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CONDUCCIÓN SECUENCIAL DEL PLAN DE TRABAJOS
 *
 * Cada trabajo planificado recibe sumideros frescos y un calculador
 * de progreso propio, corre bajo la estrategia configurada y sella
 * sus recursos al terminar. El primer trabajo fallido aborta el lote;
 * las salidas de los trabajos ya completados permanecen en disco.
 * =================================================================
 */

use crate::cancel::CancelSignal;
use crate::errors::DispatchFault;
use crate::local_leader::LocalLeaderDispatcher;
use crate::offload::OffloadLeaderStrategy;
use crate::progress::{ProgressCalculator, ProgressListener};
use crate::reducer::ResponseReducer;
use crate::transport::{ExecutionStrategy, WorkerTransport};
use josh_domain_models::{ExternalDataSet, Job, ReplicateResult, SimulationRequest};
use josh_infra_exports::ExportSinkProvider;
use std::sync::Arc;
use tracing::{info, instrument};

/// Configuración del lote completa e inmutable durante la corrida.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunConfig {
    /// true → delega la coordinación al líder remoto (un POST por
    /// trabajo); false → el CLI juega el rol de líder local.
    pub use_remote_leader: bool,
    /// Cota K de trabajadores simultáneos en modo líder local.
    pub concurrent_workers: usize,
    /// Límite bajo de pasos declarado por la simulación.
    pub low_step: i64,
    /// Pasos totales por réplica (T del calculador de progreso).
    pub steps_per_replicate: i64,
}

/// Costura de ambiente por trabajo: sumideros frescos y oyente de
/// progreso con alcance de un solo trabajo.
pub trait JobEnvironment: Send + Sync {
    fn sink_provider(&self, job_position: usize, job: &Job) -> Box<dyn ExportSinkProvider>;
    fn progress_listener(&self, job_position: usize) -> Box<dyn ProgressListener>;
}

/// Acta de un trabajo completado del lote.
#[derive(Debug)]
pub struct JobExecutionReport {
    pub job_position: usize,
    pub job: Job,
    pub replicate_results: Vec<ReplicateResult>,
}

/// Conduce el plan completo de trabajos contra el transporte dado.
#[instrument(skip_all, fields(jobs = planned_jobs.len()))]
pub async fn run_batch(
    template_request: &SimulationRequest,
    planned_jobs: &[Job],
    transport: Arc<dyn WorkerTransport>,
    environment: &dyn JobEnvironment,
    batch_config: &BatchRunConfig,
    cancel: &CancelSignal,
) -> Result<Vec<JobExecutionReport>, DispatchFault> {
    let strategy: Box<dyn ExecutionStrategy> = if batch_config.use_remote_leader {
        Box::new(OffloadLeaderStrategy::new(Arc::clone(&transport)))
    } else {
        Box::new(LocalLeaderDispatcher::new(
            Arc::clone(&transport),
            batch_config.concurrent_workers,
        ))
    };

    let mut execution_reports = Vec::with_capacity(planned_jobs.len());

    for (job_position, planned_job) in planned_jobs.iter().enumerate() {
        if cancel.is_triggered() {
            return Err(DispatchFault::Cancelled);
        }

        info!(
            "🚚 [BATCH]: Job {}/{} starting ({} replicates)",
            job_position + 1,
            planned_jobs.len(),
            planned_job.replicate_count
        );

        let external_data = load_job_external_data(planned_job).await?;
        let job_request =
            template_request.with_job_overrides(external_data, planned_job.replicate_count)?;

        let progress_calculator = ProgressCalculator::new(
            batch_config.low_step,
            batch_config.steps_per_replicate,
            planned_job.replicate_count,
            environment.progress_listener(job_position),
        );
        let mut job_reducer = ResponseReducer::new(
            environment.sink_provider(job_position, planned_job),
            progress_calculator,
            planned_job.replicate_count,
        );

        strategy.execute(&job_request, &mut job_reducer, cancel).await?;

        execution_reports.push(JobExecutionReport {
            job_position,
            job: planned_job.clone(),
            replicate_results: job_reducer.into_results()?,
        });

        info!("✅ [BATCH]: Job {}/{} sealed", job_position + 1, planned_jobs.len());
    }

    Ok(execution_reports)
}

/// Materializa el mapa de datos externos de un trabajo leyendo sus
/// rutas concretas. El orden sigue el mapa ordenado del trabajo para
/// que el sobre empacado sea determinista.
async fn load_job_external_data(planned_job: &Job) -> Result<ExternalDataSet, DispatchFault> {
    let mut external_data = ExternalDataSet::new();
    for (logical_filename, physical_path) in &planned_job.file_bindings {
        let content_bytes = tokio::fs::read(physical_path).await.map_err(|io_fault| {
            DispatchFault::ExternalDataUnreadable {
                path: physical_path.clone(),
                detail: io_fault.to_string(),
            }
        })?;
        external_data.insert(logical_filename.clone(), content_bytes);
    }
    Ok(external_data)
}
