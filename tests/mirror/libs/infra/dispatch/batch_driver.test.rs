/**
 * =================================================================
 * APARATO: BATCH DRIVER CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE
 * OBJETIVO: Sumideros frescos por trabajo, estrategia por
 * configuración y aborto del lote preservando lo ya persistido.
 * =================================================================
 */

use josh_domain_models::{CustomTagSet, ExternalDataSet, Job, SimulationRequest};
use josh_infra_dispatch::{
    run_batch, BatchRunConfig, CancelSignal, DispatchFault, JobEnvironment, ProgressListener,
    ScriptedWorkerTransport, TracingProgressListener, WorkerTransport,
};
use josh_infra_exports::{ExportSinkProvider, MemorySinkProvider};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const WORKER_SCRIPT: [&str; 4] = [
    "[progress 0 1]",
    "[progress 0 2]",
    "[0] patches:step=2\tcover=0.5",
    "[end 0]",
];

struct RecordingEnvironment {
    provisioned: Mutex<Vec<MemorySinkProvider>>,
}

impl RecordingEnvironment {
    fn new() -> Self {
        Self {
            provisioned: Mutex::new(Vec::new()),
        }
    }

    fn provider_for_job(&self, job_position: usize) -> MemorySinkProvider {
        self.provisioned.lock().unwrap()[job_position].clone()
    }

    fn provisioned_count(&self) -> usize {
        self.provisioned.lock().unwrap().len()
    }
}

impl JobEnvironment for RecordingEnvironment {
    fn sink_provider(&self, _job_position: usize, _job: &Job) -> Box<dyn ExportSinkProvider> {
        let sink_provider = MemorySinkProvider::new();
        self.provisioned.lock().unwrap().push(sink_provider.clone());
        Box::new(sink_provider)
    }

    fn progress_listener(&self, _job_position: usize) -> Box<dyn ProgressListener> {
        Box::new(TracingProgressListener)
    }
}

fn sealed_template(replicate_count: u32) -> SimulationRequest {
    SimulationRequest::new(
        "simulation Savanna { steps.high = 2 }".to_string(),
        "Savanna".to_string(),
        replicate_count,
        true,
        "http://workers.lan/runReplicates".to_string(),
        None,
        ExternalDataSet::new(),
        CustomTagSet::new(),
    )
    .expect("template seals")
}

fn job_bound_to(scratch_file: &PathBuf, replicate_count: u32) -> Job {
    let mut file_bindings = BTreeMap::new();
    file_bindings.insert("soil".to_string(), scratch_file.clone());
    Job::new(file_bindings, replicate_count, CustomTagSet::new())
}

fn local_config() -> BatchRunConfig {
    BatchRunConfig {
        use_remote_leader: false,
        concurrent_workers: 2,
        low_step: 1,
        steps_per_replicate: 2,
    }
}

#[tokio::test]
async fn each_job_gets_fresh_sinks_and_the_batch_reports_in_order() {
    let scratch_directory = tempfile::tempdir().expect("scratch directory");
    let soil_file = scratch_directory.path().join("soil.csv");
    std::fs::write(&soil_file, "a,b\n1,2\n").expect("fixture writes");

    let transport = Arc::new(ScriptedWorkerTransport::new());
    transport.script_replicate(0, &WORKER_SCRIPT);
    transport.script_replicate(0, &WORKER_SCRIPT);

    let environment = RecordingEnvironment::new();
    let planned_jobs = vec![job_bound_to(&soil_file, 1), job_bound_to(&soil_file, 1)];

    let execution_reports = run_batch(
        &sealed_template(1),
        &planned_jobs,
        Arc::clone(&transport) as Arc<dyn WorkerTransport>,
        &environment,
        &local_config(),
        &CancelSignal::new(),
    )
    .await
    .expect("batch completes");

    assert_eq!(execution_reports.len(), 2);
    assert_eq!(environment.provisioned_count(), 2, "fresh sinks per job");

    for (job_position, execution_report) in execution_reports.iter().enumerate() {
        assert_eq!(execution_report.job_position, job_position);
        assert_eq!(execution_report.replicate_results.len(), 1);

        let patches_state = environment
            .provider_for_job(job_position)
            .state_for("patches")
            .expect("sink provisioned");
        let patches_state = patches_state.lock().unwrap();
        assert_eq!(patches_state.join_invocations, 1);
        assert_eq!(patches_state.rows.len(), 1);
    }
    println!("✅ BATCH_DRIVER: Per-job isolation certified.");
}

#[tokio::test]
async fn a_failing_job_aborts_the_batch_but_earlier_outputs_survive() {
    let scratch_directory = tempfile::tempdir().expect("scratch directory");
    let soil_file = scratch_directory.path().join("soil.csv");
    std::fs::write(&soil_file, "a\n1\n").expect("fixture writes");

    let transport = Arc::new(ScriptedWorkerTransport::new());
    transport.script_replicate(0, &WORKER_SCRIPT);
    transport.script_replicate_collapse(0, &["[progress 0 1]"], "worker lease expired");

    let environment = RecordingEnvironment::new();
    let planned_jobs = vec![job_bound_to(&soil_file, 1), job_bound_to(&soil_file, 1)];

    let outcome = run_batch(
        &sealed_template(1),
        &planned_jobs,
        Arc::clone(&transport) as Arc<dyn WorkerTransport>,
        &environment,
        &local_config(),
        &CancelSignal::new(),
    )
    .await;

    assert!(matches!(outcome, Err(DispatchFault::Transport { .. })));
    assert_eq!(environment.provisioned_count(), 2, "second job was attempted");

    // El primer trabajo quedó sellado y con sus filas intactas.
    let first_job_state = environment
        .provider_for_job(0)
        .state_for("patches")
        .expect("first job exported");
    let first_job_state = first_job_state.lock().unwrap();
    assert_eq!(first_job_state.join_invocations, 1);
    assert_eq!(first_job_state.rows.len(), 1);
    println!("✅ BATCH_DRIVER: First-failure abort certified.");
}

#[tokio::test]
async fn missing_external_data_fails_before_any_network_io() {
    let transport = Arc::new(ScriptedWorkerTransport::new());
    let environment = RecordingEnvironment::new();
    let phantom_path = PathBuf::from("/nonexistent/soil.csv");
    let planned_jobs = vec![job_bound_to(&phantom_path, 1)];

    let outcome = run_batch(
        &sealed_template(1),
        &planned_jobs,
        Arc::clone(&transport) as Arc<dyn WorkerTransport>,
        &environment,
        &local_config(),
        &CancelSignal::new(),
    )
    .await;

    assert!(matches!(outcome, Err(DispatchFault::ExternalDataUnreadable { .. })));
    assert_eq!(transport.peak_in_flight(), 0, "no worker stream was opened");
}

#[tokio::test]
async fn remote_leader_strategy_consumes_the_multiplexed_stream() {
    let scratch_directory = tempfile::tempdir().expect("scratch directory");
    let soil_file = scratch_directory.path().join("soil.csv");
    std::fs::write(&soil_file, "a\n1\n").expect("fixture writes");

    let transport = Arc::new(ScriptedWorkerTransport::new());
    transport.script_leader(&[
        "[progress 0 1]",
        "[progress 1 1]",
        "[0] patches:step=1\tcover=0.5",
        "[1] patches:step=1\tcover=0.7",
        "[progress 0 2]",
        "[progress 1 2]",
        "[end 0]",
        "[end 1]",
    ]);

    let environment = RecordingEnvironment::new();
    let planned_jobs = vec![job_bound_to(&soil_file, 2)];
    let remote_config = BatchRunConfig {
        use_remote_leader: true,
        ..local_config()
    };

    let execution_reports = run_batch(
        &sealed_template(2),
        &planned_jobs,
        Arc::clone(&transport) as Arc<dyn WorkerTransport>,
        &environment,
        &remote_config,
        &CancelSignal::new(),
    )
    .await
    .expect("offload batch completes");

    assert_eq!(execution_reports.len(), 1);
    assert_eq!(execution_reports[0].replicate_results.len(), 2);
    println!("✅ BATCH_DRIVER: Offload-leader path certified.");
}
