/**
 * =================================================================
 * APARATO: LOCAL LEADER MERGE CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE
 * OBJETIVO: Reescritura de índices verdaderos, monotonía acumulativa
 * bajo intercalado real y cota K de concurrencia.
 * =================================================================
 */

use futures::StreamExt;
use josh_core_wire::{parse, WireMessage};
use josh_domain_models::{CustomTagSet, ExternalDataSet, SimulationRequest};
use josh_infra_dispatch::{
    CancelSignal, ExecutionStrategy, LocalLeaderDispatcher, ProgressCalculator,
    ResponseReducer, ScriptedWorkerTransport, TracingProgressListener, WorkerCallContext,
    WorkerTransport,
};
use josh_infra_exports::MemorySinkProvider;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const WORKER_SCRIPT: [&str; 7] = [
    "[progress 0 1]",
    "[progress 0 2]",
    "[progress 0 3]",
    "[progress 0 4]",
    "[progress 0 5]",
    "[0] patches:step=5\tcover=0.5",
    "[end 0]",
];

fn sealed_request(replicate_count: u32) -> SimulationRequest {
    SimulationRequest::new(
        "simulation Savanna { steps.low = 1\n steps.high = 5 }".to_string(),
        "Savanna".to_string(),
        replicate_count,
        true,
        "http://workers.lan/runReplicates".to_string(),
        None,
        ExternalDataSet::new(),
        CustomTagSet::new(),
    )
    .expect("request seals")
}

fn call_context() -> WorkerCallContext {
    WorkerCallContext {
        simulation_code: "simulation Savanna {}".to_string(),
        simulation_name: "Savanna".to_string(),
        api_key: None,
        packed_external_data: String::new(),
        favor_big_decimal: true,
    }
}

/// S2: dos réplicas intercaladas; el flujo fusionado emite END dos
/// veces y el progreso acumulativo alcanza 10 sin retroceder jamás.
#[tokio::test]
async fn two_interleaved_replicates_merge_monotonically() {
    let transport = Arc::new(ScriptedWorkerTransport::new().with_line_delay(Duration::from_millis(1)));
    transport.script_replicate(0, &WORKER_SCRIPT);
    transport.script_replicate(1, &WORKER_SCRIPT);

    let dispatcher =
        LocalLeaderDispatcher::new(Arc::clone(&transport) as Arc<dyn WorkerTransport>, 2);
    let mut merged_stream = dispatcher.merged_wire_stream(call_context(), 2, CancelSignal::new());

    let mut previously_observed_cumulative = 0i64;
    let mut end_count = 0usize;
    let mut datum_replicates: BTreeSet<u32> = BTreeSet::new();

    while let Some(stream_item) = merged_stream.next().await {
        let merged_line = stream_item.expect("merge succeeds");
        match parse(&merged_line) {
            WireMessage::Progress { step: cumulative_step, .. } => {
                assert!(
                    cumulative_step >= previously_observed_cumulative,
                    "cumulative sequence regressed: {} after {}",
                    cumulative_step,
                    previously_observed_cumulative
                );
                previously_observed_cumulative = cumulative_step;
            }
            WireMessage::End { .. } => end_count += 1,
            WireMessage::Datum { replicate, .. } => {
                datum_replicates.insert(replicate);
            }
            other_message => panic!("unexpected merged message {:?}", other_message),
        }
    }

    assert_eq!(end_count, 2, "one END per replicate");
    assert_eq!(previously_observed_cumulative, 10, "Σ(last − first + 1) = 5 + 5");
    assert_eq!(datum_replicates, BTreeSet::from([0, 1]), "true indices rewritten");
    println!("✅ LOCAL_LEADER: Interleaved merge certified.");
}

/// La estrategia completa produce dos resultados y reparte los
/// registros de sumidero entre los índices verdaderos.
#[tokio::test]
async fn execute_folds_both_replicates_through_the_shared_reducer() {
    let transport = Arc::new(ScriptedWorkerTransport::new());
    transport.script_replicate(0, &WORKER_SCRIPT);
    transport.script_replicate(1, &WORKER_SCRIPT);

    let dispatcher =
        LocalLeaderDispatcher::new(Arc::clone(&transport) as Arc<dyn WorkerTransport>, 2);

    let sink_provider = MemorySinkProvider::new();
    let observer_handle = sink_provider.clone();
    let progress_calculator =
        ProgressCalculator::new(1, 5, 2, Box::new(TracingProgressListener));
    let mut reducer = ResponseReducer::new(Box::new(sink_provider), progress_calculator, 2);

    dispatcher
        .execute(&sealed_request(2), &mut reducer, &CancelSignal::new())
        .await
        .expect("both replicates complete");

    let replicate_results = reducer.into_results().expect("results freeze");
    let result_indices: BTreeSet<u32> = replicate_results
        .iter()
        .map(|replicate_result| replicate_result.replicate_number)
        .collect();
    assert_eq!(result_indices, BTreeSet::from([0, 1]));

    let patches_state = observer_handle.state_for("patches").expect("sink provisioned");
    let patches_state = patches_state.lock().unwrap();
    assert_eq!(patches_state.join_invocations, 1);
    let sink_replicates: BTreeSet<u32> =
        patches_state.rows.iter().map(|sink_row| sink_row.replicate).collect();
    assert_eq!(sink_replicates, BTreeSet::from([0, 1]));
    println!("✅ LOCAL_LEADER: Shared reducer fold certified.");
}

/// Cota de concurrencia: con N=6 y K=2 nunca hay más de dos flujos
/// de trabajador abiertos a la vez.
#[tokio::test]
async fn in_flight_workers_never_exceed_the_bound() {
    let transport = Arc::new(ScriptedWorkerTransport::new().with_line_delay(Duration::from_millis(2)));
    for replicate_index in 0..6 {
        transport.script_replicate(replicate_index, &WORKER_SCRIPT);
    }

    let dispatcher =
        LocalLeaderDispatcher::new(Arc::clone(&transport) as Arc<dyn WorkerTransport>, 2);
    let mut merged_stream = dispatcher.merged_wire_stream(call_context(), 6, CancelSignal::new());

    let mut end_count = 0usize;
    while let Some(stream_item) = merged_stream.next().await {
        if matches!(parse(&stream_item.expect("merge succeeds")), WireMessage::End { .. }) {
            end_count += 1;
        }
    }

    assert_eq!(end_count, 6);
    assert!(
        transport.peak_in_flight() <= 2,
        "observed {} concurrent workers with K=2",
        transport.peak_in_flight()
    );
    println!("✅ LOCAL_LEADER: Concurrency bound certified.");
}
