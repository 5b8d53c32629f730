/**
 * =================================================================
 * APARATO: REDUCER LIFECYCLE CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE
 * OBJETIVO: Réplica única feliz, ERROR de protocolo fatal y sellado
 * de sumideros exactamente una vez en toda salida.
 * =================================================================
 */

use futures::stream;
use josh_infra_dispatch::{
    DispatchFault, ProgressCalculator, ProgressListener, ProgressUpdate, ResponseReducer,
};
use josh_infra_exports::MemorySinkProvider;
use std::sync::{Arc, Mutex};

struct CollectingListener {
    collected_updates: Arc<Mutex<Vec<ProgressUpdate>>>,
}

impl ProgressListener for CollectingListener {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.collected_updates
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            .push(*update);
    }
}

fn reducer_with_observers(
    low_step: i64,
    steps_per_replicate: i64,
    total_replicates: u32,
    sink_provider: MemorySinkProvider,
) -> (ResponseReducer, Arc<Mutex<Vec<ProgressUpdate>>>) {
    let collected_updates = Arc::new(Mutex::new(Vec::new()));
    let progress_calculator = ProgressCalculator::new(
        low_step,
        steps_per_replicate,
        total_replicates,
        Box::new(CollectingListener {
            collected_updates: Arc::clone(&collected_updates),
        }),
    );
    (
        ResponseReducer::new(Box::new(sink_provider), progress_calculator, total_replicates),
        collected_updates,
    )
}

#[tokio::test]
async fn single_replicate_happy_path() {
    let sink_provider = MemorySinkProvider::new();
    let observer_handle = sink_provider.clone();
    let (mut reducer, collected_updates) = reducer_with_observers(0, 2, 1, sink_provider);

    let streamed_lines = [
        "[progress 0 0]",
        "[0] patches:step=0\tposition.x=0\tposition.y=0\tcover=0.5",
        "[progress 0 1]",
        "[0] patches:step=1\tposition.x=0\tposition.y=0\tcover=0.6",
        "[end 0]",
    ];
    let line_stream = stream::iter(
        streamed_lines
            .iter()
            .map(|line| Ok::<String, DispatchFault>((*line).to_string()))
            .collect::<Vec<_>>(),
    );

    reducer.reduce_stream(line_stream).await.expect("happy path");

    let replicate_results = reducer.into_results().expect("results freeze");
    assert_eq!(replicate_results.len(), 1);
    assert_eq!(replicate_results[0].patch_records.len(), 2);

    let spatial_bounds = replicate_results[0].spatial_bounds.expect("bounds seeded");
    assert_eq!(
        (spatial_bounds.min_x, spatial_bounds.min_y, spatial_bounds.max_x, spatial_bounds.max_y),
        (0.0, 0.0, 0.0, 0.0)
    );

    // 100% exactamente una vez.
    let published = collected_updates.lock().unwrap();
    assert_eq!(
        published.iter().filter(|update| update.percent_complete == 100).count(),
        1
    );

    // Sumidero de 'patches': abierto y sellado exactamente una vez,
    // con los dos registros en orden de transmisión.
    let patches_state = observer_handle.state_for("patches").expect("sink provisioned");
    let patches_state = patches_state.lock().unwrap();
    assert_eq!(patches_state.start_invocations, 1);
    assert_eq!(patches_state.join_invocations, 1);
    assert_eq!(patches_state.rows.len(), 2);
    assert_eq!(patches_state.rows[0].step, 0);
    assert_eq!(patches_state.rows[1].step, 1);
    println!("✅ REDUCER: Single-replicate happy path certified.");
}

#[tokio::test]
async fn wire_error_is_fatal_but_sinks_still_seal() {
    let sink_provider = MemorySinkProvider::new();
    let observer_handle = sink_provider.clone();
    let (mut reducer, _updates) = reducer_with_observers(0, 5, 2, sink_provider);

    let streamed_lines = [
        "[0] entities:age=3",
        "[error 0 engine collapsed mid-replicate]",
        "[0] entities:age=4",
    ];
    let line_stream = stream::iter(
        streamed_lines
            .iter()
            .map(|line| Ok::<String, DispatchFault>((*line).to_string()))
            .collect::<Vec<_>>(),
    );

    let outcome = reducer.reduce_stream(line_stream).await;
    let Err(DispatchFault::WireError { replicate, message }) = outcome else {
        panic!("wire ERROR must surface as a protocol fault");
    };
    assert_eq!(replicate, Some(0));
    assert!(message.contains("engine collapsed"));

    let entities_state = observer_handle.state_for("entities").expect("sink provisioned");
    let entities_state = entities_state.lock().unwrap();
    assert_eq!(entities_state.join_invocations, 1, "sealed exactly once");
    assert_eq!(entities_state.rows.len(), 1, "no write after the fatal line");
    println!("✅ REDUCER: Fatal wire error path certified.");
}

#[tokio::test]
async fn sink_write_failure_is_fatal_for_the_job_yet_everything_seals() {
    let sink_provider = MemorySinkProvider::with_failing_writes();
    let observer_handle = sink_provider.clone();
    let (mut reducer, _updates) = reducer_with_observers(0, 5, 1, sink_provider);

    let outcome = reducer.ingest_line("[0] patches:cover=0.5");
    assert!(matches!(outcome, Err(DispatchFault::Sink(_))));

    reducer.seal_sinks().expect("sealing the poisoned sink still succeeds");
    reducer.seal_sinks().expect("idempotent second seal");

    let patches_state = observer_handle.state_for("patches").expect("sink provisioned");
    assert_eq!(patches_state.lock().unwrap().join_invocations, 1);
    println!("✅ REDUCER: Sink failure triage certified.");
}

#[tokio::test]
async fn unknown_targets_neither_open_sinks_nor_fill_buckets() {
    let sink_provider = MemorySinkProvider::new();
    let observer_handle = sink_provider.clone();
    let (mut reducer, _updates) = reducer_with_observers(0, 1, 1, sink_provider);

    reducer.ingest_line("[0] weather:rain=9").expect("silently ignored");
    reducer.ingest_line("[end 0]").expect("end still folds");

    let replicate_results = reducer.into_results().expect("results freeze");
    assert_eq!(replicate_results[0].patch_records.len(), 0);
    assert!(observer_handle.observed_targets().is_empty());
}
