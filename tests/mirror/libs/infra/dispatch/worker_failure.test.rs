/**
 * =================================================================
 * APARATO: WORKER FAILURE CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE
 * OBJETIVO: Un trabajador caído cancela a sus pares, el reductor
 * sella sus sumideros y el fallo emerge nombrando la réplica.
 * =================================================================
 */

use josh_domain_models::{CustomTagSet, ExternalDataSet, SimulationRequest};
use josh_infra_dispatch::{
    CancelSignal, DispatchFault, ExecutionStrategy, LocalLeaderDispatcher, ProgressCalculator,
    ResponseReducer, ScriptedWorkerTransport, TracingProgressListener, WorkerTransport,
};
use josh_infra_exports::MemorySinkProvider;
use std::sync::Arc;
use std::time::Duration;

fn sealed_request(replicate_count: u32) -> SimulationRequest {
    SimulationRequest::new(
        "simulation Fire { steps.high = 50 }".to_string(),
        "Fire".to_string(),
        replicate_count,
        true,
        "http://workers.lan/runReplicates".to_string(),
        None,
        ExternalDataSet::new(),
        CustomTagSet::new(),
    )
    .expect("request seals")
}

fn fresh_reducer(sink_provider: MemorySinkProvider, replicate_count: u32) -> ResponseReducer {
    ResponseReducer::new(
        Box::new(sink_provider),
        ProgressCalculator::new(0, 50, replicate_count, Box::new(TracingProgressListener)),
        replicate_count,
    )
}

/// Guion largo: suficiente volumen para que el colapso del par llegue
/// con el flujo todavía en vuelo.
fn long_script() -> Vec<String> {
    let mut scripted_lines = Vec::new();
    for absolute_step in 1..=50 {
        scripted_lines.push(format!("[progress 0 {}]", absolute_step));
        scripted_lines.push(format!("[0] patches:step={}\tcover=0.5", absolute_step));
    }
    scripted_lines.push("[end 0]".to_string());
    scripted_lines
}

/// S4: el trabajador 1 colapsa a mitad de flujo; los pares se
/// cancelan, los sumideros se sellan y el fallo nombra la réplica 1.
#[tokio::test]
async fn mid_stream_collapse_cancels_peers_and_names_the_replicate() {
    let transport = Arc::new(ScriptedWorkerTransport::new().with_line_delay(Duration::from_millis(2)));
    let long_lines = long_script();
    let long_line_refs: Vec<&str> = long_lines.iter().map(String::as_str).collect();

    transport.script_replicate(0, &long_line_refs);
    transport.script_replicate_collapse(
        1,
        &["[progress 0 1]", "[0] patches:step=1\tcover=0.1"],
        "connection reset by peer",
    );
    transport.script_replicate(2, &long_line_refs);

    let dispatcher =
        LocalLeaderDispatcher::new(Arc::clone(&transport) as Arc<dyn WorkerTransport>, 3);

    let sink_provider = MemorySinkProvider::new();
    let observer_handle = sink_provider.clone();
    let mut reducer = fresh_reducer(sink_provider, 3);

    let outcome = dispatcher
        .execute(&sealed_request(3), &mut reducer, &CancelSignal::new())
        .await;

    let Err(surfaced_fault) = outcome else {
        panic!("collapse must abort the dispatch");
    };
    assert!(matches!(surfaced_fault, DispatchFault::Transport { .. }));
    assert_eq!(surfaced_fault.replicate(), Some(1), "fault names replicate 1");

    // Sellado exactamente una vez pese al aborto.
    if let Some(patches_state) = observer_handle.state_for("patches") {
        let patches_state = patches_state.lock().unwrap();
        assert_eq!(patches_state.join_invocations, 1);
        // Los pares no llegaron a volcar sus flujos completos.
        assert!(patches_state.rows.len() < 100, "peer streams were cut short");
    }
    println!("✅ WORKER_FAILURE: Mid-stream collapse triage certified.");
}

/// Variante no-200: el rechazo HTTP en la apertura surte el mismo
/// protocolo de cancelación.
#[tokio::test]
async fn http_rejection_at_open_aborts_with_the_status() {
    let transport = Arc::new(ScriptedWorkerTransport::new().with_line_delay(Duration::from_millis(2)));
    let long_lines = long_script();
    let long_line_refs: Vec<&str> = long_lines.iter().map(String::as_str).collect();

    transport.script_replicate(0, &long_line_refs);
    transport.script_replicate_rejection(1, 500);
    transport.script_replicate(2, &long_line_refs);

    let dispatcher =
        LocalLeaderDispatcher::new(Arc::clone(&transport) as Arc<dyn WorkerTransport>, 3);
    let mut reducer = fresh_reducer(MemorySinkProvider::new(), 3);

    let outcome = dispatcher
        .execute(&sealed_request(3), &mut reducer, &CancelSignal::new())
        .await;

    let Err(DispatchFault::RemoteHttp { status, replicate, .. }) = outcome else {
        panic!("rejection must surface as RemoteHttp");
    };
    assert_eq!(status, 500);
    assert_eq!(replicate, Some(1));
    println!("✅ WORKER_FAILURE: HTTP rejection triage certified.");
}

/// ERROR de protocolo emitido por el trabajador: fatal y nominativo.
#[tokio::test]
async fn wire_error_from_a_worker_is_fatal_for_the_job() {
    let transport = Arc::new(ScriptedWorkerTransport::new());
    transport.script_replicate(0, &["[progress 0 1]", "[error 0 seed material rejected]"]);
    transport.script_replicate(1, &["[progress 0 1]", "[end 0]"]);

    let dispatcher =
        LocalLeaderDispatcher::new(Arc::clone(&transport) as Arc<dyn WorkerTransport>, 2);
    let mut reducer = fresh_reducer(MemorySinkProvider::new(), 2);

    let outcome = dispatcher
        .execute(&sealed_request(2), &mut reducer, &CancelSignal::new())
        .await;

    let Err(DispatchFault::WireError { replicate, message }) = outcome else {
        panic!("wire ERROR must surface");
    };
    assert_eq!(replicate, Some(0));
    assert!(message.contains("seed material rejected"));
    println!("✅ WORKER_FAILURE: Protocol error triage certified.");
}

/// Cancelación del llamador: cooperativa y pronta.
#[tokio::test]
async fn caller_cancellation_aborts_the_dispatch() {
    let transport = Arc::new(ScriptedWorkerTransport::new().with_line_delay(Duration::from_millis(2)));
    let long_lines = long_script();
    let long_line_refs: Vec<&str> = long_lines.iter().map(String::as_str).collect();
    transport.script_replicate(0, &long_line_refs);
    transport.script_replicate(1, &long_line_refs);

    let dispatcher =
        LocalLeaderDispatcher::new(Arc::clone(&transport) as Arc<dyn WorkerTransport>, 2);
    let mut reducer = fresh_reducer(MemorySinkProvider::new(), 2);

    let cancel_signal = CancelSignal::new();
    cancel_signal.trigger();

    let outcome = dispatcher
        .execute(&sealed_request(2), &mut reducer, &cancel_signal)
        .await;
    assert!(matches!(outcome, Err(DispatchFault::Cancelled)));
    println!("✅ WORKER_FAILURE: Caller cancellation certified.");
}
