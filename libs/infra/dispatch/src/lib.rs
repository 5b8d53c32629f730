// [libs/infra/dispatch/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DISTRIBUTED DISPATCH CORE (V4.0 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: COORDINACIÓN DE RÉPLICAS SOBRE TRABAJADORES HTTP
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. SYMMETRIC STRATEGIES: El líder local y el líder remoto son dos
 *    implementaciones del mismo contrato de ejecución; el reductor
 *    compartido no distingue quién coordinó las réplicas.
 * 2. BOUNDED EVERYTHING: Concurrencia acotada por K, canal de fusión
 *    acotado con contrapresión hacia los lectores HTTP, timeouts de
 *    conexión y de petición completos.
 * 3. FIRST ERROR WINS: El primer fallo cancela a los pares en vuelo
 *    y emerge intacto hasta el conductor del lote.
 * =================================================================
 */

pub mod cancel;
pub mod driver;
pub mod endpoint;
pub mod errors;
pub mod local_leader;
pub mod offload;
pub mod progress;
pub mod reducer;
pub mod task_board;
pub mod transport;

pub use cancel::CancelSignal;
pub use driver::{run_batch, BatchRunConfig, JobEnvironment, JobExecutionReport};
pub use endpoint::{normalize_endpoint, preflight_api_key, EndpointPlan, PUBLIC_CLOUD_ENDPOINT};
pub use errors::DispatchFault;
pub use local_leader::LocalLeaderDispatcher;
pub use offload::OffloadLeaderStrategy;
pub use progress::{ProgressCalculator, ProgressListener, ProgressUpdate, TracingProgressListener};
pub use reducer::ResponseReducer;
pub use task_board::{TaskPhaseBoard, WorkerTaskPhase};
pub use transport::{
    ExecutionStrategy, HttpTransportConfig, HttpWorkerTransport, ScriptedWorkerTransport,
    WireLineStream, WorkerCallContext, WorkerTransport,
};
