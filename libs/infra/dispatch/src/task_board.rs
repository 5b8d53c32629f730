// [libs/infra/dispatch/src/task_board.rs]
/*!
 * =================================================================
 * APARATO: WORKER TASK PHASE BOARD (V4.1)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: MÁQUINA DE ESTADOS POR TAREA DE TRABAJADOR
 *
 * # Máquina de estados:
 *   Pending → InFlight → (Done | Failed | Cancelled)
 * Las transiciones terminales son de un solo disparo: un estado
 * terminal nunca se sobreescribe.
 * =================================================================
 */

use std::sync::Mutex;

/// Fase de vida de una tarea de réplica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerTaskPhase {
    Pending,
    InFlight,
    Done,
    Failed,
    Cancelled,
}

impl WorkerTaskPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerTaskPhase::Done | WorkerTaskPhase::Failed | WorkerTaskPhase::Cancelled
        )
    }
}

/// Pizarra compartida de fases, una celda por réplica planificada.
#[derive(Debug)]
pub struct TaskPhaseBoard {
    phases: Vec<Mutex<WorkerTaskPhase>>,
}

impl TaskPhaseBoard {
    pub fn new(task_count: usize) -> Self {
        Self {
            phases: (0..task_count)
                .map(|_| Mutex::new(WorkerTaskPhase::Pending))
                .collect(),
        }
    }

    pub fn mark_in_flight(&self, task_position: usize) {
        self.transition(task_position, WorkerTaskPhase::InFlight);
    }

    pub fn mark_terminal(&self, task_position: usize, terminal_phase: WorkerTaskPhase) {
        debug_assert!(terminal_phase.is_terminal());
        self.transition(task_position, terminal_phase);
    }

    /// Sella como canceladas todas las tareas aún no terminales: las
    /// pendientes se omiten y las en vuelo fueron abortadas.
    pub fn cancel_non_terminal(&self) {
        for task_position in 0..self.phases.len() {
            self.transition(task_position, WorkerTaskPhase::Cancelled);
        }
    }

    pub fn snapshot(&self) -> Vec<WorkerTaskPhase> {
        self.phases
            .iter()
            .map(|phase_cell| {
                *phase_cell
                    .lock()
                    .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner())
            })
            .collect()
    }

    fn transition(&self, task_position: usize, next_phase: WorkerTaskPhase) {
        let Some(phase_cell) = self.phases.get(task_position) else {
            return;
        };
        let mut current_phase = phase_cell
            .lock()
            .unwrap_or_else(|poisoned_guard| poisoned_guard.into_inner());
        if !current_phase.is_terminal() {
            *current_phase = next_phase;
        }
    }
}
