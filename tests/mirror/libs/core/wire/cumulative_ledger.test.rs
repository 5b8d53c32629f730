/**
 * =================================================================
 * APARATO: CUMULATIVE LEDGER CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE
 * OBJETIVO: Monotonía del flujo acumulativo bajo intercalado
 * arbitrario y valor final Σ(último − primero + 1).
 * =================================================================
 */

use josh_core_wire::{CumulativeStepLedger, WireMessage};
use proptest::prelude::*;

proptest! {
    /// Con N réplicas de pasos estrictamente crecientes intercaladas
    /// en cualquier orden, la secuencia acumulativa nunca retrocede y
    /// su valor final es la suma de pasos aportados por cada réplica.
    #[test]
    fn interleavings_preserve_monotonicity(
        replicate_step_counts in proptest::collection::vec(1usize..12, 1..5),
        shuffle_seed in any::<u64>(),
    ) {
        // Construcción de los flujos por réplica: pasos 1..=n.
        let mut pending_events: Vec<(u32, i64)> = Vec::new();
        for (replicate_index, step_count) in replicate_step_counts.iter().enumerate() {
            for absolute_step in 1..=(*step_count as i64) {
                pending_events.push((replicate_index as u32, absolute_step));
            }
        }

        // Intercalado determinista dirigido por la semilla: se extrae
        // siempre el primer paso pendiente de una réplica elegida.
        let mut queues: Vec<std::collections::VecDeque<i64>> = replicate_step_counts
            .iter()
            .map(|step_count| (1..=(*step_count as i64)).collect())
            .collect();

        let shared_ledger = CumulativeStepLedger::new();
        let mut selector_state = shuffle_seed;
        let mut previously_observed = 0i64;

        let total_events: usize = replicate_step_counts.iter().sum();
        for _ in 0..total_events {
            // xorshift simple para elegir la próxima réplica no vacía
            selector_state ^= selector_state << 13;
            selector_state ^= selector_state >> 7;
            selector_state ^= selector_state << 17;

            let non_empty: Vec<usize> = queues
                .iter()
                .enumerate()
                .filter(|(_, queue)| !queue.is_empty())
                .map(|(queue_index, _)| queue_index)
                .collect();
            let chosen_queue = non_empty[(selector_state as usize) % non_empty.len()];
            let absolute_step = queues[chosen_queue].pop_front().expect("queue non empty");

            let rewritten = shared_ledger.rewrite(WireMessage::Progress {
                replicate: chosen_queue as u32,
                step: absolute_step,
            });
            let WireMessage::Progress { step: cumulative_step, .. } = rewritten else {
                panic!("progress must stay progress");
            };

            prop_assert!(cumulative_step >= previously_observed);
            previously_observed = cumulative_step;
        }

        // Réplica i aporta (último − primero + 1) = n pasos.
        let expected_total: i64 = replicate_step_counts.iter().map(|count| *count as i64).sum();
        prop_assert_eq!(shared_ledger.total(), expected_total);
        prop_assert_eq!(previously_observed, expected_total);
    }
}

#[test]
fn first_observation_contributes_exactly_one_step() {
    let shared_ledger = CumulativeStepLedger::new();

    let first = shared_ledger.rewrite(WireMessage::Progress { replicate: 0, step: 5 });
    assert_eq!(first, WireMessage::Progress { replicate: 0, step: 1 });

    let second = shared_ledger.rewrite(WireMessage::Progress { replicate: 0, step: 8 });
    assert_eq!(second, WireMessage::Progress { replicate: 0, step: 4 });

    println!("✅ CUMULATIVE_LEDGER: First-observation accounting certified.");
}
