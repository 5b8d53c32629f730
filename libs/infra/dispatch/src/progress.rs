// [libs/infra/dispatch/src/progress.rs]
/*!
 * =================================================================
 * APARATO: PROGRESS CALCULATOR (V4.3 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PROGRESO HUMANO-LEGIBLE CON CADENCIA ACOTADA
 *
 * # Cadencia de emisión:
 * Un latido se publica cuando el porcentaje entero crece, o cuando ha
 * pasado al menos un segundo desde la última publicación. La
 * finalización de una réplica publica siempre. Así el registro no se
 * satura con cada tick del motor y aun así permanece visible cuando
 * el motor avanza lento.
 * =================================================================
 */

use std::time::{Duration, Instant};
use tracing::info;

/// Intervalo máximo de silencio entre publicaciones.
const EMISSION_INTERVAL: Duration = Duration::from_secs(1);

/// Instantánea publicada hacia el oyente de progreso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent_complete: u8,
    pub replicates_completed: u32,
    pub total_replicates: u32,
}

/// Oyente de latidos: bitácora, barra de progreso o colector de prueba.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, update: &ProgressUpdate);
}

/// Oyente por bitácora estructurada.
pub struct TracingProgressListener;

impl ProgressListener for TracingProgressListener {
    fn on_progress(&self, update: &ProgressUpdate) {
        info!(
            "🌡️ [PROGRESS]: {}% ({}/{} replicates complete)",
            update.percent_complete, update.replicates_completed, update.total_replicates
        );
    }
}

/// Calculador de progreso de un trabajo del lote.
///
/// Parámetros: T pasos por réplica, R réplicas. El paso recibido es
/// absoluto; la normalización resta el límite bajo declarado por la
/// simulación.
pub struct ProgressCalculator {
    low_step_offset: i64,
    steps_per_replicate: i64,
    total_replicates: u32,
    steps_in_current_replicate: i64,
    replicates_completed: u32,
    last_reported_percent: Option<u8>,
    last_emission_instant: Option<Instant>,
    listener: Box<dyn ProgressListener>,
}

impl ProgressCalculator {
    pub fn new(
        low_step_offset: i64,
        steps_per_replicate: i64,
        total_replicates: u32,
        listener: Box<dyn ProgressListener>,
    ) -> Self {
        Self {
            low_step_offset,
            steps_per_replicate: steps_per_replicate.max(1),
            total_replicates: total_replicates.max(1),
            steps_in_current_replicate: 0,
            replicates_completed: 0,
            last_reported_percent: None,
            last_emission_instant: None,
            listener,
        }
    }

    /// Registra un paso absoluto y publica si la cadencia lo permite.
    pub fn update_step(&mut self, absolute_step: i64) {
        self.steps_in_current_replicate = (absolute_step - self.low_step_offset).max(0);

        let computed_percent = self.percent_complete();
        let percent_grew = self
            .last_reported_percent
            .map_or(true, |reported| computed_percent > reported);
        let interval_elapsed = self
            .last_emission_instant
            .map_or(false, |instant| instant.elapsed() >= EMISSION_INTERVAL);

        if percent_grew || interval_elapsed {
            self.emit(computed_percent);
        }
    }

    /// Registra la finalización de réplicas; publica siempre.
    pub fn update_replicate_completed(&mut self, replicates_completed: u32) {
        self.replicates_completed = replicates_completed;
        let computed_percent = self.percent_complete();
        self.emit(computed_percent);
    }

    /// Prepara la siguiente réplica: paso en cero, porcentaje
    /// reportado preservado para no retroceder la cadencia.
    pub fn reset_for_next_replicate(&mut self) {
        self.steps_in_current_replicate = 0;
    }

    pub fn last_reported_percent(&self) -> Option<u8> {
        self.last_reported_percent
    }

    fn percent_complete(&self) -> u8 {
        let numerator = (self.replicates_completed as i64) * self.steps_per_replicate
            + self.steps_in_current_replicate;
        let denominator = (self.total_replicates as i64) * self.steps_per_replicate;
        let computed = (100 * numerator) / denominator;
        computed.clamp(0, 100) as u8
    }

    fn emit(&mut self, percent_complete: u8) {
        self.last_reported_percent = Some(percent_complete);
        self.last_emission_instant = Some(Instant::now());
        self.listener.on_progress(&ProgressUpdate {
            percent_complete,
            replicates_completed: self.replicates_completed,
            total_replicates: self.total_replicates,
        });
    }
}
