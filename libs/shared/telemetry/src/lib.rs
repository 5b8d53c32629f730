// [libs/shared/telemetry/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CANOPY OBSERVER (V4.2 - GOLD MASTER)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: GESTIÓN DE TELEMETRÍA, TRAZADO Y CAPTURA DE PÁNICOS
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. DUAL MODE: Logs compactos para el operador en desarrollo, tramas
 *    JSON planas para la ingesta estructurada en producción.
 * 2. PHOENIX SHIELD: Hook de pánico global con volcado de coordenadas
 *    de archivo y payload, activo también en los hilos del despachador.
 * 3. NOISE GATE: Silencia los estratos de infraestructura (hyper,
 *    reqwest) priorizando el rastro del dominio de simulación.
 * =================================================================
 */

use std::panic;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Inicializa el sistema de trazas del núcleo de ejecución distribuida.
///
/// # Comportamiento:
/// - Desarrollo: Logs compactos sin target, optimizados para el operador.
/// - Producción: Estructura JSON plana para agregadores de logs.
///
/// # Panics:
/// Si otro suscriptor global ya ha sido inicializado en el runtime.
pub fn init_tracing(service_nominal_identifier: &str) {
    // 1. FILTRO DINÁMICO: dominio en primer plano, infraestructura en warn.
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={level},hyper=warn,reqwest=warn,tower=warn",
            service_nominal_identifier.replace('-', "_"),
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production_strata = !cfg!(debug_assertions);

    // 2. ARQUITECTURA DE SUSCRIPCIÓN (Dual Mode)
    if is_production_strata {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    }

    // 3. PHOENIX SHIELD (Global Panic Hook)
    // Captura colapsos en tareas del despachador antes de la defunción del proceso.
    let service_id_snapshot = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |panic_metadata| {
        let panic_location = panic_metadata
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "UNKNOWN_COORDINATES".to_string());

        let panic_payload_message = panic_metadata
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_metadata
                    .payload()
                    .downcast_ref::<String>()
                    .map(|owned_message| owned_message.as_str())
            })
            .unwrap_or("UNDEFINED_PANIC_PAYLOAD");

        error!(
            target: "panic_monitor",
            service = %service_id_snapshot,
            location = %panic_location,
            "🔥 [CRITICAL_PANIC]: Thread terminated abruptly. Analysis: {}",
            panic_payload_message
        );
    }));

    info!(
        "👁️  [CANOPY_ONLINE]: Observability levelized for [{}]. Phoenix Shield ACTIVE.",
        service_nominal_identifier
    );
}
