// [apps/cli/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COMMAND SURFACE LIBRARY (V4.0)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L4)
 * RESPONSABILIDAD: LÓGICA DE MANDO AUDITABLE EN EL PROVING GROUNDS
 *
 * El binario es un orquestador puro y ligero: toda la lógica de los
 * subcomandos reside aquí para permitir su certificación.
 * =================================================================
 */

pub mod commands;
pub mod exit;
