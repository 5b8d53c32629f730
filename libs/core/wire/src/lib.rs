// [libs/core/wire/src/lib.rs]
/*!
 * =================================================================
 * APARATO: WIRE PROTOCOL CORE (V4.0 - GOLD MASTER)
 * CLASIFICACIÓN: PROTOCOL CORE (ESTRATO L1)
 * RESPONSABILIDAD: CONTRATO ESTABLE DE LÍNEA ENTRE LÍDER Y TRABAJADOR
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. STABLE CONTRACT: El formato de línea es el contrato externo entre
 *    implementaciones de líder y trabajador, sin importar el host.
 * 2. PURE CORE: Parseo, render y reescritura son síncronos, sin I/O
 *    y sin estado oculto más allá del libro mayor acumulativo.
 * =================================================================
 */

pub mod codec;
pub mod cumulative;
pub mod envelope;
pub mod message;

pub use codec::{parse, to_wire_format};
pub use cumulative::CumulativeStepLedger;
pub use envelope::{is_text_filename, pack_external_data, TEXT_EXTENSIONS};
pub use message::WireMessage;
