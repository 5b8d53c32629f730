// [libs/core/wire/src/envelope.rs]
/*!
 * =================================================================
 * APARATO: EXTERNAL DATA ENVELOPE PACKER (V4.1 - GOLD MASTER)
 * CLASIFICACIÓN: PROTOCOL CORE (ESTRATO L1)
 * RESPONSABILIDAD: SERIALIZACIÓN DEL SOBRE DE DATOS EXTERNOS
 *
 * # Formato del sobre (por entrada, en orden de iteración):
 *
 *   <nombre> \t <flag> \t <contenido> \t
 *
 * flag '0' = texto (TABs internos → cuatro espacios),
 * flag '1' = binario (Base64 estándar, sin saltos de línea).
 * El receptor enmarca cada entrada por el TAB final; no existe un
 * prefijo de conteo.
 * =================================================================
 */

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use josh_domain_models::ExternalDataSet;
use tracing::trace;

/// Extensiones tratadas como texto plano dentro del sobre.
pub const TEXT_EXTENSIONS: &[&str] = &["csv", "txt", "jshc", "josh"];

/// Reemplazo de TAB dentro de contenido textual: cuatro espacios.
const TEXT_TAB_SUBSTITUTE: &str = "    ";

/// Clasificación texto/binario por extensión, sin sensibilidad a
/// mayúsculas. Un archivo sin extensión es binario.
pub fn is_text_filename(logical_filename: &str) -> bool {
    logical_filename
        .rsplit_once('.')
        .map(|(_, extension)| {
            let lowered_extension = extension.to_ascii_lowercase();
            TEXT_EXTENSIONS.contains(&lowered_extension.as_str())
        })
        .unwrap_or(false)
}

/// Empaqueta el mapa nominal archivo→bytes en el sobre de línea que
/// los trabajadores esperan en el campo 'externalData'.
pub fn pack_external_data(external_data: &ExternalDataSet) -> String {
    let mut packed_envelope = String::new();

    for (logical_filename, content_bytes) in external_data.iter() {
        let is_textual_entry = is_text_filename(logical_filename);

        let serialized_content = if is_textual_entry {
            String::from_utf8_lossy(content_bytes).replace('\t', TEXT_TAB_SUBSTITUTE)
        } else {
            BASE64.encode(content_bytes)
        };

        trace!(
            "📦 [ENVELOPE]: Framed '{}' ({} bytes, {})",
            logical_filename,
            content_bytes.len(),
            if is_textual_entry { "text" } else { "binary" }
        );

        packed_envelope.push_str(logical_filename);
        packed_envelope.push('\t');
        packed_envelope.push(if is_textual_entry { '0' } else { '1' });
        packed_envelope.push('\t');
        packed_envelope.push_str(&serialized_content);
        packed_envelope.push('\t');
    }

    packed_envelope
}
