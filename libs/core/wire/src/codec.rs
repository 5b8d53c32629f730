// [libs/core/wire/src/codec.rs]
/*!
 * =================================================================
 * APARATO: LINE PROTOCOL CODEC (V4.4 - GOLD MASTER)
 * CLASIFICACIÓN: PROTOCOL CORE (ESTRATO L1)
 * RESPONSABILIDAD: CLASIFICACIÓN Y RENDER DEL FORMATO DE LÍNEA
 *
 * # Gramática (una línea UTF-8 por registro):
 *
 *   [<rep>] <target>:<k>=<v>\t<k>=<v>…    → DATUM
 *   [<rep>]                               → marcador vacío, Ignored
 *   [end <rep>]                           → END
 *   [progress <rep> <paso>]               → PROGRESS (paso absoluto)
 *   [error <rep>? <mensaje>]              → ERROR (réplica opcional)
 *
 * Separadores literales ':', '=' y TAB; sin quoting. El estrato
 * emisor garantiza que ni TAB ni salto de línea aparecen en valores.
 * Una línea que no encaja en ninguna forma se clasifica como ERROR.
 *
 * # Ley de ida y vuelta:
 * parse(to_wire_format(m)) == m para todo mensaje no-Ignored
 * producido por parse.
 * =================================================================
 */

use crate::message::WireMessage;
use josh_domain_models::{AttributeRow, AttributeValue, OutputDatum};

/// Clasifica una línea cruda del flujo líder↔trabajador.
pub fn parse(raw_line: &str) -> WireMessage {
    let trimmed_line = raw_line.trim();

    if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
        return WireMessage::Ignored;
    }
    if !trimmed_line.starts_with('[') {
        return malformed(trimmed_line);
    }

    // ERROR: el mensaje puede contener ']', así que se sella en el último.
    if let Some(error_body) = trimmed_line.strip_prefix("[error") {
        return parse_error_body(error_body, trimmed_line);
    }

    if let Some(end_body) = strip_wrapped(trimmed_line, "[end ") {
        return match end_body.trim().parse::<u32>() {
            Ok(replicate) => WireMessage::End { replicate },
            Err(_) => malformed(trimmed_line),
        };
    }

    if let Some(progress_body) = strip_wrapped(trimmed_line, "[progress ") {
        let tokens: Vec<&str> = progress_body.split_whitespace().collect();
        if let [replicate_token, step_token] = tokens.as_slice() {
            if let (Ok(replicate), Ok(step)) =
                (replicate_token.parse::<u32>(), step_token.parse::<i64>())
            {
                return WireMessage::Progress { replicate, step };
            }
        }
        return malformed(trimmed_line);
    }

    parse_datum_or_marker(trimmed_line)
}

/// Render inverso exacto; `Ignored` no tiene forma de línea.
pub fn to_wire_format(message: &WireMessage) -> Option<String> {
    match message {
        WireMessage::Datum { replicate, datum } => {
            let rendered_pairs: Vec<String> = datum
                .attributes
                .iter()
                .map(|(attribute_name, attribute_value)| {
                    format!("{}={}", attribute_name, attribute_value.render())
                })
                .collect();
            Some(format!(
                "[{}] {}:{}",
                replicate,
                datum.target_label,
                rendered_pairs.join("\t")
            ))
        }
        WireMessage::Progress { replicate, step } => {
            Some(format!("[progress {} {}]", replicate, step))
        }
        WireMessage::End { replicate } => Some(format!("[end {}]", replicate)),
        WireMessage::Error { replicate, message } => Some(render_error(*replicate, message)),
        WireMessage::Ignored => None,
    }
}

fn render_error(replicate: Option<u32>, message: &str) -> String {
    match (replicate, message.is_empty()) {
        (Some(replicate_index), true) => format!("[error {}]", replicate_index),
        (Some(replicate_index), false) => format!("[error {} {}]", replicate_index, message),
        (None, true) => "[error]".to_string(),
        (None, false) => format!("[error {}]", message),
    }
}

/// Extrae el contenido de una forma completamente encorchetada.
fn strip_wrapped<'line>(trimmed_line: &'line str, opening_prefix: &str) -> Option<&'line str> {
    trimmed_line.strip_prefix(opening_prefix)?.strip_suffix(']')
}

fn parse_error_body(error_body: &str, trimmed_line: &str) -> WireMessage {
    let Some(sealed_body) = error_body.strip_suffix(']') else {
        return malformed(trimmed_line);
    };
    let sealed_body = sealed_body.trim();

    if sealed_body.is_empty() {
        return WireMessage::Error {
            replicate: None,
            message: String::new(),
        };
    }

    // Primer token numérico → índice de réplica; el resto es mensaje.
    let (first_token, remaining_message) = match sealed_body.split_once(' ') {
        Some((first_token, remaining_message)) => (first_token, remaining_message.trim_start()),
        None => (sealed_body, ""),
    };

    match first_token.parse::<u32>() {
        Ok(replicate_index) => WireMessage::Error {
            replicate: Some(replicate_index),
            message: remaining_message.to_string(),
        },
        Err(_) => WireMessage::Error {
            replicate: None,
            message: sealed_body.to_string(),
        },
    }
}

fn parse_datum_or_marker(trimmed_line: &str) -> WireMessage {
    let Some(closing_index) = trimmed_line.find(']') else {
        return malformed(trimmed_line);
    };

    let bracket_token = trimmed_line[1..closing_index].trim();
    let Ok(replicate) = bracket_token.parse::<u32>() else {
        return malformed(trimmed_line);
    };

    let payload_remainder = trimmed_line[closing_index + 1..].trim_start();
    if payload_remainder.is_empty() {
        // Marcador de réplica vacío: benigno.
        return WireMessage::Ignored;
    }

    let Some((target_label, attribute_tail)) = payload_remainder.split_once(':') else {
        return malformed(trimmed_line);
    };
    if target_label.is_empty() || target_label.contains(char::is_whitespace) {
        return malformed(trimmed_line);
    }

    let mut attribute_row = AttributeRow::new();
    if !attribute_tail.is_empty() {
        for attribute_pair in attribute_tail.split('\t') {
            let Some((attribute_name, raw_value)) = attribute_pair.split_once('=') else {
                return malformed(trimmed_line);
            };
            if attribute_name.is_empty() {
                return malformed(trimmed_line);
            }
            attribute_row.insert(attribute_name.to_string(), AttributeValue::classify(raw_value));
        }
    }

    WireMessage::Datum {
        replicate,
        datum: OutputDatum::new(target_label, attribute_row),
    }
}

fn malformed(trimmed_line: &str) -> WireMessage {
    WireMessage::Error {
        replicate: None,
        message: format!("MALFORMED_LINE: {}", trimmed_line),
    }
}
