/**
 * =================================================================
 * APARATO: CODEC ROUNDTRIP CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE
 * OBJETIVO: parse(to_wire_format(m)) == m para todo mensaje canónico.
 * =================================================================
 */

use josh_core_wire::{parse, to_wire_format, WireMessage};
use josh_domain_models::AttributeValue;
use proptest::prelude::*;

fn roundtrip(message: &WireMessage) {
    let rendered_line = to_wire_format(message).expect("non-ignored message has a line form");
    assert_eq!(&parse(&rendered_line), message, "line was {:?}", rendered_line);
}

#[test]
fn control_messages_survive_the_roundtrip() {
    roundtrip(&WireMessage::End { replicate: 0 });
    roundtrip(&WireMessage::End { replicate: 4_000_000 });
    roundtrip(&WireMessage::Progress { replicate: 3, step: -7 });
    roundtrip(&WireMessage::Progress { replicate: 0, step: 9_999_999 });
    roundtrip(&WireMessage::Error {
        replicate: Some(2),
        message: "engine collapsed".to_string(),
    });
    roundtrip(&WireMessage::Error {
        replicate: None,
        message: "transport severed".to_string(),
    });
    roundtrip(&WireMessage::Error {
        replicate: Some(9),
        message: String::new(),
    });
    println!("✅ WIRE_CODEC: Control message roundtrip certified.");
}

#[test]
fn mixed_type_datum_survives_the_roundtrip() {
    // Línea con texto y número conviviendo en el mismo registro.
    let parsed = parse("[0] patches:name=Oak\tcover=0.25");
    let WireMessage::Datum { ref datum, .. } = parsed else {
        panic!("expected datum");
    };
    assert_eq!(
        datum.attributes.get("name"),
        Some(&AttributeValue::Text("Oak".to_string()))
    );
    assert_eq!(datum.attributes.get("cover"), Some(&AttributeValue::Number(0.25)));

    roundtrip(&parsed);
    println!("✅ WIRE_CODEC: Mixed datum roundtrip certified.");
}

proptest! {
    /// Todo DATUM canónico (producido por parse) sobrevive ida y vuelta.
    #[test]
    fn datum_lines_roundtrip(
        replicate in 0u32..10_000,
        target_index in 0usize..3,
        values in proptest::collection::vec(-100_000i64..100_000, 1..6),
    ) {
        let target_label = ["simulation", "patches", "entities"][target_index];
        let rendered_pairs: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(position, value)| format!("attr{}={}", position, value))
            .collect();
        let source_line = format!("[{}] {}:{}", replicate, target_label, rendered_pairs.join("\t"));

        let first_pass = parse(&source_line);
        let first_pass_is_datum = matches!(first_pass, WireMessage::Datum { .. });
        prop_assert!(first_pass_is_datum);

        let rendered_line = to_wire_format(&first_pass).expect("datum has a line form");
        prop_assert_eq!(parse(&rendered_line), first_pass);
    }

    /// PROGRESS y END sobreviven para cualquier índice y paso.
    #[test]
    fn control_lines_roundtrip(replicate in 0u32..100_000, step in -1_000_000i64..1_000_000) {
        let progress_message = WireMessage::Progress { replicate, step };
        let rendered = to_wire_format(&progress_message).expect("line form");
        prop_assert_eq!(parse(&rendered), progress_message);

        let end_message = WireMessage::End { replicate };
        let rendered_end = to_wire_format(&end_message).expect("line form");
        prop_assert_eq!(parse(&rendered_end), end_message);
    }
}
