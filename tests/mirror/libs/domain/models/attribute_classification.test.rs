/**
 * =================================================================
 * APARATO: ATTRIBUTE CLASSIFICATION CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE
 * OBJETIVO: Un valor es numérico si y solo si es decimal con signo.
 * =================================================================
 */

use josh_domain_models::AttributeValue;

#[test]
fn decimal_shapes_classify_as_numbers() {
    for (raw_value, expected_number) in [
        ("0", 0.0),
        ("42", 42.0),
        ("-3", -3.0),
        ("+17", 17.0),
        ("0.5", 0.5),
        ("-12.25", -12.25),
        ("007", 7.0),
    ] {
        assert_eq!(
            AttributeValue::classify(raw_value),
            AttributeValue::Number(expected_number),
            "raw value {:?}",
            raw_value
        );
    }
    println!("✅ CLASSIFIER: Decimal acceptance certified.");
}

#[test]
fn non_decimal_shapes_stay_text() {
    for raw_value in ["", " ", "Oak", "1e5", "0x1F", ".5", "5.", "1.", "--2", "1,5", "NaN", "inf", "1 2"] {
        assert_eq!(
            AttributeValue::classify(raw_value),
            AttributeValue::Text(raw_value.to_string()),
            "raw value {:?}",
            raw_value
        );
    }
    println!("✅ CLASSIFIER: Text fallback certified.");
}

#[test]
fn number_render_reclassifies_as_the_same_number() {
    for raw_value in ["0", "42", "-3", "0.5", "-12.25", "99999"] {
        let classified = AttributeValue::classify(raw_value);
        let rendered = classified.render();
        assert_eq!(AttributeValue::classify(&rendered), classified);
    }
}
