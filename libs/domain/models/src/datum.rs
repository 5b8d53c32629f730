// [libs/domain/models/src/datum.rs]
/*!
 * =================================================================
 * APARATO: OUTPUT DATUM MODEL (V4.1 - PRODUCTION MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: REGISTRO ATÓMICO DE SALIDA DEL MOTOR DE SIMULACIÓN
 *
 * # Invariante de clasificación:
 * Un valor es numérico si y solo si coincide con el clasificador
 * decimal con signo (signo opcional, dígitos, fracción opcional).
 * Todo lo demás es texto. El render de un número reproduce un valor
 * que el clasificador vuelve a aceptar.
 * =================================================================
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Clasificador decimal con signo: `-3`, `+2.5`, `0.125`, `42`.
static NUMERIC_VALUE_CLASSIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?$").expect("static classifier pattern"));

/// Destino canónico de un registro de salida del motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DatumTarget {
    /// Agregados a nivel de simulación completa.
    Simulation,
    /// Celdas de la rejilla espacial.
    Patches,
    /// Agentes ligados a una celda.
    Entities,
}

impl DatumTarget {
    /// Etiqueta en minúsculas tal como viaja por el protocolo de línea.
    pub fn as_label(&self) -> &'static str {
        match self {
            DatumTarget::Simulation => "simulation",
            DatumTarget::Patches => "patches",
            DatumTarget::Entities => "entities",
        }
    }

    /// Resolución de etiqueta; destinos desconocidos no tienen bucket.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "simulation" => Some(DatumTarget::Simulation),
            "patches" => Some(DatumTarget::Patches),
            "entities" => Some(DatumTarget::Entities),
            _ => None,
        }
    }
}

/// Valor de atributo tal como lo emitió el motor remoto.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Clasifica un valor crudo de la línea de protocolo.
    pub fn classify(raw_value: &str) -> Self {
        if NUMERIC_VALUE_CLASSIFIER.is_match(raw_value) {
            match raw_value.parse::<f64>() {
                Ok(parsed_number) => AttributeValue::Number(parsed_number),
                Err(_) => AttributeValue::Text(raw_value.to_string()),
            }
        } else {
            AttributeValue::Text(raw_value.to_string())
        }
    }

    /// Render inverso para la retransmisión por el protocolo de línea.
    pub fn render(&self) -> String {
        match self {
            AttributeValue::Number(numeric_value) => format!("{}", numeric_value),
            AttributeValue::Text(text_value) => text_value.clone(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(numeric_value) => Some(*numeric_value),
            AttributeValue::Text(_) => None,
        }
    }
}

/// Mapa ordenado de atributos: preserva el orden de observación,
/// requisito para la proyección hacia los sumideros de exportación.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeRow {
    entries: Vec<(String, AttributeValue)>,
}

impl AttributeRow {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Inserta preservando orden; una clave repetida actualiza en sitio.
    pub fn insert(&mut self, attribute_name: String, attribute_value: AttributeValue) {
        if let Some(existing_slot) = self
            .entries
            .iter_mut()
            .find(|(existing_name, _)| *existing_name == attribute_name)
        {
            existing_slot.1 = attribute_value;
        } else {
            self.entries.push((attribute_name, attribute_value));
        }
    }

    pub fn get(&self, attribute_name: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(existing_name, _)| existing_name == attribute_name)
            .map(|(_, attribute_value)| attribute_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries
            .iter()
            .map(|(attribute_name, attribute_value)| (attribute_name.as_str(), attribute_value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(attribute_name, _)| attribute_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeRow {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(source: I) -> Self {
        let mut assembled_row = AttributeRow::new();
        for (attribute_name, attribute_value) in source {
            assembled_row.insert(attribute_name, attribute_value);
        }
        assembled_row
    }
}

/// Registro atómico emitido por el motor, dirigido a un destino nominal.
///
/// El destino viaja como etiqueta cruda: destinos desconocidos deben
/// atravesar el códec intactos y descartarse silenciosamente recién
/// en el constructor de resultados.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDatum {
    pub target_label: String,
    pub attributes: AttributeRow,
}

impl OutputDatum {
    pub fn new(target_label: impl Into<String>, attributes: AttributeRow) -> Self {
        Self {
            target_label: target_label.into(),
            attributes,
        }
    }

    pub fn target(&self) -> Option<DatumTarget> {
        DatumTarget::from_label(&self.target_label)
    }
}
