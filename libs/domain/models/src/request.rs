// [libs/domain/models/src/request.rs]
/*!
 * =================================================================
 * APARATO: SIMULATION REQUEST MODEL (V4.2 - PRODUCTION MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: PETICIÓN SELLADA DE EJECUCIÓN DE SIMULACIÓN
 *
 * # Invariante de inmutabilidad:
 * La petición se valida y se sella en el constructor. Ninguna
 * operación posterior muta su contenido; cada trabajo del lote
 * recibe su propia petición concreta.
 * =================================================================
 */

use crate::errors::ModelFault;

/// Nombres de etiqueta vetados: colisionan con columnas de exportación
/// que el reductor emite por cuenta propia.
pub const RESERVED_TAG_NAMES: &[&str] = &["replicate", "step", "variable"];

/// Conjunto ordenado de etiquetas personalizadas (nombre → valor).
///
/// Preserva el orden de declaración del operador: ese orden fija las
/// columnas adicionales de los sumideros CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomTagSet {
    entries: Vec<(String, String)>,
}

impl CustomTagSet {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Construye el conjunto validando nombres reservados y duplicados.
    pub fn try_from_pairs(
        declared_pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ModelFault> {
        let mut validated_set = CustomTagSet::new();
        for (tag_name, tag_value) in declared_pairs {
            validated_set.try_insert(tag_name, tag_value)?;
        }
        Ok(validated_set)
    }

    pub fn try_insert(&mut self, tag_name: String, tag_value: String) -> Result<(), ModelFault> {
        if RESERVED_TAG_NAMES.contains(&tag_name.as_str()) {
            return Err(ModelFault::ReservedTagName(tag_name));
        }
        if self.entries.iter().any(|(existing_name, _)| *existing_name == tag_name) {
            return Err(ModelFault::DuplicateTagName(tag_name));
        }
        self.entries.push((tag_name, tag_value));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(tag_name, tag_value)| (tag_name.as_str(), tag_value.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(tag_name, _)| tag_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mapa nominal archivo → contenido, con orden de inserción estable.
///
/// El orden de inserción es contractual: el empaquetador de datos
/// externos serializa las entradas exactamente en este orden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalDataSet {
    entries: Vec<(String, Vec<u8>)>,
}

impl ExternalDataSet {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Inserta o reemplaza en sitio, preservando la posición original.
    pub fn insert(&mut self, logical_filename: String, content_bytes: Vec<u8>) {
        if let Some(existing_slot) = self
            .entries
            .iter_mut()
            .find(|(existing_name, _)| *existing_name == logical_filename)
        {
            existing_slot.1 = content_bytes;
        } else {
            self.entries.push((logical_filename, content_bytes));
        }
    }

    pub fn get(&self, logical_filename: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(existing_name, _)| existing_name == logical_filename)
            .map(|(_, content_bytes)| content_bytes.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(logical_filename, content_bytes)| (logical_filename.as_str(), content_bytes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<u8>)> for ExternalDataSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(source: I) -> Self {
        let mut assembled_set = ExternalDataSet::new();
        for (logical_filename, content_bytes) in source {
            assembled_set.insert(logical_filename, content_bytes);
        }
        assembled_set
    }
}

/// Petición soberana de ejecución: el contrato completo que una
/// estrategia (líder local o líder remoto) necesita para despachar.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    simulation_code: String,
    simulation_name: String,
    replicate_count: u32,
    favor_big_decimal: bool,
    endpoint_uri: String,
    api_key: Option<String>,
    external_data: ExternalDataSet,
    custom_tags: CustomTagSet,
}

impl SimulationRequest {
    /// Sella una nueva petición de ejecución.
    ///
    /// # Errors:
    /// - `ReplicateCountInvalid` si el conteo de réplicas es cero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        simulation_code: String,
        simulation_name: String,
        replicate_count: u32,
        favor_big_decimal: bool,
        endpoint_uri: String,
        api_key: Option<String>,
        external_data: ExternalDataSet,
        custom_tags: CustomTagSet,
    ) -> Result<Self, ModelFault> {
        if replicate_count < 1 {
            return Err(ModelFault::ReplicateCountInvalid(replicate_count));
        }
        Ok(Self {
            simulation_code,
            simulation_name,
            replicate_count,
            favor_big_decimal,
            endpoint_uri,
            api_key,
            external_data,
            custom_tags,
        })
    }

    pub fn simulation_code(&self) -> &str {
        &self.simulation_code
    }

    pub fn simulation_name(&self) -> &str {
        &self.simulation_name
    }

    pub fn replicate_count(&self) -> u32 {
        self.replicate_count
    }

    pub fn favor_big_decimal(&self) -> bool {
        self.favor_big_decimal
    }

    pub fn endpoint_uri(&self) -> &str {
        &self.endpoint_uri
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn external_data(&self) -> &ExternalDataSet {
        &self.external_data
    }

    pub fn custom_tags(&self) -> &CustomTagSet {
        &self.custom_tags
    }

    /// Deriva una petición idéntica con otro mapa de datos externos y
    /// otro conteo de réplicas: la forma en que el lote materializa
    /// cada trabajo concreto sin romper la inmutabilidad del template.
    pub fn with_job_overrides(
        &self,
        external_data: ExternalDataSet,
        replicate_count: u32,
    ) -> Result<Self, ModelFault> {
        Self::new(
            self.simulation_code.clone(),
            self.simulation_name.clone(),
            replicate_count,
            self.favor_big_decimal,
            self.endpoint_uri.clone(),
            self.api_key.clone(),
            external_data,
            self.custom_tags.clone(),
        )
    }
}
