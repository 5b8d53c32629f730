// [libs/domain/models/src/results.rs]
/*!
 * =================================================================
 * APARATO: REPLICATE RESULT FOLD (V4.3 - PRODUCTION MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: ACUMULACIÓN TIPADA DE REGISTROS POR RÉPLICA
 *
 * # Invariantes:
 * - Los conjuntos de nombres de atributo por bucket solo crecen.
 * - La caja espacial se inicializa con la primera observación
 *   posicional y a partir de ahí solo puede expandirse.
 * - El constructor es de un solo uso: 'build()' congela el resultado.
 * =================================================================
 */

use crate::datum::{DatumTarget, OutputDatum};
use std::collections::BTreeSet;
use tracing::trace;

/// Nombre de atributo que porta la coordenada horizontal de un registro.
pub const POSITION_X_ATTRIBUTE: &str = "position.x";
/// Nombre de atributo que porta la coordenada vertical de un registro.
pub const POSITION_Y_ATTRIBUTE: &str = "position.y";

/// Caja delimitadora espacial derivada de los registros posicionales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl SpatialBounds {
    fn seeded_at(position_x: f64, position_y: f64) -> Self {
        Self {
            min_x: position_x,
            min_y: position_y,
            max_x: position_x,
            max_y: position_y,
        }
    }

    fn expand(&mut self, position_x: f64, position_y: f64) {
        self.min_x = self.min_x.min(position_x);
        self.min_y = self.min_y.min(position_y);
        self.max_x = self.max_x.max(position_x);
        self.max_y = self.max_y.max(position_y);
    }
}

/// Resultado inmutable de una réplica: tres buckets de registros, sus
/// conjuntos de atributos observados y la caja espacial acumulada.
#[derive(Debug, Clone)]
pub struct ReplicateResult {
    pub replicate_number: u32,
    pub simulation_records: Vec<OutputDatum>,
    pub patch_records: Vec<OutputDatum>,
    pub entity_records: Vec<OutputDatum>,
    pub simulation_attribute_names: BTreeSet<String>,
    pub patch_attribute_names: BTreeSet<String>,
    pub entity_attribute_names: BTreeSet<String>,
    pub spatial_bounds: Option<SpatialBounds>,
}

impl ReplicateResult {
    pub fn records_for(&self, target: DatumTarget) -> &[OutputDatum] {
        match target {
            DatumTarget::Simulation => &self.simulation_records,
            DatumTarget::Patches => &self.patch_records,
            DatumTarget::Entities => &self.entity_records,
        }
    }

    pub fn attribute_names_for(&self, target: DatumTarget) -> &BTreeSet<String> {
        match target {
            DatumTarget::Simulation => &self.simulation_attribute_names,
            DatumTarget::Patches => &self.patch_attribute_names,
            DatumTarget::Entities => &self.entity_attribute_names,
        }
    }
}

/// Acumulador de un solo uso para el resultado de una réplica.
#[derive(Debug)]
pub struct ReplicateResultBuilder {
    replicate_number: u32,
    simulation_records: Vec<OutputDatum>,
    patch_records: Vec<OutputDatum>,
    entity_records: Vec<OutputDatum>,
    simulation_attribute_names: BTreeSet<String>,
    patch_attribute_names: BTreeSet<String>,
    entity_attribute_names: BTreeSet<String>,
    spatial_bounds: Option<SpatialBounds>,
}

impl ReplicateResultBuilder {
    pub fn new(replicate_number: u32) -> Self {
        Self {
            replicate_number,
            simulation_records: Vec::new(),
            patch_records: Vec::new(),
            entity_records: Vec::new(),
            simulation_attribute_names: BTreeSet::new(),
            patch_attribute_names: BTreeSet::new(),
            entity_attribute_names: BTreeSet::new(),
            spatial_bounds: None,
        }
    }

    pub fn replicate_number(&self) -> u32 {
        self.replicate_number
    }

    /// Incorpora un registro: bucket por destino, unión de nombres de
    /// atributo y pliegue de la caja espacial. Un destino desconocido
    /// se descarta en silencio.
    pub fn add(&mut self, datum: OutputDatum) {
        let Some(resolved_target) = datum.target() else {
            trace!(
                "🍂 [RESULT_FOLD]: Dropping datum with unknown target '{}'",
                datum.target_label
            );
            return;
        };

        self.fold_spatial_bounds(&datum);

        let attribute_name_union: Vec<String> =
            datum.attributes.names().map(str::to_string).collect();

        match resolved_target {
            DatumTarget::Simulation => {
                self.simulation_attribute_names.extend(attribute_name_union);
                self.simulation_records.push(datum);
            }
            DatumTarget::Patches => {
                self.patch_attribute_names.extend(attribute_name_union);
                self.patch_records.push(datum);
            }
            DatumTarget::Entities => {
                self.entity_attribute_names.extend(attribute_name_union);
                self.entity_records.push(datum);
            }
        }
    }

    fn fold_spatial_bounds(&mut self, datum: &OutputDatum) {
        let observed_x = datum
            .attributes
            .get(POSITION_X_ATTRIBUTE)
            .and_then(|attribute_value| attribute_value.as_number());
        let observed_y = datum
            .attributes
            .get(POSITION_Y_ATTRIBUTE)
            .and_then(|attribute_value| attribute_value.as_number());

        if let (Some(position_x), Some(position_y)) = (observed_x, observed_y) {
            match self.spatial_bounds.as_mut() {
                Some(existing_bounds) => existing_bounds.expand(position_x, position_y),
                None => self.spatial_bounds = Some(SpatialBounds::seeded_at(position_x, position_y)),
            }
        }
    }

    /// Congela el acumulador en un resultado inmutable.
    pub fn build(self) -> ReplicateResult {
        ReplicateResult {
            replicate_number: self.replicate_number,
            simulation_records: self.simulation_records,
            patch_records: self.patch_records,
            entity_records: self.entity_records,
            simulation_attribute_names: self.simulation_attribute_names,
            patch_attribute_names: self.patch_attribute_names,
            entity_attribute_names: self.entity_attribute_names,
            spatial_bounds: self.spatial_bounds,
        }
    }
}
