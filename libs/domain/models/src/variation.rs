// [libs/domain/models/src/variation.rs]
/*!
 * =================================================================
 * APARATO: GRID SEARCH VARIATION MODELS (V4.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: EJES DE VARIACIÓN Y TRABAJOS CONCRETOS DEL LOTE
 * =================================================================
 */

use crate::request::CustomTagSet;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Un eje de la búsqueda en rejilla: un nombre lógico de archivo y sus
/// rutas candidatas, en el orden declarado por el operador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationGroup {
    pub logical_filename: String,
    pub candidate_paths: Vec<PathBuf>,
}

impl VariationGroup {
    pub fn new(logical_filename: impl Into<String>, candidate_paths: Vec<PathBuf>) -> Self {
        Self {
            logical_filename: logical_filename.into(),
            candidate_paths,
        }
    }
}

/// Trabajo concreto del lote: un mapa de archivos resuelto, el conteo
/// de réplicas y las etiquetas personalizadas copiadas del template.
///
/// El mapa usa `BTreeMap` para que dos expansiones del mismo plan sean
/// bit-idénticas sin importar el orden de iteración aguas arriba.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub file_bindings: BTreeMap<String, PathBuf>,
    pub replicate_count: u32,
    pub custom_tags: CustomTagSet,
}

impl Job {
    pub fn new(
        file_bindings: BTreeMap<String, PathBuf>,
        replicate_count: u32,
        custom_tags: CustomTagSet,
    ) -> Self {
        Self {
            file_bindings,
            replicate_count,
            custom_tags,
        }
    }
}
