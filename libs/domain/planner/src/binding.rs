// [libs/domain/planner/src/binding.rs]
/*!
 * =================================================================
 * APARATO: DATA BINDING GRAMMAR (V4.1)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: GRAMÁTICA DEL ARGUMENTO '--data'
 *
 * # Gramática:
 *   --data nombre=ruta                    → grupo de un candidato
 *   --data nombre=ruta1;nombre=ruta2;…    → grupo de variación
 *
 * Todas las entradas de un mismo flag deben vincular el MISMO nombre
 * lógico: cada flag es un eje de la búsqueda en rejilla.
 * =================================================================
 */

use crate::errors::PlannerFault;
use josh_domain_models::VariationGroup;
use std::path::PathBuf;

/// Interpreta el valor de un flag `--data` como un grupo de variación.
///
/// # Errors:
/// - `BindingSyntax` si algún segmento no tiene la forma `nombre=ruta`.
/// - `MixedGroupNames` si los segmentos vinculan nombres distintos.
/// - `EmptyGroup` si el valor no contiene ningún segmento útil.
pub fn parse_data_binding(raw_binding_value: &str) -> Result<VariationGroup, PlannerFault> {
    let mut group_logical_name: Option<String> = None;
    let mut candidate_paths: Vec<PathBuf> = Vec::new();

    for binding_segment in raw_binding_value.split(';') {
        let trimmed_segment = binding_segment.trim();
        if trimmed_segment.is_empty() {
            continue;
        }

        let Some((logical_name, physical_path)) = trimmed_segment.split_once('=') else {
            return Err(PlannerFault::BindingSyntax(trimmed_segment.to_string()));
        };
        let logical_name = logical_name.trim();
        let physical_path = physical_path.trim();
        if logical_name.is_empty() || physical_path.is_empty() {
            return Err(PlannerFault::BindingSyntax(trimmed_segment.to_string()));
        }

        match group_logical_name.as_deref() {
            None => group_logical_name = Some(logical_name.to_string()),
            Some(established_name) if established_name != logical_name => {
                return Err(PlannerFault::MixedGroupNames {
                    first: established_name.to_string(),
                    second: logical_name.to_string(),
                });
            }
            Some(_) => {}
        }

        candidate_paths.push(PathBuf::from(physical_path));
    }

    let Some(group_logical_name) = group_logical_name else {
        return Err(PlannerFault::EmptyGroup(raw_binding_value.to_string()));
    };
    if candidate_paths.is_empty() {
        return Err(PlannerFault::EmptyGroup(group_logical_name));
    }

    Ok(VariationGroup::new(group_logical_name, candidate_paths))
}
