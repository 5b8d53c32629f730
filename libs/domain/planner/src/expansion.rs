// [libs/domain/planner/src/expansion.rs]
/*!
 * =================================================================
 * APARATO: GRID SEARCH EXPANSION (V4.2 - GOLD MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: EXPANSIÓN CARTESIANA DEL PLAN DE TRABAJOS
 *
 * # Orden del plan:
 * Producto cartesiano de los grupos en orden de declaración; salida
 * lexicográfica sobre los índices de la tupla (grupo-mayor, luego
 * candidato-mayor). Para tamaños (a,b,c) el trabajo i decodifica
 * unívocamente a (i/(b·c), (i/c) mod b, i mod c).
 * =================================================================
 */

use crate::errors::PlannerFault;
use josh_domain_models::{CustomTagSet, Job, VariationGroup};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Expande el template y los ejes de variación en la lista ordenada de
/// trabajos concretos del lote.
///
/// Cada tupla produce un mapa de archivos que sombrea al del template:
/// en colisión de claves gana la entrada de la tupla. Réplicas y
/// etiquetas se copian intactas a cada trabajo.
pub fn expand_job_plan(
    template_bindings: &BTreeMap<String, PathBuf>,
    variation_groups: &[VariationGroup],
    replicate_count: u32,
    custom_tags: &CustomTagSet,
) -> Result<Vec<Job>, PlannerFault> {
    for variation_group in variation_groups {
        if variation_group.candidate_paths.is_empty() {
            return Err(PlannerFault::EmptyGroup(variation_group.logical_filename.clone()));
        }
    }

    let total_job_count: usize = variation_groups
        .iter()
        .map(|variation_group| variation_group.candidate_paths.len())
        .product();

    let mut planned_jobs = Vec::with_capacity(total_job_count);
    let mut candidate_odometer = vec![0usize; variation_groups.len()];

    loop {
        let mut concrete_bindings = template_bindings.clone();
        for (group_position, variation_group) in variation_groups.iter().enumerate() {
            let selected_candidate =
                &variation_group.candidate_paths[candidate_odometer[group_position]];
            concrete_bindings.insert(
                variation_group.logical_filename.clone(),
                selected_candidate.clone(),
            );
        }

        planned_jobs.push(Job::new(concrete_bindings, replicate_count, custom_tags.clone()));

        // Odómetro candidato-mayor: el último grupo gira más rápido.
        let mut advancing_position = variation_groups.len();
        loop {
            if advancing_position == 0 {
                debug!("🗺️ [PLANNER]: Expanded {} concrete jobs", planned_jobs.len());
                return Ok(planned_jobs);
            }
            advancing_position -= 1;
            candidate_odometer[advancing_position] += 1;
            if candidate_odometer[advancing_position]
                < variation_groups[advancing_position].candidate_paths.len()
            {
                break;
            }
            candidate_odometer[advancing_position] = 0;
        }
    }
}
