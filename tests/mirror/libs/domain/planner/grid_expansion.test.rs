/**
 * =================================================================
 * APARATO: GRID EXPANSION CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE
 * OBJETIVO: Forma cartesiana, orden grupo-mayor y determinismo puro.
 * =================================================================
 */

use josh_domain_models::{CustomTagSet, VariationGroup};
use josh_domain_planner::{expand_job_plan, parse_data_binding, PlannerFault};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[test]
fn two_by_one_variation_yields_two_jobs_of_three_replicates() {
    let variation_groups = vec![
        parse_data_binding("a=/p1;a=/p2").expect("group parses"),
        parse_data_binding("b=/q1").expect("group parses"),
    ];

    let planned_jobs = expand_job_plan(
        &BTreeMap::new(),
        &variation_groups,
        3,
        &CustomTagSet::new(),
    )
    .expect("plan expands");

    assert_eq!(planned_jobs.len(), 2);
    assert!(planned_jobs.iter().all(|job| job.replicate_count == 3));
    assert_eq!(planned_jobs[0].file_bindings["a"], PathBuf::from("/p1"));
    assert_eq!(planned_jobs[0].file_bindings["b"], PathBuf::from("/q1"));
    assert_eq!(planned_jobs[1].file_bindings["a"], PathBuf::from("/p2"));
    assert_eq!(planned_jobs[1].file_bindings["b"], PathBuf::from("/q1"));
    println!("✅ PLANNER: 2×1 grid shape certified.");
}

#[test]
fn custom_tags_are_copied_unchanged_into_every_job() {
    let custom_tags = CustomTagSet::try_from_pairs(vec![
        ("scenario".to_string(), "wet".to_string()),
    ])
    .expect("tag set builds");

    let planned_jobs = expand_job_plan(
        &BTreeMap::new(),
        &[VariationGroup::new(
            "soil",
            vec![PathBuf::from("/s1"), PathBuf::from("/s2")],
        )],
        2,
        &custom_tags,
    )
    .expect("plan expands");

    for planned_job in &planned_jobs {
        let tag_pairs: Vec<(&str, &str)> = planned_job.custom_tags.iter().collect();
        assert_eq!(tag_pairs, vec![("scenario", "wet")]);
    }
}

#[test]
fn empty_candidate_group_is_rejected() {
    let rejection = expand_job_plan(
        &BTreeMap::new(),
        &[VariationGroup::new("soil", Vec::new())],
        1,
        &CustomTagSet::new(),
    );
    assert_eq!(rejection, Err(PlannerFault::EmptyGroup("soil".to_string())));
}

proptest! {
    /// Para tamaños (a,b,c) la salida mide a·b·c y el trabajo i
    /// decodifica unívocamente a (i/(b·c), (i/c) mod b, i mod c).
    #[test]
    fn cartesian_shape_decodes_positionally(
        size_a in 1usize..4,
        size_b in 1usize..4,
        size_c in 1usize..4,
    ) {
        let build_group = |group_name: &str, candidate_count: usize| {
            VariationGroup::new(
                group_name,
                (0..candidate_count)
                    .map(|candidate_index| PathBuf::from(format!("/{}/{}", group_name, candidate_index)))
                    .collect(),
            )
        };
        let variation_groups = vec![
            build_group("ga", size_a),
            build_group("gb", size_b),
            build_group("gc", size_c),
        ];

        let planned_jobs = expand_job_plan(
            &BTreeMap::new(),
            &variation_groups,
            1,
            &CustomTagSet::new(),
        ).expect("plan expands");

        prop_assert_eq!(planned_jobs.len(), size_a * size_b * size_c);

        for (job_position, planned_job) in planned_jobs.iter().enumerate() {
            let expected = (
                job_position / (size_b * size_c),
                (job_position / size_c) % size_b,
                job_position % size_c,
            );
            prop_assert_eq!(
                &planned_job.file_bindings["ga"],
                &PathBuf::from(format!("/ga/{}", expected.0))
            );
            prop_assert_eq!(
                &planned_job.file_bindings["gb"],
                &PathBuf::from(format!("/gb/{}", expected.1))
            );
            prop_assert_eq!(
                &planned_job.file_bindings["gc"],
                &PathBuf::from(format!("/gc/{}", expected.2))
            );
        }
    }

    /// Dos expansiones del mismo plan son idénticas elemento a elemento.
    #[test]
    fn expansion_is_a_pure_function(
        candidate_counts in proptest::collection::vec(1usize..4, 1..4),
        replicate_count in 1u32..5,
    ) {
        let variation_groups: Vec<VariationGroup> = candidate_counts
            .iter()
            .enumerate()
            .map(|(group_index, candidate_count)| {
                VariationGroup::new(
                    format!("g{}", group_index),
                    (0..*candidate_count)
                        .map(|candidate_index| PathBuf::from(format!("/{}/{}", group_index, candidate_index)))
                        .collect(),
                )
            })
            .collect();

        let mut template_bindings = BTreeMap::new();
        template_bindings.insert("base".to_string(), PathBuf::from("/base"));

        let first_expansion = expand_job_plan(&template_bindings, &variation_groups, replicate_count, &CustomTagSet::new()).expect("expands");
        let second_expansion = expand_job_plan(&template_bindings, &variation_groups, replicate_count, &CustomTagSet::new()).expect("expands");

        prop_assert_eq!(first_expansion, second_expansion);
    }
}
