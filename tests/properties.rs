//! Property-based tests over generated universes and datasets.
//!
//! - Store invariants hold for every generated universe
//! - Generation and synthesis are deterministic per seed
//! - Recorded answers reproduce from the saved facts
//! - Chaining a relation never lowers difficulty

use proptest::prelude::*;

use kinship_bench::config::{DatasetConfig, GeneratorConfig};
use kinship_bench::datalog::{Constant, Literal, Term};
use kinship_bench::engine::{Database, DEFAULT_MAX_DEPTH};
use kinship_bench::generator::{generate, Universe};

fn universe(seed: u64, population: usize, generations: usize) -> Universe {
    let config = GeneratorConfig {
        population,
        max_generations: generations,
        seed,
        ..Default::default()
    };
    generate(&config, DEFAULT_MAX_DEPTH).unwrap()
}

fn saved(store: &Database) -> String {
    let mut out = Vec::new();
    store.save(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn answers(store: &Database, query: &str, var: &str) -> Vec<String> {
    store
        .query_str(query)
        .unwrap()
        .filter_map(|b| b.constant(var).map(Constant::surface))
        .collect()
}

mod universe_props {
    use super::*;
    use kinship_bench::engine::invariants::{is_ancestor, MARRIED, PARENT};
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn invariants_hold(
            seed in any::<u64>(),
            population in 4usize..60,
            generations in 1usize..5,
        ) {
            let u = universe(seed, population, generations);
            prop_assert!(u.people.len() <= population);

            for person in &u.people {
                let me = Constant::from(person.name.as_str());
                prop_assert!(!is_ancestor(&u.store, &me, &me), "{} is their own ancestor", person.name);

                let parents = u.store.lookup(PARENT, 0, &me).count();
                prop_assert!(parents <= 2, "{} has {} parents", person.name, parents);

                let partners: HashSet<&Constant> = u
                    .store
                    .lookup(MARRIED, 0, &me)
                    .chain(u.store.lookup(MARRIED, 1, &me))
                    .flat_map(|f| f.terms.iter())
                    .filter(|c| **c != me)
                    .collect();
                prop_assert!(partners.len() <= 1, "{} has {} partners", person.name, partners.len());

                let who = me.to_string();
                let fathers = answers(&u.store, &format!("father({who}, X)"), "X");
                let mothers = answers(&u.store, &format!("mother({who}, X)"), "X");
                prop_assert!(fathers.len() <= 1 && mothers.len() <= 1);
                if let (Some(f), Some(m)) = (fathers.first(), mothers.first()) {
                    prop_assert_ne!(f, m);
                }
            }
        }

        #[test]
        fn generation_is_deterministic(seed in any::<u64>(), population in 4usize..40) {
            let a = universe(seed, population, 3);
            let b = universe(seed, population, 3);
            prop_assert_eq!(&a.people, &b.people);
            prop_assert_eq!(saved(&a.store), saved(&b.store));
        }

        #[test]
        fn save_and_consult_preserve_answer_order(seed in any::<u64>()) {
            let u = universe(seed, 24, 3);
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("facts.pl");
            std::fs::write(&path, saved(&u.store)).unwrap();
            let reloaded = kinship_bench::dataset::load_facts(&path, DEFAULT_MAX_DEPTH).unwrap();

            for query in ["parent(X, Y)", "sibling(X, Y)", "grandmother(X, Y)", "job(X, Y)"] {
                prop_assert_eq!(answers(&u.store, query, "Y"), answers(&reloaded, query, "Y"));
            }
        }
    }
}

mod dataset_props {
    use super::*;
    use kinship_bench::dataset::{build_dataset, verify_dataset};

    fn config(seed: u64, population: usize) -> DatasetConfig {
        DatasetConfig {
            generator: GeneratorConfig {
                population,
                max_generations: 2,
                seed,
                ..Default::default()
            },
            questions_per_template: Some(5),
            seed,
            ..Default::default()
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(6))]

        #[test]
        fn answers_reproduce_from_saved_facts(seed in any::<u64>(), population in 6usize..14) {
            let dataset = build_dataset(&config(seed, population)).unwrap();
            let dir = tempfile::tempdir().unwrap();
            dataset.save(dir.path()).unwrap();

            let store = kinship_bench::dataset::load_facts(
                dir.path().join(kinship_bench::dataset::FACTS_FILE),
                DEFAULT_MAX_DEPTH,
            )
            .unwrap();
            let mismatched = verify_dataset(&store, &dataset.records()).unwrap();
            prop_assert!(mismatched.is_empty(), "{:?}", mismatched);
        }

        #[test]
        fn questions_are_deterministic(seed in any::<u64>()) {
            let a = build_dataset(&config(seed, 10)).unwrap();
            let b = build_dataset(&config(seed, 10)).unwrap();
            prop_assert_eq!(a.records(), b.records());
        }
    }
}

mod difficulty_props {
    use super::*;
    use kinship_bench::difficulty::score;
    use kinship_bench::rules::{family_database, FAMILY_RELATIONS};

    /// `r(Y_0, Y_1), r(Y_1, Y_2), ...` with `hops` goals.
    fn chain(relation: &str, hops: usize) -> Vec<Literal> {
        (0..hops)
            .map(|i| {
                Literal::new(
                    relation,
                    vec![Term::var(format!("Y_{i}")), Term::var(format!("Y_{}", i + 1))],
                )
            })
            .collect()
    }

    proptest! {
        #[test]
        fn chaining_never_lowers_difficulty(
            relation in proptest::sample::select(FAMILY_RELATIONS),
            hops in 1usize..5,
        ) {
            let store = family_database(DEFAULT_MAX_DEPTH).unwrap();
            let shorter = score(&store.plan(&chain(relation, hops)));
            let longer = score(&store.plan(&chain(relation, hops + 1)));
            prop_assert!(longer >= shorter);
            prop_assert!(shorter > 0);
        }
    }
}

mod term_props {
    use super::*;
    use kinship_bench::parser::parse_literal;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn quoted_names_parse_back(
            first in "[A-Z][a-z]{1,8}",
            last in "[A-Z][a-z]{1,8}",
            job in "[a-z]{1,8}( [a-z]{1,8}){0,2}",
        ) {
            let fact = Literal::new(
                "job",
                vec![Term::atom(format!("{first} {last}")), Term::atom(job.as_str())],
            );
            let parsed = parse_literal(&fact.to_string()).unwrap();
            prop_assert_eq!(parsed, fact);
        }
    }
}
