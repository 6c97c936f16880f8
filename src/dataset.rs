//! Dataset assembly, persistence and verification.
//!
//! A dataset directory holds the generated universe as `facts.pl` (one fact
//! per line, loadable with `consult`) and one JSON record per question in
//! `questions.jsonl`. Every record carries enough to be re-resolved on its own
//! against the saved facts.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rand::seq::index;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DatasetConfig;
use crate::difficulty::DifficultyTable;
use crate::engine::Database;
use crate::error::Result;
use crate::generator::{generate, Universe};
use crate::parser::parse_query;
use crate::questions::{catalog, resolve_answers, synthesize_with, Question};
use crate::rules::family_database;

pub const FACTS_FILE: &str = "facts.pl";
pub const QUESTIONS_FILE: &str = "questions.jsonl";

/// One line of `questions.jsonl`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: String,
    pub question: String,
    pub template: Vec<String>,
    pub query: Vec<String>,
    pub answer: Vec<String>,
    pub difficulty: u32,
    pub answer_variable: String,
}

impl From<&Question> for DatasetRecord {
    fn from(q: &Question) -> Self {
        DatasetRecord {
            id: q.id.clone(),
            question: q.text.clone(),
            template: q.template.clone(),
            query: q.query.clone(),
            answer: q.answers.clone(),
            difficulty: q.difficulty,
            answer_variable: q.answer_variable.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Dataset {
    pub universe: Universe,
    pub questions: Vec<Question>,
}

impl Dataset {
    pub fn records(&self) -> Vec<DatasetRecord> {
        self.questions.iter().map(DatasetRecord::from).collect()
    }

    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> Result<()> {
        for record in self.records() {
            serde_json::to_writer(&mut writer, &record)?;
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write `facts.pl` and `questions.jsonl` into `dir`, creating it if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        self.universe
            .store
            .save(BufWriter::new(File::create(dir.join(FACTS_FILE))?))?;
        self.write_jsonl(BufWriter::new(File::create(dir.join(QUESTIONS_FILE))?))?;
        info!(
            dir = %dir.display(),
            facts = self.universe.store.fact_count(),
            questions = self.questions.len(),
            "wrote dataset"
        );
        Ok(())
    }
}

/// Keep `k` of `questions`, chosen by `rng`, in their original order.
fn sample(questions: Vec<Question>, k: usize, rng: &mut XorShiftRng) -> Vec<Question> {
    if questions.len() <= k {
        return questions;
    }
    let mut keep = index::sample(rng, questions.len(), k).into_vec();
    keep.sort_unstable();
    let mut keep = keep.into_iter().peekable();
    questions
        .into_iter()
        .enumerate()
        .filter_map(|(i, q)| {
            if keep.peek() == Some(&i) {
                keep.next();
                Some(q)
            } else {
                None
            }
        })
        .collect()
}

/// Generate a universe and synthesize every catalog template against it.
pub fn build_dataset(config: &DatasetConfig) -> Result<Dataset> {
    config.validate()?;
    let templates = catalog()?;
    let universe = generate(&config.generator, config.max_depth)?;
    let table = DifficultyTable::with_overrides(&config.difficulty_overrides);
    let mut rng = XorShiftRng::seed_from_u64(config.seed);

    let mut questions = Vec::new();
    for template in &templates {
        let mut synthesized = synthesize_with(template, &universe.store, &table)?;
        if let Some(k) = config.questions_per_template {
            let total = synthesized.len();
            synthesized = sample(synthesized, k, &mut rng);
            debug!(template = %template.id, total, kept = synthesized.len(), "sampled questions");
        }
        questions.extend(synthesized);
    }

    info!(
        questions = questions.len(),
        templates = templates.len(),
        "built dataset"
    );
    Ok(Dataset {
        universe,
        questions,
    })
}

/// A store with the family rules and the facts saved at `path`.
pub fn load_facts(path: impl AsRef<Path>, max_depth: usize) -> Result<Database> {
    let mut store = family_database(max_depth)?;
    let count = store.consult(BufReader::new(File::open(path)?))?;
    debug!(clauses = count, "consulted facts");
    Ok(store)
}

pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<DatasetRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Re-resolve a record's query and compare answer sets.
pub fn verify_question(store: &Database, record: &DatasetRecord) -> Result<bool> {
    let goals = parse_query(&record.query.join(", "))?;
    let resolved: BTreeSet<String> = resolve_answers(store, &goals, &record.answer_variable)
        .into_iter()
        .collect();
    let recorded: BTreeSet<String> = record.answer.iter().cloned().collect();
    Ok(resolved == recorded)
}

/// Ids of the records whose answers no longer reproduce.
pub fn verify_dataset(store: &Database, records: &[DatasetRecord]) -> Result<Vec<String>> {
    let mut mismatched = Vec::new();
    for record in records {
        if !verify_question(store, record)? {
            warn!(id = %record.id, question = %record.question, "answer does not reproduce");
            mismatched.push(record.id.clone());
        }
    }
    info!(
        records = records.len(),
        mismatched = mismatched.len(),
        "verified dataset"
    );
    Ok(mismatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use std::collections::HashMap;

    fn small_config(seed: u64) -> DatasetConfig {
        DatasetConfig {
            generator: GeneratorConfig {
                population: 14,
                max_generations: 2,
                seed,
                ..Default::default()
            },
            questions_per_template: Some(6),
            ..Default::default()
        }
    }

    fn index_of(id: &str) -> usize {
        id.rsplit('-').next().unwrap().parse().unwrap()
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = build_dataset(&small_config(11)).unwrap();
        let b = build_dataset(&small_config(11)).unwrap();
        assert_eq!(a.records(), b.records());
        assert!(!a.questions.is_empty());
    }

    #[test]
    fn test_sampling_keeps_enumeration_order() {
        let dataset = build_dataset(&small_config(12)).unwrap();
        let mut per_template: HashMap<&str, Vec<usize>> = HashMap::new();
        for q in &dataset.questions {
            per_template.entry(q.template_id.as_str()).or_default().push(index_of(&q.id));
        }
        for indices in per_template.values() {
            assert!(indices.len() <= 6);
            assert!(indices.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_sample() {
        let dataset = build_dataset(&DatasetConfig {
            questions_per_template: None,
            ..small_config(13)
        })
        .unwrap();
        let all = dataset.questions.clone();
        let mut rng = XorShiftRng::seed_from_u64(3);
        let kept = sample(all.clone(), 4, &mut rng);
        assert_eq!(kept.len(), 4.min(all.len()));
        let mut rest = all.iter();
        for q in &kept {
            assert!(rest.any(|r| r == q));
        }
    }

    #[test]
    fn test_questions_reproduce() {
        let dataset = build_dataset(&small_config(14)).unwrap();
        let mismatched = verify_dataset(&dataset.universe.store, &dataset.records()).unwrap();
        assert!(mismatched.is_empty(), "{mismatched:?}");
    }

    #[test]
    fn test_tampered_record_detected() {
        let dataset = build_dataset(&small_config(15)).unwrap();
        let mut record = dataset.records().remove(0);
        record.answer.push("Nobody Atall".to_string());
        assert!(!verify_question(&dataset.universe.store, &record).unwrap());
    }

    #[test]
    fn test_save_and_reload() {
        let dataset = build_dataset(&small_config(16)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        dataset.save(dir.path()).unwrap();

        let store = load_facts(dir.path().join(FACTS_FILE), DatasetConfig::default().max_depth).unwrap();
        assert_eq!(store.fact_count(), dataset.universe.store.fact_count());

        let file = File::open(dir.path().join(QUESTIONS_FILE)).unwrap();
        let records = read_jsonl(BufReader::new(file)).unwrap();
        assert_eq!(records, dataset.records());
        assert!(verify_dataset(&store, &records).unwrap().is_empty());
    }

    #[test]
    fn test_record_fields() {
        let dataset = build_dataset(&small_config(17)).unwrap();
        let mut out = Vec::new();
        dataset.write_jsonl(&mut out).unwrap();
        let first = String::from_utf8(out).unwrap().lines().next().unwrap().to_string();
        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        for field in ["id", "question", "template", "query", "answer", "difficulty", "answer_variable"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
