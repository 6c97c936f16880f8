use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kinship_bench::config::DatasetConfig;
use kinship_bench::dataset::{build_dataset, load_facts, read_jsonl, verify_dataset};
use kinship_bench::engine::{format_query_result, QueryMode, DEFAULT_MAX_DEPTH};
use kinship_bench::parser::parse_query;

/// Family-tree reasoning benchmark generator
#[derive(Parser, Debug)]
#[command(name = "kinship-bench")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a universe and its questions into a directory
    Generate {
        /// Output directory for facts.pl and questions.jsonl
        #[arg(long)]
        out: PathBuf,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        population: Option<usize>,

        #[arg(long)]
        generations: Option<usize>,

        #[arg(long)]
        questions_per_template: Option<usize>,
    },

    /// Resolve a goal conjunction against saved facts
    Query {
        /// Facts file written by `generate`
        #[arg(long)]
        facts: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Fail instead of truncating when the depth bound is hit
        #[arg(long)]
        strict: bool,

        /// Goals, e.g. `father(X, jan), job(X, "realtor")`
        goals: String,
    },

    /// Re-resolve every question record against saved facts
    Verify {
        #[arg(long)]
        facts: PathBuf,

        #[arg(long)]
        questions: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DatasetConfig> {
    match path {
        Some(path) => DatasetConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(DatasetConfig::default()),
    }
}

fn main() -> Result<()> {
    init_logging();
    match Cli::parse().command {
        Command::Generate {
            out,
            config,
            seed,
            population,
            generations,
            questions_per_template,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(seed) = seed {
                config.generator.seed = seed;
                config.seed = seed;
            }
            if let Some(population) = population {
                config.generator.population = population;
            }
            if let Some(generations) = generations {
                config.generator.max_generations = generations;
            }
            if questions_per_template.is_some() {
                config.questions_per_template = questions_per_template;
            }

            let dataset = build_dataset(&config).context("Failed to build dataset")?;
            dataset
                .save(&out)
                .with_context(|| format!("Failed to write dataset: {}", out.display()))?;
        }
        Command::Query {
            facts,
            max_depth,
            strict,
            goals,
        } => {
            let store = load_facts(&facts, max_depth)
                .with_context(|| format!("Failed to load facts: {}", facts.display()))?;
            let goals = parse_query(&goals)?;
            let mode = if strict {
                QueryMode::Strict
            } else {
                QueryMode::Lenient
            };
            let answers = store.query_all(&goals, mode)?;
            println!("{}", format_query_result(&goals, &answers));
        }
        Command::Verify {
            facts,
            questions,
            max_depth,
        } => {
            let store = load_facts(&facts, max_depth)
                .with_context(|| format!("Failed to load facts: {}", facts.display()))?;
            let file = File::open(&questions)
                .with_context(|| format!("Failed to open file: {}", questions.display()))?;
            let records = read_jsonl(BufReader::new(file))?;
            let mismatched = verify_dataset(&store, &records)?;
            if !mismatched.is_empty() {
                bail!(
                    "{} of {} records do not reproduce: {}",
                    mismatched.len(),
                    records.len(),
                    mismatched.join(", ")
                );
            }
            println!("{} records verified", records.len());
        }
    }
    Ok(())
}
