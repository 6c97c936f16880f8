//! The static family rule catalog and the relation/attribute vocabularies
//! built on top of it.

use tracing::{debug, info, warn};

use crate::datalog::Statement;
use crate::engine::{Database, DependencyGraph};
use crate::error::{Error, Result};
use crate::parser::parse_program;

pub const RULES_VERSION: u32 = 1;

/// Rule text in the store's clause syntax.
pub const FAMILY_RULES: &str = include_str!("family.dl");

/// Relations questions may ask about, in catalog order.
pub const FAMILY_RELATIONS: &[&str] = &[
    "child",
    "father",
    "mother",
    "son",
    "daughter",
    "husband",
    "wife",
    "sibling",
    "brother",
    "sister",
    "grandparent",
    "grandfather",
    "grandmother",
    "grandchild",
    "grandson",
    "granddaughter",
    "great_grandparent",
    "great_grandfather",
    "great_grandmother",
    "great_grandchild",
    "great_grandson",
    "great_granddaughter",
    "aunt",
    "uncle",
    "niece",
    "nephew",
    "cousin",
];

/// Attribute predicates: `attribute(Person, "value")`.
pub const ATTRIBUTES: &[&str] = &["job", "hobby", "dob"];

/// Load rule text into `db`. The text may only contain rules; anything else is
/// a catalog error and nothing is loaded.
pub fn load_rules(db: &mut Database, text: &str) -> Result<usize> {
    let statements = parse_program(text)?;
    let mut rules = Vec::with_capacity(statements.len());
    for stmt in statements {
        match stmt {
            Statement::Assertion(clause) if !clause.is_fact() => rules.push(clause),
            other => {
                return Err(Error::Parse {
                    input: other.to_string(),
                    message: "rule catalog may only contain rules".to_string(),
                })
            }
        }
    }

    let graph = DependencyGraph::from_rules(&rules);
    let recursive = graph.recursive_predicates();
    if !recursive.is_empty() {
        debug!(predicates = ?recursive, limit = db.max_depth(), "recursive predicates are cut at the depth bound");
    }
    let deepest = graph.deepest_chain();
    if deepest > db.max_depth() {
        warn!(deepest, limit = db.max_depth(), "max depth is below the deepest rule chain");
    }

    let count = rules.len();
    let mut working = db.clone();
    for rule in rules {
        working.add_rule(rule)?;
    }
    *db = working;
    Ok(count)
}

/// An empty store with the family rules loaded.
pub fn family_database(max_depth: usize) -> Result<Database> {
    let mut db = Database::with_max_depth(max_depth);
    let count = load_rules(&mut db, FAMILY_RULES)?;
    info!(rules = count, version = RULES_VERSION, "loaded family rule catalog");
    Ok(db)
}

/// Surface form of a relation or attribute name: `great_grandmother` -> "great-grandmother".
pub fn surface(name: &str) -> String {
    match name {
        "dob" => "date of birth".to_string(),
        _ => name.replace('_', "-"),
    }
}

/// Plural surface form: `child` -> "children", `great_grandchild` -> "great-grandchildren".
pub fn plural(name: &str) -> String {
    let singular = surface(name);
    if singular.ends_with("child") {
        format!("{singular}ren")
    } else {
        format!("{singular}s")
    }
}

/// The reference family used across unit tests:
/// jan + ida -> elias; otto + helga -> elena; elias + elena -> michael, sara;
/// michael + anna -> lena.
#[cfg(test)]
pub(crate) fn canonical_family() -> Database {
    let mut db = family_database(crate::engine::DEFAULT_MAX_DEPTH).unwrap();
    let facts = r#"
        male(jan). female(ida). male(otto). female(helga).
        male(elias). female(elena). male(michael). female(sara).
        female(anna). female(lena).
        married(jan, ida). married(ida, jan).
        married(otto, helga). married(helga, otto).
        married(elias, elena). married(elena, elias).
        married(michael, anna). married(anna, michael).
        parent(elias, jan). parent(elias, ida).
        parent(elena, otto). parent(elena, helga).
        parent(michael, elena). parent(michael, elias).
        parent(sara, elena). parent(sara, elias).
        parent(lena, michael). parent(lena, anna).
        job(elias, "biomedical scientist"). job(elena, "air cabin crew").
        job(michael, "realtor"). job(anna, "realtor").
        hobby(michael, "birdwatching"). hobby(sara, "chess").
    "#;
    db.consult(facts.as_bytes()).unwrap();
    db
}
