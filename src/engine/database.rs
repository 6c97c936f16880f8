use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};

use tracing::{debug, warn};

use crate::datalog::{Clause, Constant, Literal, Statement, Term};
use crate::error::{Error, Result};
use crate::parser::parse_program;

use super::invariants;
use super::query::is_builtin;

/// Rule chains in the family catalog go at most this deep (great-grandchildren
/// via `child`), with headroom for `count` around them.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// A ground fact represented for efficient storage
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroundAtom {
    pub predicate: String,
    pub terms: Vec<Constant>,
}

impl GroundAtom {
    pub fn new(predicate: impl Into<String>, terms: Vec<Constant>) -> Self {
        GroundAtom {
            predicate: predicate.into(),
            terms,
        }
    }

    /// Convert from a ground Literal
    pub fn from_literal(lit: &Literal) -> Option<Self> {
        let terms: Option<Vec<_>> = lit
            .terms
            .iter()
            .map(|t| t.as_constant().cloned())
            .collect();

        terms.map(|terms| GroundAtom {
            predicate: lit.predicate.clone(),
            terms,
        })
    }

    /// Convert back to a Literal
    pub fn to_literal(&self) -> Literal {
        Literal::new(
            self.predicate.clone(),
            self.terms
                .iter()
                .map(|c| Term::Constant(c.clone()))
                .collect(),
        )
    }
}

impl fmt::Display for GroundAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_literal())
    }
}

/// The fact and rule store.
///
/// Facts live in an assertion log. Retraction leaves a hole so positions stay
/// valid, and every index lists positions in assertion order, which is the
/// order bindings are enumerated in.
#[derive(Clone, Debug)]
pub struct Database {
    facts: Vec<Option<GroundAtom>>,
    positions: HashMap<GroundAtom, usize>,
    by_predicate: HashMap<String, Vec<usize>>,
    /// (predicate, argument position, value) -> fact positions
    by_argument: HashMap<(String, usize, Constant), Vec<usize>>,
    rules: Vec<Clause>,
    rules_by_head: HashMap<String, Vec<usize>>,
    max_depth: usize,
}

impl Default for Database {
    fn default() -> Self {
        Database {
            facts: Vec::new(),
            positions: HashMap::new(),
            by_predicate: HashMap::new(),
            by_argument: HashMap::new(),
            rules: Vec::new(),
            rules_by_head: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Database {
            max_depth,
            ..Database::default()
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Load statements from a parsed program. Queries are skipped.
    pub fn load_program(&mut self, statements: &[Statement]) -> Result<usize> {
        let mut loaded = 0;
        for stmt in statements {
            match stmt {
                Statement::Assertion(clause) => {
                    self.add_clause(clause)?;
                    loaded += 1;
                }
                Statement::Query(goals) => {
                    warn!(query = %crate::datalog::format_goals(goals), "ignoring query in program text");
                }
            }
        }
        Ok(loaded)
    }

    /// Add a clause (fact or rule)
    pub fn add_clause(&mut self, clause: &Clause) -> Result<bool> {
        if clause.is_fact() {
            self.assert(&clause.head)
        } else {
            self.add_rule(clause.clone())?;
            Ok(true)
        }
    }

    pub fn add_rule(&mut self, clause: Clause) -> Result<()> {
        if is_builtin(&clause.head.predicate) {
            return Err(Error::contradiction(
                &clause,
                format!("`{}` is a built-in and cannot be redefined", clause.head.predicate),
            ));
        }
        self.rules_by_head
            .entry(clause.head.predicate.clone())
            .or_default()
            .push(self.rules.len());
        self.rules.push(clause);
        Ok(())
    }

    /// Assert a ground fact. Returns `Ok(false)` when the fact is already present.
    pub fn assert(&mut self, fact: &Literal) -> Result<bool> {
        let atom = GroundAtom::from_literal(fact)
            .ok_or_else(|| Error::contradiction(fact, "facts must be ground"))?;
        self.assert_atom(atom)
    }

    pub fn assert_atom(&mut self, atom: GroundAtom) -> Result<bool> {
        if self.contains(&atom) {
            return Ok(false);
        }
        self.check(&atom)?;

        let position = self.facts.len();
        for (i, value) in atom.terms.iter().enumerate() {
            self.by_argument
                .entry((atom.predicate.clone(), i, value.clone()))
                .or_default()
                .push(position);
        }
        self.by_predicate
            .entry(atom.predicate.clone())
            .or_default()
            .push(position);
        self.positions.insert(atom.clone(), position);
        self.facts.push(Some(atom));
        Ok(true)
    }

    /// Test whether `atom` could be asserted without storing it.
    pub fn check(&self, atom: &GroundAtom) -> Result<()> {
        if is_builtin(&atom.predicate) {
            return Err(Error::contradiction(
                atom,
                format!("`{}` is a built-in", atom.predicate),
            ));
        }
        if self.contains(atom) {
            return Ok(());
        }
        invariants::check(self, atom)
    }

    /// Remove a previously asserted fact.
    pub fn retract(&mut self, fact: &Literal) -> Result<()> {
        let atom = GroundAtom::from_literal(fact).ok_or_else(|| Error::MissingFact(fact.to_string()))?;
        match self.positions.remove(&atom) {
            Some(position) => {
                debug!(fact = %atom, "retracted");
                self.facts[position] = None;
                Ok(())
            }
            None => Err(Error::MissingFact(atom.to_string())),
        }
    }

    /// Check if a ground atom exists in the database
    pub fn contains(&self, atom: &GroundAtom) -> bool {
        self.positions.contains_key(atom)
    }

    fn live<'a>(&'a self, positions: &'a [usize]) -> impl Iterator<Item = &'a GroundAtom> + 'a {
        positions.iter().filter_map(|&p| self.facts[p].as_ref())
    }

    /// Get all facts for a predicate, in assertion order
    pub fn get_facts<'a>(&'a self, predicate: &str) -> impl Iterator<Item = &'a GroundAtom> + 'a {
        let positions = self
            .by_predicate
            .get(predicate)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        self.live(positions)
    }

    /// Facts whose argument at `position` equals `value`, in assertion order.
    pub fn lookup<'a>(
        &'a self,
        predicate: &str,
        position: usize,
        value: &Constant,
    ) -> impl Iterator<Item = &'a GroundAtom> + 'a {
        let positions = self
            .by_argument
            .get(&(predicate.to_string(), position, value.clone()))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        self.live(positions)
    }

    /// Candidate facts for a goal whose arguments have already been walked:
    /// uses the first bound argument's index, or the whole predicate.
    pub fn candidates<'a>(&'a self, goal: &Literal) -> Box<dyn Iterator<Item = &'a GroundAtom> + 'a> {
        let bound = goal
            .terms
            .iter()
            .enumerate()
            .find_map(|(i, t)| t.as_constant().map(|c| (i, c)));
        match bound {
            Some((i, value)) => Box::new(self.lookup(&goal.predicate, i, value)),
            None => Box::new(self.get_facts(&goal.predicate)),
        }
    }

    /// All live facts, in assertion order
    pub fn all_facts(&self) -> impl Iterator<Item = &GroundAtom> {
        self.facts.iter().filter_map(|f| f.as_ref())
    }

    pub fn rules(&self) -> &[Clause] {
        &self.rules
    }

    /// Rules whose head has this predicate, in load order.
    pub fn rules_for<'a>(&'a self, predicate: &str) -> impl Iterator<Item = &'a Clause> + 'a {
        self.rules_by_head
            .get(predicate)
            .into_iter()
            .flat_map(move |ids| ids.iter().map(move |&i| &self.rules[i]))
    }

    pub fn is_derived(&self, predicate: &str) -> bool {
        self.rules_by_head.contains_key(predicate)
    }

    /// Get number of live facts
    pub fn fact_count(&self) -> usize {
        self.positions.len()
    }

    /// Load facts and rules from program text. The text is parsed in full and
    /// applied to a copy of the store, which replaces this one only if every
    /// clause is accepted.
    pub fn consult<R: BufRead>(&mut self, mut reader: R) -> Result<usize> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let statements = parse_program(&text)?;

        let mut working = self.clone();
        let loaded = working.load_program(&statements)?;
        *self = working;
        debug!(clauses = loaded, "consulted program");
        Ok(loaded)
    }

    /// Write every live fact as a clause, one per line, in assertion order.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        for atom in self.all_facts() {
            writeln!(writer, "{atom}.")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_literal;

    fn fact(s: &str) -> Literal {
        parse_literal(s).unwrap()
    }

    #[test]
    fn test_assert_and_contains() {
        let mut db = Database::new();
        assert!(db.assert(&fact("job(alice, \"realtor\")")).unwrap());
        assert!(!db.assert(&fact("job(alice, realtor)")).unwrap());
        assert_eq!(db.fact_count(), 1);
    }

    #[test]
    fn test_non_ground_fact_rejected() {
        let mut db = Database::new();
        assert!(matches!(
            db.assert(&fact("job(X, realtor)")),
            Err(Error::Contradiction { .. })
        ));
    }

    #[test]
    fn test_builtins_cannot_be_stored() {
        let mut db = Database::new();
        assert!(db.assert(&fact("dif(a, b)")).is_err());
        let rule = crate::parser::parse_program("count(X, Y) :- p(X, Y).").unwrap();
        assert!(db.load_program(&rule).is_err());
    }

    #[test]
    fn test_retract_preserves_order() {
        let mut db = Database::new();
        for f in ["p(a)", "p(b)", "p(c)"] {
            db.assert(&fact(f)).unwrap();
        }
        db.retract(&fact("p(b)")).unwrap();
        db.assert(&fact("p(b)")).unwrap();
        let order: Vec<String> = db.get_facts("p").map(|a| a.terms[0].surface()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
        assert_eq!(db.fact_count(), 3);
    }

    #[test]
    fn test_retract_missing_fact() {
        let mut db = Database::new();
        assert!(matches!(db.retract(&fact("p(a)")), Err(Error::MissingFact(_))));
    }

    #[test]
    fn test_argument_index() {
        let mut db = Database::new();
        db.assert(&fact("parent(a, x)")).unwrap();
        db.assert(&fact("parent(b, y)")).unwrap();
        db.assert(&fact("parent(c, x)")).unwrap();
        let kids: Vec<String> = db
            .lookup("parent", 1, &Constant::from("x"))
            .map(|a| a.terms[0].surface())
            .collect();
        assert_eq!(kids, vec!["a", "c"]);
    }

    #[test]
    fn test_save_then_consult() {
        let mut db = Database::new();
        db.assert(&fact("female(\"Ann Lee\")")).unwrap();
        db.assert(&fact("job(\"Ann Lee\", \"air cabin crew\")")).unwrap();
        let mut out = Vec::new();
        db.save(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "female(\"Ann Lee\").\njob(\"Ann Lee\", \"air cabin crew\").\n");

        let mut copy = Database::new();
        assert_eq!(copy.consult(text.as_bytes()).unwrap(), 2);
        let a: Vec<_> = db.all_facts().collect();
        let b: Vec<_> = copy.all_facts().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_consult_parse_error_leaves_store_untouched() {
        let mut db = Database::new();
        db.assert(&fact("p(a)")).unwrap();
        let result = db.consult("p(b). p(c".as_bytes());
        assert!(matches!(result, Err(Error::Parse { .. })));
        assert_eq!(db.fact_count(), 1);
    }

    #[test]
    fn test_consult_contradiction_is_atomic() {
        let mut db = Database::new();
        let result = db.consult("male(a). p(b). female(a).".as_bytes());
        assert!(matches!(result, Err(Error::Contradiction { .. })));
        assert_eq!(db.fact_count(), 0);
    }
}
