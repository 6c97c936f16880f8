//! Consistency checks run before a fact enters the store.
//!
//! Only the family base predicates carry invariants:
//! - `parent(C, P)`: no self-parenting, at most two parents, two distinct
//!   parents, and no cycles (C may not already be an ancestor of P).
//! - `male(X)` / `female(X)`: an entity has one gender.
//! - `married(A, B)`: irreflexive and one partner per entity.

use std::collections::HashSet;

use crate::datalog::Constant;
use crate::error::{Error, Result};

use super::database::{Database, GroundAtom};

pub const PARENT: &str = "parent";
pub const MARRIED: &str = "married";
pub const MALE: &str = "male";
pub const FEMALE: &str = "female";

/// Returns `Err(Contradiction)` if asserting `atom` would break an invariant.
pub fn check(db: &Database, atom: &GroundAtom) -> Result<()> {
    match atom.predicate.as_str() {
        PARENT => check_parent(db, atom),
        MARRIED => check_married(db, atom),
        MALE => check_gender(db, atom, FEMALE),
        FEMALE => check_gender(db, atom, MALE),
        _ => Ok(()),
    }
}

fn binary<'a>(atom: &'a GroundAtom) -> Result<(&'a Constant, &'a Constant)> {
    match atom.terms.as_slice() {
        [a, b] => Ok((a, b)),
        _ => Err(Error::contradiction(
            atom,
            format!("`{}` takes two arguments", atom.predicate),
        )),
    }
}

fn check_parent(db: &Database, atom: &GroundAtom) -> Result<()> {
    let (child, parent) = binary(atom)?;
    if child == parent {
        return Err(Error::contradiction(atom, "an entity cannot be its own parent"));
    }

    let existing: Vec<&GroundAtom> = db.lookup(PARENT, 0, child).collect();
    if existing.len() >= 2 {
        return Err(Error::contradiction(
            atom,
            format!("{} already has two parents", child.surface()),
        ));
    }

    if is_ancestor(db, child, parent) {
        return Err(Error::contradiction(
            atom,
            format!("{} is an ancestor of {}", child.surface(), parent.surface()),
        ));
    }
    Ok(())
}

/// True if `ancestor` can be reached from `person` by following parent edges upward.
pub fn is_ancestor(db: &Database, ancestor: &Constant, person: &Constant) -> bool {
    let mut seen: HashSet<&Constant> = HashSet::new();
    let mut frontier = vec![person];
    while let Some(current) = frontier.pop() {
        for fact in db.lookup(PARENT, 0, current) {
            let up = &fact.terms[1];
            if up == ancestor {
                return true;
            }
            if seen.insert(up) {
                frontier.push(up);
            }
        }
    }
    false
}

fn check_gender(db: &Database, atom: &GroundAtom, opposite: &str) -> Result<()> {
    let [who] = atom.terms.as_slice() else {
        return Err(Error::contradiction(
            atom,
            format!("`{}` takes one argument", atom.predicate),
        ));
    };
    if db.contains(&GroundAtom::new(opposite, vec![who.clone()])) {
        return Err(Error::contradiction(
            atom,
            format!("{} is already {opposite}", who.surface()),
        ));
    }
    Ok(())
}

fn check_married(db: &Database, atom: &GroundAtom) -> Result<()> {
    let (a, b) = binary(atom)?;
    if a == b {
        return Err(Error::contradiction(atom, "an entity cannot marry itself"));
    }
    for (person, partner) in [(a, b), (b, a)] {
        if let Some(other) = spouse_other_than(db, person, partner) {
            return Err(Error::contradiction(
                atom,
                format!("{} is already married to {}", person.surface(), other.surface()),
            ));
        }
    }
    Ok(())
}

fn spouse_other_than<'a>(db: &'a Database, person: &Constant, partner: &Constant) -> Option<&'a Constant> {
    let as_first = db.lookup(MARRIED, 0, person).map(|f| &f.terms[1]);
    let as_second = db.lookup(MARRIED, 1, person).map(|f| &f.terms[0]);
    as_first.chain(as_second).find(|other| *other != partner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_literal;

    fn assert_ok(db: &mut Database, s: &str) {
        db.assert(&parse_literal(s).unwrap()).unwrap();
    }

    fn rejected(db: &mut Database, s: &str) -> bool {
        let before = db.fact_count();
        let rejected = matches!(
            db.assert(&parse_literal(s).unwrap()),
            Err(Error::Contradiction { .. })
        );
        assert_eq!(db.fact_count(), before, "store changed on rejection");
        rejected
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut db = Database::new();
        assert!(rejected(&mut db, "parent(a, a)"));
    }

    #[test]
    fn test_third_parent_rejected() {
        let mut db = Database::new();
        assert_ok(&mut db, "parent(c, m)");
        assert_ok(&mut db, "parent(c, f)");
        assert!(rejected(&mut db, "parent(c, x)"));
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut db = Database::new();
        assert_ok(&mut db, "parent(c, p)");
        assert_ok(&mut db, "parent(p, g)");
        assert!(rejected(&mut db, "parent(g, c)"));
        assert!(rejected(&mut db, "parent(p, c)"));
        assert!(is_ancestor(&db, &Constant::from("g"), &Constant::from("c")));
    }

    #[test]
    fn test_gender_exclusive() {
        let mut db = Database::new();
        assert_ok(&mut db, "male(a)");
        assert!(rejected(&mut db, "female(a)"));
        assert_ok(&mut db, "male(a)");
    }

    #[test]
    fn test_marriage_is_one_to_one() {
        let mut db = Database::new();
        assert_ok(&mut db, "married(a, b)");
        assert_ok(&mut db, "married(b, a)");
        assert!(rejected(&mut db, "married(a, c)"));
        assert!(rejected(&mut db, "married(c, b)"));
        assert!(rejected(&mut db, "married(d, d)"));
    }

    #[test]
    fn test_marriage_allowed_after_retraction() {
        let mut db = Database::new();
        assert_ok(&mut db, "married(a, b)");
        db.retract(&parse_literal("married(a, b)").unwrap()).unwrap();
        assert_ok(&mut db, "married(a, c)");
    }

    #[test]
    fn test_other_predicates_unconstrained() {
        let mut db = Database::new();
        assert_ok(&mut db, "job(a, \"realtor\")");
        assert_ok(&mut db, "job(a, \"plumber\")");
    }
}
