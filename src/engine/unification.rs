use crate::datalog::{Constant, Literal, Term};

use super::substitution::Substitution;

/// Unify two terms under `subst`, returning the extended substitution.
/// Syntactic, without an occurs check.
pub fn unify(t1: &Term, t2: &Term, subst: &Substitution) -> Option<Substitution> {
    let mut out = subst.clone();
    if unify_in_place(t1, t2, &mut out) {
        Some(out)
    } else {
        None
    }
}

fn unify_in_place(t1: &Term, t2: &Term, subst: &mut Substitution) -> bool {
    let a = subst.walk(t1).clone();
    let b = subst.walk(t2).clone();

    match (&a, &b) {
        // Two constants: must be equal
        (Term::Constant(c1), Term::Constant(c2)) => c1 == c2,

        (Term::Variable(v1), Term::Variable(v2)) if v1 == v2 => true,

        // Variable and anything else: bind the variable
        (Term::Variable(v), other) | (other, Term::Variable(v)) => {
            subst.bind(v.clone(), other.clone());
            true
        }

        (Term::Compound(f1, args1), Term::Compound(f2, args2)) => {
            f1 == f2
                && args1.len() == args2.len()
                && args1
                    .iter()
                    .zip(args2.iter())
                    .all(|(x, y)| unify_in_place(x, y, subst))
        }

        _ => false,
    }
}

/// Unify two literals: same predicate, same arity, pairwise unifiable arguments.
pub fn unify_literals(l1: &Literal, l2: &Literal, subst: &Substitution) -> Option<Substitution> {
    if l1.predicate != l2.predicate || l1.terms.len() != l2.terms.len() {
        return None;
    }

    let mut out = subst.clone();
    for (t1, t2) in l1.terms.iter().zip(l2.terms.iter()) {
        if !unify_in_place(t1, t2, &mut out) {
            return None;
        }
    }
    Some(out)
}

/// Match a goal against a ground fact's arguments, extending `subst`.
/// Cheaper than `unify_literals` since one side is known to be ground.
pub fn match_fact(goal: &Literal, fact: &[Constant], subst: &Substitution) -> Option<Substitution> {
    if goal.terms.len() != fact.len() {
        return None;
    }

    let mut out: Option<Substitution> = None;
    for (term, value) in goal.terms.iter().zip(fact.iter()) {
        let walked = out.as_ref().unwrap_or(subst).walk(term).clone();
        match walked {
            Term::Constant(c) => {
                if &c != value {
                    return None;
                }
            }
            Term::Variable(v) => {
                out.get_or_insert_with(|| subst.clone())
                    .bind(v, Term::Constant(value.clone()));
            }
            Term::Compound(..) => return None,
        }
    }

    Some(out.unwrap_or_else(|| subst.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::Variable;
    use crate::parser::parse_literal;

    fn lit(s: &str) -> Literal {
        parse_literal(s).unwrap()
    }

    #[test]
    fn test_unify_constants() {
        let s = Substitution::empty();
        assert!(unify(&Term::atom("a"), &Term::atom("a"), &s).is_some());
        assert!(unify(&Term::atom("a"), &Term::atom("b"), &s).is_none());
    }

    #[test]
    fn test_unify_binds_both_directions() {
        let result = unify_literals(&lit("parent(X, mary)"), &lit("parent(john, Y)"), &Substitution::empty())
            .expect("should unify");
        assert_eq!(result.apply_term(&Term::var("X")), Term::atom("john"));
        assert_eq!(result.apply_term(&Term::var("Y")), Term::atom("mary"));
    }

    #[test]
    fn test_repeated_variable_must_agree() {
        let s = Substitution::empty();
        assert!(unify_literals(&lit("same(X, X)"), &lit("same(a, b)"), &s).is_none());
        assert!(unify_literals(&lit("same(X, X)"), &lit("same(a, a)"), &s).is_some());
    }

    #[test]
    fn test_arity_and_name_mismatch() {
        let s = Substitution::empty();
        assert!(unify_literals(&lit("p(X)"), &lit("p(a, b)"), &s).is_none());
        assert!(unify_literals(&lit("p(X)"), &lit("q(a)"), &s).is_none());
    }

    #[test]
    fn test_unify_compound() {
        let s = Substitution::empty();
        let a = lit("count(sister(alice, X), N)");
        let b = lit("count(sister(Y, bob), 2)");
        let out = unify_literals(&a, &b, &s).unwrap();
        assert_eq!(out.apply_literal(&a).to_string(), "count(sister(alice, bob), 2)");
    }

    #[test]
    fn test_match_fact_respects_existing_bindings() {
        let s = Substitution::singleton(Variable::new("X"), Term::atom("tom"));
        let goal = lit("parent(X, Y)");
        let fact = vec![Constant::from("tom"), Constant::from("bob")];
        let other = vec![Constant::from("ann"), Constant::from("bob")];
        let out = match_fact(&goal, &fact, &s).unwrap();
        assert_eq!(out.apply_term(&Term::var("Y")), Term::atom("bob"));
        assert!(match_fact(&goal, &other, &s).is_none());
    }
}
