use std::collections::HashMap;

use crate::datalog::{Clause, Literal, Term, Variable};

/// A substitution maps variables to terms. Bindings may chain through other
/// variables; `walk` follows the chain.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Substitution {
    bindings: HashMap<Variable, Term>,
}

impl Substitution {
    /// Create an empty substitution
    pub fn empty() -> Self {
        Substitution {
            bindings: HashMap::new(),
        }
    }

    /// Create a substitution from a single binding
    pub fn singleton(var: Variable, term: Term) -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(var, term);
        Substitution { bindings }
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.bindings.contains_key(var)
    }

    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.bindings.get(var)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind an unbound variable. The caller is responsible for walking `var`
    /// first; binding an already-bound variable overwrites it.
    pub fn bind(&mut self, var: Variable, term: Term) {
        self.bindings.insert(var, term);
    }

    /// Extend the substitution with a new binding.
    /// Returns None if the variable is already bound to a different term.
    pub fn extend(&self, var: Variable, term: Term) -> Option<Substitution> {
        match self.bindings.get(&var) {
            Some(existing) if existing == &term => Some(self.clone()),
            Some(_) => None,
            None => {
                let mut new_sub = self.clone();
                new_sub.bindings.insert(var, term);
                Some(new_sub)
            }
        }
    }

    /// Follow variable bindings until reaching a non-variable or an unbound variable.
    pub fn walk<'a>(&'a self, term: &'a Term) -> &'a Term {
        let mut current = term;
        while let Term::Variable(v) = current {
            match self.bindings.get(v) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Apply substitution to a term, all the way down.
    pub fn apply_term(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Compound(name, args) => {
                Term::Compound(name.clone(), args.iter().map(|a| self.apply_term(a)).collect())
            }
            other => other.clone(),
        }
    }

    /// Apply substitution to a literal
    pub fn apply_literal(&self, lit: &Literal) -> Literal {
        Literal {
            predicate: lit.predicate.clone(),
            terms: lit.terms.iter().map(|t| self.apply_term(t)).collect(),
        }
    }

    /// Get all bindings as an iterator
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.bindings.iter()
    }
}

/// Copy a term with every variable moved into `scope`.
pub fn rename_term(term: &Term, scope: usize) -> Term {
    match term {
        Term::Variable(v) => Term::Variable(v.in_scope(scope)),
        Term::Compound(name, args) => Term::Compound(
            name.clone(),
            args.iter().map(|a| rename_term(a, scope)).collect(),
        ),
        Term::Constant(_) => term.clone(),
    }
}

pub fn rename_literal(lit: &Literal, scope: usize) -> Literal {
    Literal {
        predicate: lit.predicate.clone(),
        terms: lit.terms.iter().map(|t| rename_term(t, scope)).collect(),
    }
}

/// Rename a rule apart so its variables cannot clash with the caller's.
pub fn rename_clause(clause: &Clause, scope: usize) -> Clause {
    Clause {
        head: rename_literal(&clause.head, scope),
        body: clause
            .body
            .iter()
            .map(|l| rename_literal(l, scope))
            .collect(),
    }
}
