use std::fmt::{Display, Formatter, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Assertion(Clause),
    Query(Vec<Literal>),
}

/// A fact (empty body) or a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub head: Literal,
    pub body: Vec<Literal>,
}

/// A predicate applied to arguments: `parent(X, "Ryan Wang")`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    pub predicate: String,
    pub terms: Vec<Term>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Constant(Constant),
    Variable(Variable),
    /// Only used as an argument, e.g. the goal inside `count(sister(X, Y), N)`.
    Compound(String, Vec<Term>),
}

/// A variable is identified by its name and the scope it was created in.
/// Scope 0 belongs to the query; every rule expansion gets a fresh scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub name: String,
    pub scope: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    /// Identifiers and quoted strings share one namespace: `michael` == `"michael"`.
    Atom(String),
    Integer(i64),
}

impl Clause {
    pub fn fact(head: Literal) -> Self {
        Clause { head, body: vec![] }
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
}

impl Literal {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Literal {
            predicate: predicate.into(),
            terms,
        }
    }

    /// Build a ground literal from atom arguments.
    pub fn ground(predicate: &str, args: &[&str]) -> Self {
        Literal::new(predicate, args.iter().map(|a| Term::atom(*a)).collect())
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_ground)
    }

    /// Interpret a compound term as a goal.
    pub fn from_term(term: &Term) -> Option<Literal> {
        match term {
            Term::Compound(name, args) => Some(Literal::new(name.clone(), args.clone())),
            Term::Constant(Constant::Atom(name)) => Some(Literal::new(name.clone(), vec![])),
            _ => None,
        }
    }

    pub fn to_term(&self) -> Term {
        Term::Compound(self.predicate.clone(), self.terms.clone())
    }

    /// Variables in order of first occurrence, including those nested in compound terms.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = Vec::new();
        for term in &self.terms {
            term.collect_variables(&mut vars);
        }
        vars
    }
}

impl Term {
    pub fn atom(value: impl Into<String>) -> Self {
        Term::Constant(Constant::Atom(value.into()))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(Variable::new(name))
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Constant(_) => true,
            Term::Variable(_) => false,
            Term::Compound(_, args) => args.iter().all(Term::is_ground),
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Term::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn collect_variables(&self, vars: &mut Vec<Variable>) {
        match self {
            Term::Variable(v) => {
                if !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
            Term::Compound(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
            Term::Constant(_) => {}
        }
    }
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            scope: 0,
        }
    }

    pub fn in_scope(&self, scope: usize) -> Self {
        Variable {
            name: self.name.clone(),
            scope,
        }
    }
}

impl Constant {
    /// The value as it appears in question text and answer lists.
    pub fn surface(&self) -> String {
        match self {
            Constant::Atom(s) => s.clone(),
            Constant::Integer(i) => i.to_string(),
        }
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::Atom(value.to_string())
    }
}

/// True when an atom can be written without quotes and still parse back to itself.
pub fn is_bare_atom(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Statement::Assertion(c) => write!(f, "{c}."),
            Statement::Query(goals) => {
                write_list(f, goals)?;
                write!(f, "?")
            }
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            write!(f, " :- ")?;
            write_list(f, &self.body)?;
        }
        Ok(())
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.predicate)?;
        if !self.terms.is_empty() {
            write!(f, "(")?;
            write_list(f, &self.terms)?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Term::Constant(c) => write!(f, "{c}"),
            Term::Variable(v) => write!(f, "{v}"),
            Term::Compound(name, args) => {
                write!(f, "{name}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.scope == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "_{}_{}", self.scope, self.name)
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Constant::Atom(s) if is_bare_atom(s) => write!(f, "{s}"),
            Constant::Atom(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        _ => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Constant::Integer(i) => write!(f, "{i}"),
        }
    }
}

/// Render a goal conjunction the way queries are written: `a(X), b(X, Y)`.
pub fn format_goals(goals: &[Literal]) -> String {
    goals
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
