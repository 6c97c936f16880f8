use std::collections::HashSet;

use crate::datalog::{Clause, Constant, Literal, Statement, Term, Variable};
use crate::error::{Error, Result};

peg::parser! {
    pub grammar peg_parser() for str {
        pub rule program() -> Vec<Statement>
            = _ stmts:(s:statement() _ { s })* { stmts }

        // A goal conjunction, optionally terminated by `.` or `?`.
        pub rule query() -> Vec<Literal>
            = _ q:conjunction() _ ("." / "?")? _ { q }

        rule statement() -> Statement
            = s:(single_assertion() / single_query()) { s }

        rule single_assertion() -> Statement
            = c:clause() _ "." { Statement::Assertion(c) }

        rule single_query() -> Statement
            = q:conjunction() _ "?" { Statement::Query(q) }

        rule clause() -> Clause
            = head:literal() _ ":-" _ body:conjunction() { Clause { head, body } }
            / head:literal() { Clause::fact(head) }

        rule conjunction() -> Vec<Literal>
            = literal() ++ (_ "," _)

        rule literal() -> Literal
            = name:identifier() _ "(" _ terms:(term() ** (_ "," _)) _ ")" { Literal::new(name, terms) }
            / name:identifier() { Literal::new(name, vec![]) }

        rule term() -> Term
            = v:variable() { Term::Variable(Variable::new(v)) }
            / name:identifier() _ "(" _ args:(term() ++ (_ "," _)) _ ")" { Term::Compound(name, args) }
            / c:constant() { Term::Constant(c) }

        rule constant() -> Constant
            = i:integer() { Constant::Integer(i) }
            / s:string() { Constant::Atom(s) }
            / i:identifier() { Constant::Atom(i) }

        rule variable() -> String
            = v:$(['A'..='Z' | '_'] ['A'..='Z' | 'a'..='z' | '0'..='9' | '_']*) { v.to_string() }

        rule identifier() -> String
            = s:$(['a'..='z'] ['A'..='Z' | 'a'..='z' | '0'..='9' | '_']*) { s.to_string() }

        rule string() -> String
            = "\"" chars:string_char()* "\"" { chars.into_iter().collect() }

        rule string_char() -> char
            = "\\\"" { '"' }
            / "\\\\" { '\\' }
            / c:[^ '"' | '\\'] { c }

        rule integer() -> i64
            = n:$("-"? ['0'..='9']+) !['a'..='z' | 'A'..='Z' | '_'] {? n.parse().or(Err("i64")) }

        rule _()
            = quiet!{(comment() / inline_comment() / [' ' | '\n' | '\t' | '\r'])*}

        rule comment()
            = ("%" [^ '\n']* ("\n" / ![_]))

        rule inline_comment()
            = ("/*" (!("*/")[_])* "*/")
    }
}

fn parse_error(input: &str, err: impl ToString) -> Error {
    const SHOWN: usize = 80;
    let input = if input.chars().count() > SHOWN {
        let head: String = input.chars().take(SHOWN).collect();
        format!("{head}...")
    } else {
        input.to_string()
    };
    Error::Parse {
        input,
        message: err.to_string(),
    }
}

/// Parse program text (facts, rules and `?` queries).
pub fn parse_program(input: &str) -> Result<Vec<Statement>> {
    let mut statements = peg_parser::program(input).map_err(|e| parse_error(input, e))?;
    for stmt in statements.iter_mut() {
        match stmt {
            Statement::Assertion(clause) => {
                let mut fresh =
                    AnonymousNamer::avoiding(std::iter::once(&clause.head).chain(&clause.body));
                fresh.literal(&mut clause.head);
                clause.body.iter_mut().for_each(|l| fresh.literal(l));
            }
            Statement::Query(goals) => {
                let mut fresh = AnonymousNamer::avoiding(goals.iter());
                goals.iter_mut().for_each(|l| fresh.literal(l));
            }
        }
    }
    Ok(statements)
}

/// Parse a goal conjunction such as `father(X, jan), job(X, "realtor")`.
pub fn parse_query(input: &str) -> Result<Vec<Literal>> {
    let mut goals = peg_parser::query(input).map_err(|e| parse_error(input, e))?;
    let mut fresh = AnonymousNamer::avoiding(goals.iter());
    goals.iter_mut().for_each(|l| fresh.literal(l));
    Ok(goals)
}

/// Parse a single goal.
pub fn parse_literal(input: &str) -> Result<Literal> {
    let mut goals = parse_query(input)?;
    if goals.len() != 1 {
        return Err(parse_error(input, "expected exactly one goal"));
    }
    Ok(goals.remove(0))
}

/// Gives each `_` in a clause its own name so that occurrences never share a binding.
/// Names already written in the clause are never reused.
struct AnonymousNamer {
    taken: HashSet<String>,
    next: usize,
}

impl AnonymousNamer {
    fn avoiding<'a>(literals: impl IntoIterator<Item = &'a Literal>) -> Self {
        let mut vars = Vec::new();
        for lit in literals {
            lit.terms.iter().for_each(|t| t.collect_variables(&mut vars));
        }
        AnonymousNamer {
            taken: vars.into_iter().map(|v| v.name).collect(),
            next: 0,
        }
    }

    fn fresh(&mut self) -> String {
        loop {
            self.next += 1;
            let name = format!("_G{}", self.next);
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }

    fn literal(&mut self, lit: &mut Literal) {
        lit.terms.iter_mut().for_each(|t| self.term(t));
    }

    fn term(&mut self, term: &mut Term) {
        match term {
            Term::Variable(v) if v.name == "_" => {
                v.name = self.fresh();
            }
            Term::Compound(_, args) => args.iter_mut().for_each(|t| self.term(t)),
            _ => {}
        }
    }
}
