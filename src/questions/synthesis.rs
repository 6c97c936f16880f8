use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::datalog::{Constant, Literal, Term, Variable};
use crate::difficulty::DifficultyTable;
use crate::engine::{Database, QueryPlan, Substitution};
use crate::error::{Error, Result};

use super::template::{Parameter, Slot, Template, ValueKind};

/// One instantiated template.
#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub template_id: String,
    /// Pattern tokens of the template, placeholders included.
    pub template: Vec<String>,
    /// Goals with value slots bound, in declared order.
    pub query: Vec<String>,
    pub answer_variable: String,
    /// Sorted, duplicate free.
    pub answers: Vec<String>,
    pub plan: QueryPlan,
    pub difficulty: u32,
}

/// Every combination picking one element from each domain, first domain
/// outermost. No domains yields a single empty combination.
fn combinations<T: Clone>(domains: &[Vec<T>]) -> Vec<Vec<T>> {
    let mut out = vec![Vec::new()];
    for domain in domains {
        let mut next = Vec::with_capacity(out.len() * domain.len());
        for prefix in &out {
            for value in domain {
                let mut combo = prefix.clone();
                combo.push(value.clone());
                next.push(combo);
            }
        }
        out = next;
    }
    out
}

/// Distinct second arguments of `attribute/2`, first-seen order.
fn attribute_values(store: &Database, attribute: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    store
        .get_facts(attribute)
        .filter_map(|fact| fact.terms.get(1).map(Constant::surface))
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

fn value_domain(store: &Database, kind: ValueKind, bound: &[(Parameter, &str)]) -> Vec<String> {
    match kind {
        ValueKind::Person => store.names_matching("person"),
        ValueKind::AttributeValue => bound
            .iter()
            .find(|(p, _)| *p == Parameter::AttributeName)
            .map(|(_, attribute)| attribute_values(store, attribute))
            .unwrap_or_default(),
    }
}

/// Resolve `goals` and collect the answer variable's values, sorted and deduplicated.
pub fn resolve_answers(store: &Database, goals: &[Literal], answer_variable: &str) -> Vec<String> {
    let mut solutions = store.query(goals);
    let answers: BTreeSet<String> = solutions
        .by_ref()
        .filter_map(|b| b.constant(answer_variable).map(Constant::surface))
        .collect();
    if solutions.depth_exceeded() {
        warn!(
            query = %crate::datalog::format_goals(goals),
            limit = store.max_depth(),
            "answers cut at the depth bound"
        );
    }
    answers.into_iter().collect()
}

fn render(template: &Template, bound: &[(Parameter, &str)], values: &[(&str, &str)]) -> String {
    let mut text = template.pattern.clone();
    for slot in &template.slots {
        let rendered = match slot {
            Slot::Predicate { .. } => slot.render_predicate(bound),
            Slot::Value { name, .. } => values
                .iter()
                .find(|(slot_name, _)| *slot_name == name.as_str())
                .map(|(_, value)| value.to_string()),
        };
        if let Some(rendered) = rendered {
            text = text.replace(&format!("<{}>", slot.name()), &rendered);
        }
    }
    text
}

/// Instantiate `template` against `store`, scoring with the default table.
pub fn synthesize(template: &Template, store: &Database) -> Result<Vec<Question>> {
    synthesize_with(template, store, &DifficultyTable::default())
}

/// Instantiate `template` against `store`.
///
/// Predicate parameters are enumerated in catalog order, then value slot
/// bindings in store order. Each instantiation is resolved once; the answer
/// variable's values over all solutions form the answer set, so join variables
/// the question does not mention stay free. Empty answer sets are dropped
/// unless the template is valid when empty.
pub fn synthesize_with(
    template: &Template,
    store: &Database,
    table: &DifficultyTable,
) -> Result<Vec<Question>> {
    let parameters = template.parameters();
    let domains: Vec<Vec<&str>> = parameters.iter().map(|p| p.domain().to_vec()).collect();
    let tokens = template.tokens();
    let value_slots: Vec<(&str, ValueKind, &str)> = template.value_slots().collect();

    let mut questions = Vec::new();
    let mut dropped = 0;
    for choice in combinations(&domains) {
        let bound: Vec<(Parameter, &str)> = parameters.iter().copied().zip(choice).collect();
        let skeleton = template.instantiate_query(&bound)?;
        let plan = store.plan(&skeleton);
        let difficulty = table.score(&plan);

        let value_domains: Vec<Vec<String>> = value_slots
            .iter()
            .map(|(_, kind, _)| value_domain(store, *kind, &bound))
            .collect();

        for values in combinations(&value_domains) {
            let mut subst = Substitution::empty();
            for ((_, _, variable), value) in value_slots.iter().zip(&values) {
                subst.bind(Variable::new(*variable), Term::atom(value.as_str()));
            }
            let goals: Vec<Literal> = skeleton.iter().map(|g| subst.apply_literal(g)).collect();
            let answers = resolve_answers(store, &goals, &template.answer_variable);
            let query: Vec<String> = goals.iter().map(Literal::to_string).collect();

            if answers.is_empty() && !template.valid_when_empty {
                let err = Error::EmptyAnswerOnRequiredTemplate {
                    template: template.id.clone(),
                    query: query.join(", "),
                };
                debug!(error = %err, "dropped instantiation");
                dropped += 1;
                continue;
            }

            let named: Vec<(&str, &str)> = value_slots
                .iter()
                .zip(&values)
                .map(|((name, _, _), value)| (*name, value.as_str()))
                .collect();
            questions.push(Question {
                id: format!("{}-{}", template.id, questions.len()),
                text: render(template, &bound, &named),
                template_id: template.id.clone(),
                template: tokens.clone(),
                query,
                answer_variable: template.answer_variable.clone(),
                answers,
                plan: plan.clone(),
                difficulty,
            });
        }
    }

    debug!(
        template = %template.id,
        questions = questions.len(),
        dropped,
        "synthesized template"
    );
    Ok(questions)
}
