use crate::datalog::Literal;
use crate::error::{Error, Result};
use crate::parser::parse_query;
use crate::rules::{plural, surface, ATTRIBUTES, FAMILY_RELATIONS};

/// A predicate name substituted into a query skeleton before it is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    Relation,
    Relation2,
    AttributeName,
}

impl Parameter {
    /// In enumeration order: the first parameter varies slowest.
    pub const ALL: [Parameter; 3] = [
        Parameter::Relation,
        Parameter::Relation2,
        Parameter::AttributeName,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Relation => "relation",
            Parameter::Relation2 => "relation_2",
            Parameter::AttributeName => "attribute_name",
        }
    }

    pub fn placeholder(self) -> String {
        format!("<{}>", self.name())
    }

    pub fn domain(self) -> &'static [&'static str] {
        match self {
            Parameter::Relation | Parameter::Relation2 => FAMILY_RELATIONS,
            Parameter::AttributeName => ATTRIBUTES,
        }
    }

    fn from_name(name: &str) -> Option<Parameter> {
        Parameter::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// What a value slot ranges over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Every entity satisfying `person/1`.
    Person,
    /// The distinct values of the chosen attribute predicate.
    AttributeValue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Renders a predicate parameter in surface form.
    Predicate {
        name: String,
        parameter: Parameter,
        plural: bool,
    },
    /// Binds a query variable to a value from the store.
    Value {
        name: String,
        kind: ValueKind,
        variable: String,
    },
}

impl Slot {
    pub fn predicate(name: &str, parameter: Parameter) -> Self {
        Slot::Predicate {
            name: name.to_string(),
            parameter,
            plural: false,
        }
    }

    pub fn plural(name: &str, parameter: Parameter) -> Self {
        Slot::Predicate {
            name: name.to_string(),
            parameter,
            plural: true,
        }
    }

    pub fn value(name: &str, kind: ValueKind, variable: &str) -> Self {
        Slot::Value {
            name: name.to_string(),
            kind,
            variable: variable.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Slot::Predicate { name, .. } | Slot::Value { name, .. } => name,
        }
    }

    /// Surface text of a predicate slot under the given parameter choice.
    pub(crate) fn render_predicate(&self, bound: &[(Parameter, &str)]) -> Option<String> {
        let Slot::Predicate {
            parameter, plural: many, ..
        } = self
        else {
            return None;
        };
        let (_, predicate) = bound.iter().find(|(p, _)| p == parameter)?;
        Some(if *many {
            plural(predicate)
        } else {
            surface(predicate)
        })
    }
}

/// A parametrised English question paired with a query skeleton.
///
/// `pattern` holds `<slot>` placeholders, one per slot. `query` holds
/// `<parameter>` placeholders for predicate names; value slots bind variables
/// of the query, and `answer_variable` is the variable whose values answer the
/// question. The declared goal order is kept through to the recorded query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub pattern: String,
    pub query: String,
    pub answer_variable: String,
    pub slots: Vec<Slot>,
    pub valid_when_empty: bool,
}

/// `<name>` placeholders of `text`, in order of appearance.
pub(crate) fn placeholders(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        found.push(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    found
}

impl Template {
    pub fn new(id: &str, pattern: &str, query: &str, answer_variable: &str) -> Self {
        Template {
            id: id.to_string(),
            pattern: pattern.to_string(),
            query: query.to_string(),
            answer_variable: answer_variable.to_string(),
            slots: Vec::new(),
            valid_when_empty: false,
        }
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn valid_when_empty(mut self) -> Self {
        self.valid_when_empty = true;
        self
    }

    /// Pattern tokens, with a trailing `?` split off as its own token.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for word in self.pattern.split_whitespace() {
            match word.strip_suffix('?') {
                Some(head) => {
                    if !head.is_empty() {
                        tokens.push(head.to_string());
                    }
                    tokens.push("?".to_string());
                }
                None => tokens.push(word.to_string()),
            }
        }
        tokens
    }

    /// Predicate parameters the query skeleton uses, in enumeration order.
    pub fn parameters(&self) -> Vec<Parameter> {
        let used = placeholders(&self.query);
        Parameter::ALL
            .into_iter()
            .filter(|p| used.contains(&p.name()))
            .collect()
    }

    pub fn value_slots(&self) -> impl Iterator<Item = (&str, ValueKind, &str)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Value {
                name,
                kind,
                variable,
            } => Some((name.as_str(), *kind, variable.as_str())),
            Slot::Predicate { .. } => None,
        })
    }

    /// Substitute predicate names and parse the skeleton.
    pub fn instantiate_query(&self, bound: &[(Parameter, &str)]) -> Result<Vec<Literal>> {
        let mut text = self.query.clone();
        for (parameter, predicate) in bound {
            text = text.replace(&parameter.placeholder(), predicate);
        }
        parse_query(&text)
    }

    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidTemplate {
            template: self.id.clone(),
            message: message.into(),
        }
    }

    /// Catalog-time consistency checks: placeholders and slots correspond 1:1,
    /// every query placeholder is a known parameter, the skeleton parses, and
    /// the answer and value variables occur in it.
    pub fn validate(&self) -> Result<()> {
        let in_pattern = placeholders(&self.pattern);
        for name in &in_pattern {
            let matching = self.slots.iter().filter(|s| s.name() == *name).count();
            if matching != 1 {
                return Err(self.invalid(format!("placeholder <{name}> has {matching} slots")));
            }
        }
        for slot in &self.slots {
            if !in_pattern.contains(&slot.name()) {
                return Err(self.invalid(format!("slot {} does not occur in the pattern", slot.name())));
            }
        }

        for name in placeholders(&self.query) {
            if Parameter::from_name(name).is_none() {
                return Err(self.invalid(format!("unknown query parameter <{name}>")));
            }
        }
        let parameters = self.parameters();
        for slot in &self.slots {
            match slot {
                Slot::Predicate { parameter, .. } if !parameters.contains(parameter) => {
                    return Err(self.invalid(format!(
                        "slot {} renders <{}>, which the query does not use",
                        slot.name(),
                        parameter.name()
                    )));
                }
                Slot::Value {
                    kind: ValueKind::AttributeValue,
                    ..
                } if !parameters.contains(&Parameter::AttributeName) => {
                    return Err(self.invalid(format!(
                        "slot {} needs an <attribute_name> in the query",
                        slot.name()
                    )));
                }
                _ => {}
            }
        }

        let sample: Vec<(Parameter, &str)> = parameters
            .iter()
            .map(|p| (*p, p.domain()[0]))
            .collect();
        let goals = self
            .instantiate_query(&sample)
            .map_err(|e| self.invalid(format!("query does not parse: {e}")))?;
        let variables: Vec<String> = goals
            .iter()
            .flat_map(|g| g.variables())
            .map(|v| v.name)
            .collect();

        if !variables.contains(&self.answer_variable) {
            return Err(Error::UnboundAnswerVariable {
                template: self.id.clone(),
                variable: self.answer_variable.clone(),
            });
        }
        for (name, _, variable) in self.value_slots() {
            if !variables.iter().any(|v| v == variable) {
                return Err(self.invalid(format!("slot {name} binds {variable}, which the query does not use")));
            }
            if variable == self.answer_variable {
                return Err(self.invalid(format!("slot {name} binds the answer variable")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation_of_person() -> Template {
        Template::new(
            "relation_of_person",
            "Who is the <relation> of <name>?",
            "<relation>(Y_1, Y_2)",
            "Y_2",
        )
        .with_slot(Slot::predicate("relation", Parameter::Relation))
        .with_slot(Slot::value("name", ValueKind::Person, "Y_1"))
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            relation_of_person().tokens(),
            vec!["Who", "is", "the", "<relation>", "of", "<name>", "?"]
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("<relation>(Y_1, Y_2), <relation_2>(Y_2, Y_3)"),
            vec!["relation", "relation_2"]
        );
        assert!(placeholders("no placeholders here").is_empty());
    }

    #[test]
    fn test_parameters_in_enumeration_order() {
        let t = Template::new("t", "", "<attribute_name>(Y_2, Y_3), <relation>(Y_1, Y_2)", "Y_3");
        assert_eq!(t.parameters(), vec![Parameter::Relation, Parameter::AttributeName]);
    }

    #[test]
    fn test_instantiate_query() {
        let goals = relation_of_person()
            .instantiate_query(&[(Parameter::Relation, "great_grandmother")])
            .unwrap();
        assert_eq!(goals[0].to_string(), "great_grandmother(Y_1, Y_2)");
    }

    #[test]
    fn test_valid_template() {
        assert!(relation_of_person().validate().is_ok());
    }

    #[test]
    fn test_unbound_answer_variable() {
        let mut t = relation_of_person();
        t.answer_variable = "Y_9".to_string();
        assert!(matches!(
            t.validate(),
            Err(Error::UnboundAnswerVariable { variable, .. }) if variable == "Y_9"
        ));
    }

    #[test]
    fn test_placeholder_without_slot() {
        let t = Template::new("t", "Who is the <relation> of <name>?", "<relation>(Y_1, Y_2)", "Y_2")
            .with_slot(Slot::predicate("relation", Parameter::Relation));
        assert!(matches!(t.validate(), Err(Error::InvalidTemplate { .. })));
    }

    #[test]
    fn test_slot_without_placeholder() {
        let t = relation_of_person().with_slot(Slot::value("extra", ValueKind::Person, "Y_1"));
        assert!(matches!(t.validate(), Err(Error::InvalidTemplate { .. })));
    }

    #[test]
    fn test_unknown_query_parameter() {
        let t = Template::new("t", "Who is <name>?", "<kinship>(Y_1, Y_2)", "Y_2")
            .with_slot(Slot::value("name", ValueKind::Person, "Y_1"));
        assert!(matches!(t.validate(), Err(Error::InvalidTemplate { .. })));
    }

    #[test]
    fn test_attribute_value_needs_attribute_parameter() {
        let t = Template::new("t", "Who has <attribute_value>?", "job(Y_1, Y_2)", "Y_1")
            .with_slot(Slot::value("attribute_value", ValueKind::AttributeValue, "Y_2"));
        assert!(matches!(t.validate(), Err(Error::InvalidTemplate { .. })));
    }

    #[test]
    fn test_value_slot_on_answer_variable() {
        let t = Template::new("t", "Who is the <relation> of <name>?", "<relation>(Y_1, Y_2)", "Y_2")
            .with_slot(Slot::predicate("relation", Parameter::Relation))
            .with_slot(Slot::value("name", ValueKind::Person, "Y_2"));
        assert!(matches!(t.validate(), Err(Error::InvalidTemplate { .. })));
    }

    #[test]
    fn test_render_predicate() {
        let bound = [(Parameter::Relation, "great_grandchild")];
        assert_eq!(
            Slot::plural("relation_plural", Parameter::Relation).render_predicate(&bound),
            Some("great-grandchildren".to_string())
        );
        assert_eq!(
            Slot::predicate("relation", Parameter::Relation).render_predicate(&bound),
            Some("great-grandchild".to_string())
        );
        assert_eq!(
            Slot::value("name", ValueKind::Person, "Y_1").render_predicate(&bound),
            None
        );
    }
}
