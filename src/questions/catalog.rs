use tracing::debug;

use crate::error::Result;

use super::template::{Parameter, Slot, Template, ValueKind};

/// The question templates, validated. A broken template fails the whole catalog.
pub fn catalog() -> Result<Vec<Template>> {
    let templates = vec![
        Template::new(
            "relation_of_person",
            "Who is the <relation> of <name>?",
            "<relation>(Y_1, Y_2)",
            "Y_2",
        )
        .with_slot(Slot::predicate("relation", Parameter::Relation))
        .with_slot(Slot::value("name", ValueKind::Person, "Y_1")),
        // Nobody may hold the attribute value and still have the relative, so
        // an empty answer is a legitimate "no such person".
        Template::new(
            "relation_of_attribute_holder",
            "Who is the <relation> of the person whose <attribute_name> is <attribute_value>?",
            "<relation>(Y_2, Y_4), <attribute_name>(Y_2, Y_3)",
            "Y_4",
        )
        .with_slot(Slot::predicate("relation", Parameter::Relation))
        .with_slot(Slot::predicate("attribute_name", Parameter::AttributeName))
        .with_slot(Slot::value("attribute_value", ValueKind::AttributeValue, "Y_3"))
        .valid_when_empty(),
        Template::new(
            "relation_of_relation",
            "Who is the <relation_2> of the <relation> of <name>?",
            "<relation>(Y_1, Y_2), <relation_2>(Y_2, Y_3)",
            "Y_3",
        )
        .with_slot(Slot::predicate("relation", Parameter::Relation))
        .with_slot(Slot::predicate("relation_2", Parameter::Relation2))
        .with_slot(Slot::value("name", ValueKind::Person, "Y_1")),
        Template::new(
            "attribute_of_relation",
            "What is the <attribute_name> of the <relation> of <name>?",
            "<relation>(Y_1, Y_2), <attribute_name>(Y_2, Y_3)",
            "Y_3",
        )
        .with_slot(Slot::predicate("relation", Parameter::Relation))
        .with_slot(Slot::predicate("attribute_name", Parameter::AttributeName))
        .with_slot(Slot::value("name", ValueKind::Person, "Y_1")),
        Template::new(
            "relation_count",
            "How many <relation_plural> does <name> have?",
            "count(<relation>(Y_1, Y_2), Y_3)",
            "Y_3",
        )
        .with_slot(Slot::plural("relation_plural", Parameter::Relation))
        .with_slot(Slot::value("name", ValueKind::Person, "Y_1")),
        Template::new(
            "attribute_of_person",
            "What is the <attribute_name> of <name>?",
            "<attribute_name>(Y_1, Y_2)",
            "Y_2",
        )
        .with_slot(Slot::predicate("attribute_name", Parameter::AttributeName))
        .with_slot(Slot::value("name", ValueKind::Person, "Y_1")),
        Template::new(
            "person_with_attribute",
            "Who is the person whose <attribute_name> is <attribute_value>?",
            "<attribute_name>(Y_1, Y_2)",
            "Y_1",
        )
        .with_slot(Slot::predicate("attribute_name", Parameter::AttributeName))
        .with_slot(Slot::value("attribute_value", ValueKind::AttributeValue, "Y_2")),
    ];

    for template in &templates {
        template.validate()?;
    }
    debug!(templates = templates.len(), "loaded question templates");
    Ok(templates)
}
