//! Prompt assembly for entity generation and single-field enhancement.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::schema::{FieldPriority, FieldSchema, FieldType};
use crate::config::{EnhancementRule, EntityConfig};
use crate::value;

use super::context::GenerationContext;

/// Sibling names included in the context block before truncation.
const MAX_CONTEXT_SIBLINGS: usize = 12;

/// Build the full generation prompt: template placeholders substituted,
/// field structure appended, JSON-only directive last.
pub fn build_generation_prompt(
    config: &EntityConfig,
    context: &GenerationContext,
    custom_prompt: Option<&str>,
) -> String {
    let template = custom_prompt
        .or(context.custom_prompt.as_deref())
        .unwrap_or(&config.generation.prompt_template);

    let genre = if context.project.genre.is_empty() {
        "General Fiction".to_string()
    } else {
        context.project.genre.join(", ")
    };
    let setting = context
        .project
        .description
        .clone()
        .unwrap_or_else(|| "Unknown Setting".to_string());
    let target_name = context
        .target_name()
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("New {}", config.name));

    let mut prompt = template
        .replace("{context}", &build_context_block(context))
        .replace("{entityType}", &config.name)
        .replace("{name}", &target_name)
        .replace("{genre}", &genre)
        .replace("{setting}", &setting)
        .replace("{projectName}", &context.project.name);

    prompt.push_str("\n\nGenerate a JSON object with the following fields:\n");
    for field in &config.fields {
        if matches!(field.priority, FieldPriority::Essential | FieldPriority::Important) {
            prompt.push_str(&format!(
                "- {}: {} - {}",
                field.key,
                type_hint(field),
                field.label
            ));
            if let Some(placeholder) = &field.placeholder {
                prompt.push_str(&format!(" ({placeholder})"));
            }
            prompt.push('\n');
        }
    }
    prompt.push_str(
        "\nReturn ONLY a valid JSON object without any markdown formatting or explanations.",
    );
    prompt
}

fn type_hint(field: &FieldSchema) -> &'static str {
    match field.field_type {
        FieldType::Text => "short text",
        FieldType::LongText => "text",
        FieldType::List => "list of short strings",
        FieldType::Select => "one of the allowed options",
        FieldType::Number => "number",
        FieldType::Date => "date (YYYY-MM-DD)",
        FieldType::Boolean => "true or false",
    }
}

/// Human-readable summary of the project and its existing entities.
pub fn build_context_block(context: &GenerationContext) -> String {
    let mut block = format!(
        "Project: {} ({})",
        context.project.name, context.project.kind
    );
    if let Some(description) = &context.project.description {
        block.push_str(&format!("\nDescription: {description}"));
    }
    if !context.project.genre.is_empty() {
        block.push_str(&format!("\nGenre: {}", context.project.genre.join(", ")));
    }
    if !context.siblings.is_empty() {
        let names: Vec<&str> = context
            .siblings
            .iter()
            .take(MAX_CONTEXT_SIBLINGS)
            .map(|s| s.as_str())
            .collect();
        block.push_str(&format!("\nExisting entities: {}", names.join(", ")));
    }
    block
}

/// Build the prompt for regenerating one field in context of the rest of
/// the entity. Falls back to a generic improvement prompt when the field
/// has no dedicated enhancement rule.
pub fn build_enhancement_prompt(
    field: &FieldSchema,
    rule: Option<&EnhancementRule>,
    current: &str,
    entity_data: &HashMap<String, Value>,
    context: &GenerationContext,
) -> String {
    let label = field.label.to_lowercase();
    let mut prompt = match rule {
        Some(rule) => rule.prompt_template.clone(),
        None => format!(
            "Enhance the {label} for this {}. Current value: \"{current}\". \
             Make it more detailed, compelling, and fitting for the story world.",
            context.project.kind
        ),
    };

    let name = entity_data
        .get("name")
        .map(value::stringify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "the entity".to_string());

    prompt = prompt
        .replace("{current}", current)
        .replace("{name}", &name)
        .replace("{fieldLabel}", &label);

    if let Some(rule) = rule {
        for dep in &rule.dependencies {
            let dep_value = entity_data.get(dep).map(value::stringify).unwrap_or_default();
            prompt = prompt.replace(&format!("{{{dep}}}"), &dep_value);
        }
    }

    prompt.push_str(&format!(
        "\n\nReturn only the enhanced {label} text without quotes or formatting."
    ));
    prompt
}
