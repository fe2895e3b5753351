//! Reply parsing, per-field cleaning and the deterministic fallback.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::schema::FieldType;
use crate::config::EntityConfig;
use crate::value;

use super::context::GenerationContext;

/// Extract the first balanced `{...}` substring from free text, respecting
/// string literals and escapes. Providers routinely wrap the requested JSON
/// in prose or markdown fences; a greedy regex would swallow trailing text.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Coerce parsed provider output onto the configuration's field model.
///
/// Every configured field appears in the result exactly once. Fields absent
/// from `data` receive the type's zero value; configured fallback values are
/// reserved for the fallback path. Idempotent: cleaning cleaned data is a
/// no-op.
pub fn clean_entity(config: &EntityConfig, data: &Value) -> HashMap<String, Value> {
    let empty = serde_json::Map::new();
    let object = data.as_object().unwrap_or(&empty);

    let mut cleaned = HashMap::with_capacity(config.fields.len());
    for field in &config.fields {
        let raw = object.get(&field.key);
        let out = match raw {
            Some(raw) if !raw.is_null() => coerce(field.field_type, raw),
            _ => field.field_type.zero_value(),
        };
        cleaned.insert(field.key.clone(), out);
    }
    cleaned
}

fn coerce(field_type: FieldType, raw: &Value) -> Value {
    match field_type {
        FieldType::List => coerce_list(raw),
        FieldType::Number => value::number_value(value::to_number(raw)),
        FieldType::Boolean => Value::Bool(value::truthy(raw)),
        FieldType::Text | FieldType::LongText | FieldType::Select | FieldType::Date => {
            Value::String(value::stringify(raw))
        }
    }
}

/// List coercion accepts three shapes, in documented precedence order:
/// a native array; a string that parses as a JSON array; and only then a
/// comma-separated string. Blank items are filtered in every case.
fn coerce_list(raw: &Value) -> Value {
    let items: Vec<String> = match raw {
        Value::Array(items) => items.iter().map(value::stringify).collect(),
        Value::String(s) => {
            if let Ok(Value::Array(parsed)) = serde_json::from_str::<Value>(s) {
                parsed.iter().map(value::stringify).collect()
            } else {
                s.split(',').map(|item| item.trim().to_string()).collect()
            }
        }
        _ => Vec::new(),
    };
    Value::Array(
        items
            .into_iter()
            .filter(|item| !item.is_empty())
            .map(Value::String)
            .collect(),
    )
}

/// Deterministic entity returned when generation exhausts its retries.
/// Configured fallback values are coerced through the field's type so a
/// numeric field never ends up holding a raw string; remaining textual
/// fields get their placeholder or a generated label, everything else the
/// zero value. `name` and `description` are then overwritten regardless of
/// configuration: the name comes from the target seed or a placeholder, and
/// the description is a one-line sentence naming the project.
pub fn fallback_entity(
    config: &EntityConfig,
    context: &GenerationContext,
) -> HashMap<String, Value> {
    let mut fallback = HashMap::with_capacity(config.fields.len());

    for field in &config.fields {
        let out = match config.generation.fallback_fields.get(&field.key) {
            Some(configured) => coerce(field.field_type, &Value::String(configured.clone())),
            None => match field.field_type {
                FieldType::Text | FieldType::LongText => Value::String(
                    field
                        .placeholder
                        .clone()
                        .unwrap_or_else(|| format!("Generated {}", field.label)),
                ),
                // A select must stay within its options and a date must stay
                // a date; free placeholder text would corrupt them.
                FieldType::Select | FieldType::Date | FieldType::List | FieldType::Number
                | FieldType::Boolean => field.field_type.zero_value(),
            },
        };
        fallback.insert(field.key.clone(), out);
    }

    // Identity fields are overwritten last, even over configured fallbacks,
    // so the result always carries a usable name and a description that
    // places the entity in its project.
    let name = context
        .target_name()
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("New {}", config.name));
    fallback.insert("name".to_string(), Value::String(name));
    fallback.insert(
        "description".to_string(),
        Value::String(format!(
            "A {} in the {} world.",
            config.name.to_lowercase(),
            context.project.name
        )),
    );

    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin;
    use crate::generation::context::ProjectContext;
    use serde_json::json;

    #[test]
    fn extracts_json_embedded_in_prose() {
        let reply = "Sure! Here is the character:\n```json\n{\"name\": \"Aria\"}\n```\nEnjoy.";
        assert_eq!(extract_json_object(reply), Some("{\"name\": \"Aria\"}"));
    }

    #[test]
    fn extraction_respects_nested_objects_and_strings() {
        let reply = r#"prefix {"a": {"b": "closing } inside string"}, "c": 1} suffix"#;
        let extracted = extract_json_object(reply).unwrap();
        assert_eq!(extracted, r#"{"a": {"b": "closing } inside string"}, "c": 1}"#);
        assert!(serde_json::from_str::<Value>(extracted).is_ok());
    }

    #[test]
    fn extraction_fails_without_an_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{unterminated"), None);
    }

    #[test]
    fn clean_coerces_each_field_type() {
        let config = builtin::character();
        let data = json!({
            "name": "  Aria  ",
            "age": "27",
            "alive": "true",
            "personalityTraits": "brave, kind, ",
            "skills": "[\"archery\", \"tracking\"]",
            "description": 42
        });
        let cleaned = clean_entity(&config, &data);
        assert_eq!(cleaned["name"], json!("Aria"));
        assert_eq!(cleaned["age"], json!(27));
        assert_eq!(cleaned["alive"], json!(true));
        assert_eq!(cleaned["personalityTraits"], json!(["brave", "kind"]));
        // JSON array string takes precedence over comma-splitting.
        assert_eq!(cleaned["skills"], json!(["archery", "tracking"]));
        assert_eq!(cleaned["description"], json!("42"));
        // Absent fields get zero values, not configured fallbacks.
        assert_eq!(cleaned["backstory"], json!(""));
        assert_eq!(cleaned["role"], json!(""));
    }

    #[test]
    fn clean_is_idempotent() {
        let config = builtin::character();
        let data = json!({
            "name": "Aria",
            "age": "27",
            "personalityTraits": ["brave", " kind "],
            "alive": true
        });
        let once = clean_entity(&config, &data);
        let twice = clean_entity(&config, &json!(once.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn non_object_input_yields_all_zero_values() {
        let config = builtin::character();
        let cleaned = clean_entity(&config, &json!("not an object"));
        assert_eq!(cleaned.len(), config.fields.len());
        assert_eq!(cleaned["name"], json!(""));
        assert_eq!(cleaned["personalityTraits"], json!([]));
    }

    #[test]
    fn fallback_overwrites_name_and_description_over_configured_values() {
        let config = builtin::character();
        let context =
            GenerationContext::new(ProjectContext::new("p1", "Shattered Realms", "novel"));
        let fallback = fallback_entity(&config, &context);

        // The builtin config configures both fields, but the identity pair
        // is always rebuilt: placeholder name, project-referencing sentence.
        assert_eq!(fallback["name"], json!("New Character"));
        assert_eq!(
            fallback["description"],
            json!("A character in the Shattered Realms world.")
        );
        assert_eq!(fallback["role"], json!("Supporting"));
        assert_eq!(fallback["age"], json!(0));
        assert_eq!(fallback["personalityTraits"], json!([]));
        // Unconfigured textual fields degrade to placeholder text.
        assert_eq!(fallback["motivation"], json!("What drives this character"));
    }

    #[test]
    fn fallback_uses_target_seed_name() {
        let config = builtin::character();
        let context = GenerationContext::new(ProjectContext::new("p1", "Realms", "novel"))
            .with_target(crate::generation::context::TargetSeed {
                name: Some("Mora".into()),
                ..Default::default()
            });
        let fallback = fallback_entity(&config, &context);
        assert_eq!(fallback["name"], json!("Mora"));
    }
}
