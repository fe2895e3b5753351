//! Live form state: field edits, list-field management, completion scoring
//! and submission. The form never talks to persistence; `submit` hands the
//! finished record back to the caller.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::schema::{FieldPriority, FieldType};
use crate::error::ValidationError;
use crate::value;

use super::compiler::CompiledForm;

/// Weighting of essential vs important fields in the completion score.
const ESSENTIAL_WEIGHT: f64 = 0.7;
const IMPORTANT_WEIGHT: f64 = 0.3;

/// Mutable state for one open form.
pub struct FormState {
    form: CompiledForm,
    values: HashMap<String, Value>,
    /// Editing state for list-typed fields, kept as plain strings so items
    /// can be edited in place before blanks are dropped on submit.
    lists: HashMap<String, Vec<String>>,
}

impl FormState {
    pub fn new(form: CompiledForm) -> Self {
        let values = form.defaults().clone();
        let mut lists = HashMap::new();
        for rule in form.rules() {
            if rule.field_type == FieldType::List {
                let items = match values.get(&rule.key) {
                    Some(Value::Array(items)) => {
                        items.iter().map(value::stringify).collect()
                    }
                    _ => Vec::new(),
                };
                lists.insert(rule.key.clone(), items);
            }
        }
        Self {
            form,
            values,
            lists,
        }
    }

    pub fn compiled(&self) -> &CompiledForm {
        &self.form
    }

    /// Set a scalar field value. Unknown keys are rejected.
    pub fn set_value(&mut self, key: &str, val: Value) -> Result<(), ValidationError> {
        if self.form.rule(key).is_none() {
            return Err(ValidationError::UnknownField {
                field: key.to_string(),
            });
        }
        self.values.insert(key.to_string(), val);
        Ok(())
    }

    /// Current value of a field, with list fields reflecting editing state.
    pub fn value(&self, key: &str) -> Option<Value> {
        if let Some(items) = self.lists.get(key) {
            return Some(Value::Array(
                items.iter().map(|s| Value::String(s.clone())).collect(),
            ));
        }
        self.values.get(key).cloned()
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.lists.get(key).map(|items| items.as_slice())
    }

    /// Append an empty item to a list field. No-op once `max_items` is
    /// reached. Returns whether anything changed.
    pub fn add_list_item(&mut self, key: &str) -> bool {
        let max = self.form.rule(key).and_then(|r| r.max_items);
        match self.lists.get_mut(key) {
            Some(items) => {
                if let Some(max) = max {
                    if items.len() >= max {
                        return false;
                    }
                }
                items.push(String::new());
                true
            }
            None => false,
        }
    }

    /// Remove an item from a list field. No-op when `min_items` would be
    /// violated or the index is out of range.
    pub fn remove_list_item(&mut self, key: &str, index: usize) -> bool {
        let min = self.form.rule(key).and_then(|r| r.min_items).unwrap_or(0);
        match self.lists.get_mut(key) {
            Some(items) => {
                if index >= items.len() || (min > 0 && items.len() <= min) {
                    return false;
                }
                items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn update_list_item(&mut self, key: &str, index: usize, val: impl Into<String>) -> bool {
        match self.lists.get_mut(key) {
            Some(items) if index < items.len() => {
                items[index] = val.into();
                true
            }
            _ => false,
        }
    }

    pub fn validate_field(&self, key: &str) -> Result<(), ValidationError> {
        let rule = self
            .form
            .rule(key)
            .ok_or_else(|| ValidationError::UnknownField {
                field: key.to_string(),
            })?;
        let val = self.value(key).unwrap_or(Value::Null);
        rule.check(&val)
    }

    /// All current validation errors, in field order.
    pub fn validate_all(&self) -> Vec<ValidationError> {
        self.form
            .rules()
            .filter_map(|rule| {
                let val = self.value(&rule.key).unwrap_or(Value::Null);
                rule.check(&val).err()
            })
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate_all().is_empty()
    }

    /// Advisory completion score in [0, 100]:
    /// 70% weight on essential fields filled, 30% on important fields.
    /// A tier with no fields counts as complete.
    pub fn completion_percent(&self) -> u8 {
        let fraction = |priority: FieldPriority| -> f64 {
            let mut total = 0usize;
            let mut filled = 0usize;
            for rule in self.form.rules() {
                if rule.priority != priority {
                    continue;
                }
                total += 1;
                let val = self.value(&rule.key).unwrap_or(Value::Null);
                if !value::is_empty(&val) {
                    filled += 1;
                }
            }
            if total == 0 {
                1.0
            } else {
                filled as f64 / total as f64
            }
        };

        let score = (ESSENTIAL_WEIGHT * fraction(FieldPriority::Essential)
            + IMPORTANT_WEIGHT * fraction(FieldPriority::Important))
            * 100.0;
        score.round().clamp(0.0, 100.0) as u8
    }

    /// Validate, merge list state, coerce numbers, mark cleared optional
    /// fields as JSON `null` (distinct from the empty string) and attach the
    /// project id. The caller owns what happens to the record next.
    pub fn submit(&self, project_id: &str) -> Result<HashMap<String, Value>, Vec<ValidationError>> {
        let errors = self.validate_all();
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut record = HashMap::new();
        for rule in self.form.rules() {
            let val = self.value(&rule.key).unwrap_or(Value::Null);
            let out = match rule.field_type {
                FieldType::List => {
                    let items: Vec<Value> = match &val {
                        Value::Array(items) => items
                            .iter()
                            .map(value::stringify)
                            .filter(|s| !s.is_empty())
                            .map(Value::String)
                            .collect(),
                        _ => Vec::new(),
                    };
                    Value::Array(items)
                }
                FieldType::Number => match value::try_number(&val) {
                    Some(n) => value::number_value(n),
                    None => Value::Null,
                },
                FieldType::Boolean => Value::Bool(value::truthy(&val)),
                FieldType::Text | FieldType::LongText | FieldType::Select | FieldType::Date => {
                    let text = value::stringify(&val);
                    if text.is_empty() && !rule.required {
                        Value::Null
                    } else {
                        Value::String(text)
                    }
                }
            };
            record.insert(rule.key.clone(), out);
        }
        record.insert("projectId".to_string(), Value::String(project_id.to_string()));
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin;
    use crate::form::compiler::FormCompiler;
    use serde_json::json;

    fn character_form() -> FormState {
        let config = builtin::character();
        FormState::new(FormCompiler::compile(&config, None).unwrap())
    }

    #[test]
    fn completion_grows_as_fields_fill() {
        let mut form = character_form();
        let start = form.completion_percent();

        form.set_value("name", json!("Aria")).unwrap();
        let after_name = form.completion_percent();
        assert!(after_name > start);

        form.set_value("role", json!("Protagonist")).unwrap();
        form.set_value("description", json!("A wandering scholar."))
            .unwrap();
        form.set_value("personality", json!("Curious and stubborn."))
            .unwrap();
        let after_essentials = form.completion_percent();
        assert!(after_essentials > after_name);
        assert!(after_essentials <= 100);
    }

    #[test]
    fn completion_matches_worked_example() {
        // name (essential) + age (important) only: filling just the name
        // yields round(0.7*1 + 0.3*0) = 70.
        use crate::config::entity::{EntityConfig, GenerationConfig, WizardConfig};
        use crate::config::entity::{DisplayConfig, RelationshipConfig};
        use crate::config::schema::{FieldSchema, FieldType, Section};

        let config = EntityConfig {
            entity_type: "pair".into(),
            name: "Pair".into(),
            plural_name: "Pairs".into(),
            description: String::new(),
            fields: vec![
                FieldSchema::new("name", "Name", FieldType::Text, "main")
                    .priority(FieldPriority::Essential)
                    .required(),
                FieldSchema::new("age", "Age", FieldType::Number, "main"),
            ],
            sections: vec![Section::new("main", "Main", &["name", "age"])],
            generation: GenerationConfig::default(),
            relationships: RelationshipConfig::default(),
            display: DisplayConfig::default(),
            wizard: WizardConfig::default(),
        };

        let mut form = FormState::new(FormCompiler::compile(&config, None).unwrap());
        form.set_value("name", json!("Aria")).unwrap();
        assert_eq!(form.completion_percent(), 70);

        // Demote age to optional: only the essential tier counts, 100%.
        let mut optional = config.clone();
        optional.fields[1].priority = FieldPriority::Optional;
        let mut form = FormState::new(FormCompiler::compile(&optional, None).unwrap());
        form.set_value("name", json!("Aria")).unwrap();
        assert_eq!(form.completion_percent(), 100);
    }

    #[test]
    fn list_editing_respects_bounds() {
        let mut form = character_form();
        // personalityTraits caps at 10 items.
        for _ in 0..12 {
            form.add_list_item("personalityTraits");
        }
        assert_eq!(form.list("personalityTraits").unwrap().len(), 10);

        assert!(form.update_list_item("personalityTraits", 0, "brave"));
        assert!(!form.update_list_item("personalityTraits", 99, "nope"));

        assert!(form.remove_list_item("personalityTraits", 9));
        assert_eq!(form.list("personalityTraits").unwrap().len(), 9);
    }

    #[test]
    fn submit_merges_lists_and_marks_cleared_fields() {
        let mut form = character_form();
        form.set_value("name", json!("Aria")).unwrap();
        form.add_list_item("personalityTraits");
        form.update_list_item("personalityTraits", 0, " brave ");
        form.add_list_item("personalityTraits");
        // Second item left blank; it must be dropped on submit.

        let record = form.submit("project-1").unwrap();
        assert_eq!(record["projectId"], json!("project-1"));
        assert_eq!(record["personalityTraits"], json!(["brave"]));
        // Cleared optional text becomes an explicit null, not "".
        assert_eq!(record["motivation"], Value::Null);
        assert_eq!(record["name"], json!("Aria"));
    }

    #[test]
    fn submit_rejects_invalid_forms() {
        let form = character_form();
        // name is required and empty.
        let errors = form.submit("project-1").unwrap_err();
        assert!(errors.iter().any(|e| e.field() == "name"));
    }

    #[test]
    fn number_submission_coerces_strings() {
        let mut form = character_form();
        form.set_value("name", json!("Aria")).unwrap();
        form.set_value("age", json!("27")).unwrap();
        let record = form.submit("project-1").unwrap();
        assert_eq!(record["age"], json!(27));
    }
}
