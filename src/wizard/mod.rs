//! Guided entity creation as an explicit state machine.
//!
//! The wizard is pure state: it owns the accumulated form data and the
//! current phase, and exposes transitions that a front end renders however
//! it likes. Steps whose skip condition matches the accumulated data are
//! transparent in both directions and contribute nothing to gating or
//! progress.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::config::{CreationMethod, EntityConfig, WizardStep};
use crate::error::WizardError;
use crate::value;

/// Step id reserved for the method picker; it is rendered by the method
/// selection phase and never visited as a form step.
const METHOD_SELECTION_ID: &str = "method-selection";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    /// Waiting for a creation method to be chosen.
    Selection,
    /// Collecting fields on the step at this index into the config's list.
    Step(usize),
    /// All steps passed; the accumulated data has been yielded.
    Complete,
}

pub struct Wizard {
    config: EntityConfig,
    phase: WizardPhase,
    method: Option<CreationMethod>,
    data: HashMap<String, Value>,
    completed: HashSet<String>,
}

impl Wizard {
    pub fn new(config: &EntityConfig) -> Self {
        Self {
            config: config.clone(),
            phase: WizardPhase::Selection,
            method: None,
            data: HashMap::new(),
            completed: HashSet::new(),
        }
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn method(&self) -> Option<CreationMethod> {
        self.method
    }

    pub fn current_step(&self) -> Option<&WizardStep> {
        match self.phase {
            WizardPhase::Step(index) => self.config.wizard.steps.get(index),
            _ => None,
        }
    }

    pub fn accumulated_data(&self) -> &HashMap<String, Value> {
        &self.data
    }

    /// Whether the step with this id has been passed.
    pub fn is_step_complete(&self, step_id: &str) -> bool {
        self.completed.contains(step_id)
    }

    /// Choose the creation method and move to the first applicable step.
    /// A config with no form steps completes immediately.
    pub fn select_method(&mut self, method: CreationMethod) {
        debug!(?method, entity_type = %self.config.entity_type, "wizard method selected");
        self.method = Some(method);
        self.phase = match self.next_active_from(0) {
            Some(index) => WizardPhase::Step(index),
            None => WizardPhase::Complete,
        };
    }

    /// Record a field value. Skip conditions and step validity are evaluated
    /// against the updated data on the next transition.
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Field keys on the current step that still block advancement: every
    /// field of a `required` step, plus any schema-required field, that is
    /// still empty.
    pub fn missing_required(&self) -> Vec<String> {
        let step = match self.current_step() {
            Some(step) => step,
            None => return Vec::new(),
        };
        step.fields
            .iter()
            .filter(|key| {
                let schema_required = self
                    .config
                    .field(key)
                    .map(|field| field.required)
                    .unwrap_or(false);
                step.required || schema_required
            })
            .filter(|key| self.data.get(*key).map(value::is_empty).unwrap_or(true))
            .cloned()
            .collect()
    }

    pub fn is_step_valid(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Advance past the current step. Returns the accumulated data when the
    /// last step is passed; `None` while steps remain.
    pub fn next(&mut self) -> Result<Option<HashMap<String, Value>>, WizardError> {
        let index = match self.phase {
            WizardPhase::Selection => return Err(WizardError::NoMethodSelected),
            WizardPhase::Complete => return Err(WizardError::AlreadyComplete),
            WizardPhase::Step(index) => index,
        };

        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(WizardError::StepIncomplete(missing));
        }

        if let Some(step) = self.config.wizard.steps.get(index) {
            self.completed.insert(step.id.clone());
        }

        match self.next_active_from(index + 1) {
            Some(next_index) => {
                self.phase = WizardPhase::Step(next_index);
                Ok(None)
            }
            None => {
                self.phase = WizardPhase::Complete;
                Ok(Some(self.data.clone()))
            }
        }
    }

    /// Step back to the previous applicable step. No-op on the first step
    /// and outside the step phase.
    pub fn previous(&mut self) {
        if let WizardPhase::Step(index) = self.phase {
            if let Some(previous_index) = self.previous_active_before(index) {
                self.phase = WizardPhase::Step(previous_index);
            }
        }
    }

    /// Position through the applicable steps, 0..=100. Selection is 0 and
    /// completion is 100; skipped steps are excluded from the denominator.
    pub fn progress_percent(&self) -> u8 {
        match self.phase {
            WizardPhase::Selection => 0,
            WizardPhase::Complete => 100,
            WizardPhase::Step(index) => {
                let active: Vec<usize> = self.active_indices().collect();
                let position = match active.iter().position(|&i| i == index) {
                    Some(position) => position,
                    None => return 0,
                };
                ((position as f64 / active.len() as f64) * 100.0).round() as u8
            }
        }
    }

    /// Discard all accumulated state and return to method selection.
    pub fn reset(&mut self) {
        self.phase = WizardPhase::Selection;
        self.method = None;
        self.data.clear();
        self.completed.clear();
    }

    fn is_skipped(&self, step: &WizardStep) -> bool {
        if step.id == METHOD_SELECTION_ID {
            return true;
        }
        step.skip_condition
            .as_ref()
            .map(|condition| condition.matches(&self.data))
            .unwrap_or(false)
    }

    fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.config
            .wizard
            .steps
            .iter()
            .enumerate()
            .filter(|(_, step)| !self.is_skipped(step))
            .map(|(index, _)| index)
    }

    fn next_active_from(&self, start: usize) -> Option<usize> {
        self.active_indices().find(|&index| index >= start)
    }

    fn previous_active_before(&self, index: usize) -> Option<usize> {
        self.active_indices().filter(|&i| i < index).last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin;
    use serde_json::json;

    fn wizard() -> Wizard {
        let config = builtin::character();
        Wizard::new(&config)
    }

    fn step_id(wizard: &Wizard) -> String {
        wizard.current_step().map(|s| s.id.clone()).unwrap_or_default()
    }

    #[test]
    fn starts_in_selection_and_gates_on_method() {
        let mut w = wizard();
        assert_eq!(w.phase(), WizardPhase::Selection);
        assert_eq!(w.progress_percent(), 0);
        assert!(matches!(w.next(), Err(WizardError::NoMethodSelected)));
    }

    #[test]
    fn select_method_skips_the_placeholder_step() {
        let mut w = wizard();
        w.select_method(CreationMethod::Manual);
        assert_eq!(step_id(&w), "basics");
    }

    #[test]
    fn next_is_gated_on_required_fields() {
        let mut w = wizard();
        w.select_method(CreationMethod::Manual);

        match w.next() {
            Err(WizardError::StepIncomplete(missing)) => {
                assert_eq!(missing, vec!["name".to_string(), "role".to_string()]);
            }
            other => panic!("expected StepIncomplete, got {other:?}"),
        }

        w.set_field("name", json!("Aria"));
        w.set_field("role", json!("Protagonist"));
        assert!(w.is_step_valid());
        assert!(matches!(w.next(), Ok(None)));
        assert_eq!(step_id(&w), "description");
        assert!(w.is_step_complete("basics"));
    }

    #[test]
    fn previous_is_a_noop_on_the_first_step() {
        let mut w = wizard();
        w.select_method(CreationMethod::Manual);
        w.previous();
        assert_eq!(step_id(&w), "basics");

        w.set_field("name", json!("Aria"));
        w.set_field("role", json!("Protagonist"));
        w.next().unwrap();
        w.previous();
        assert_eq!(step_id(&w), "basics");
    }

    #[test]
    fn skip_condition_hops_the_step_in_both_directions() {
        let mut w = wizard();
        w.select_method(CreationMethod::Manual);
        w.set_field("name", json!("Guard"));
        w.set_field("role", json!("Minor"));
        w.next().unwrap();

        w.set_field("description", json!("A gate guard."));
        w.set_field("personality", json!("Gruff."));
        w.next().unwrap();
        // `background` is skipped for Minor characters.
        assert_eq!(step_id(&w), "review");

        w.previous();
        assert_eq!(step_id(&w), "description");
    }

    #[test]
    fn completing_the_last_step_yields_the_data() {
        let mut w = wizard();
        w.select_method(CreationMethod::Ai);
        w.set_field("name", json!("Aria"));
        w.set_field("role", json!("Protagonist"));
        w.next().unwrap();
        w.set_field("description", json!("A sea captain."));
        w.set_field("personality", json!("Fierce."));
        w.next().unwrap();
        assert_eq!(step_id(&w), "background");
        w.next().unwrap();
        assert_eq!(step_id(&w), "review");

        let data = w.next().unwrap().expect("final step yields data");
        assert_eq!(data["name"], json!("Aria"));
        assert_eq!(w.phase(), WizardPhase::Complete);
        assert_eq!(w.progress_percent(), 100);
        assert!(matches!(w.next(), Err(WizardError::AlreadyComplete)));
    }

    #[test]
    fn progress_advances_over_active_steps() {
        let mut w = wizard();
        w.select_method(CreationMethod::Manual);
        let at_basics = w.progress_percent();
        w.set_field("name", json!("Aria"));
        w.set_field("role", json!("Protagonist"));
        w.next().unwrap();
        let at_description = w.progress_percent();
        assert!(at_description > at_basics);
    }

    #[test]
    fn reset_discards_everything() {
        let mut w = wizard();
        w.select_method(CreationMethod::Manual);
        w.set_field("name", json!("Aria"));
        w.reset();
        assert_eq!(w.phase(), WizardPhase::Selection);
        assert!(w.accumulated_data().is_empty());
        assert_eq!(w.method(), None);
    }
}
