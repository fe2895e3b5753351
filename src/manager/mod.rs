//! Entity lifecycle coordination: the cached list, query state, store
//! dispatch and the generation hooks, scoped to one project and one
//! entity type.

pub mod query;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::{ConfigRegistry, EntityConfig, SortDirection};
use crate::error::{EngineError, StoreError};
use crate::generation::{GenerationContext, GenerationPipeline, ProjectContext, TargetSeed};
use crate::value;

pub use query::{EntityQuery, FilterValue};
pub use store::{Entity, EntityStore, HttpEntityStore, SearchPage};

pub struct EntityManager<S: EntityStore> {
    registry: Arc<ConfigRegistry>,
    store: S,
    pipeline: GenerationPipeline,
    project: ProjectContext,
    entity_type: String,

    entities: Vec<Entity>,
    query: EntityQuery,
    selected_id: Option<String>,
    editing_id: Option<String>,
    /// At most one create/update/delete may run per explicit user action;
    /// a second trigger while one is pending is rejected, not queued.
    mutation_in_flight: bool,
}

impl<S: EntityStore> EntityManager<S> {
    pub fn new(
        registry: Arc<ConfigRegistry>,
        store: S,
        pipeline: GenerationPipeline,
        project: ProjectContext,
        entity_type: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let entity_type = entity_type.into();
        let config = registry.require(&entity_type)?;

        // The listing is sorted from the start, not only once a caller picks
        // a sort: seed the query from the configured default sort field.
        let sort_key = config.display.default_sort_field.clone();
        let direction = config
            .display
            .sort_options
            .iter()
            .find(|option| option.key == sort_key)
            .map(|option| option.direction)
            .unwrap_or(SortDirection::Asc);
        let query = EntityQuery::default().sort(sort_key, direction);

        Ok(Self {
            registry,
            store,
            pipeline,
            project,
            entity_type,
            entities: Vec::new(),
            query,
            selected_id: None,
            editing_id: None,
            mutation_in_flight: false,
        })
    }

    pub fn config(&self) -> Result<&EntityConfig, EngineError> {
        Ok(self.registry.require(&self.entity_type)?)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Reload the cached list from the store.
    pub async fn refresh(&mut self) -> Result<(), EngineError> {
        self.entities = self.store.list(&self.project.id, &self.entity_type).await?;
        debug!(entity_type = %self.entity_type, count = self.entities.len(), "list refreshed");
        Ok(())
    }

    /// The cached list with the current search, filters and sort applied.
    pub fn visible_entities(&self) -> Result<Vec<Entity>, EngineError> {
        let config = self.config()?;
        Ok(query::filter_and_sort(config, &self.entities, &self.query))
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.query.search = if text.trim().is_empty() { None } else { Some(text) };
    }

    pub fn set_filter(&mut self, key: impl Into<String>, filter: FilterValue) {
        self.query.filters.insert(key.into(), filter);
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.query.filters.remove(key);
    }

    pub fn set_sort(&mut self, key: impl Into<String>, direction: SortDirection) {
        self.query.sort_key = Some(key.into());
        self.query.direction = direction;
    }

    /// Search via the store when it supports it, falling back to filtering
    /// the cached list when it does not.
    pub async fn search_entities(&self, text: &str) -> Result<Vec<Entity>, EngineError> {
        match self
            .store
            .search(&self.project.id, &self.entity_type, text)
            .await
        {
            Ok(page) => Ok(page.entities),
            Err(StoreError::SearchUnsupported) => {
                let config = self.config()?;
                let query = EntityQuery::default().search(text);
                Ok(query::filter_and_sort(config, &self.entities, &query))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn create_entity(
        &mut self,
        fields: HashMap<String, Value>,
    ) -> Result<Entity, EngineError> {
        self.begin_mutation()?;
        let result = self
            .store
            .create(&self.project.id, &self.entity_type, fields)
            .await;
        self.mutation_in_flight = false;

        let entity = result?;
        info!(entity_type = %self.entity_type, id = %entity.id, "entity created");
        self.entities.push(entity.clone());
        Ok(entity)
    }

    pub async fn update_entity(
        &mut self,
        id: &str,
        fields: HashMap<String, Value>,
    ) -> Result<Entity, EngineError> {
        self.begin_mutation()?;
        let result = self
            .store
            .update(&self.project.id, &self.entity_type, id, fields)
            .await;
        self.mutation_in_flight = false;

        let entity = result?;
        if let Some(slot) = self.entities.iter_mut().find(|e| e.id == id) {
            *slot = entity.clone();
        }
        if self.editing_id.as_deref() == Some(id) {
            self.editing_id = None;
        }
        Ok(entity)
    }

    pub async fn delete_entity(&mut self, id: &str) -> Result<(), EngineError> {
        self.begin_mutation()?;
        let result = self
            .store
            .delete(&self.project.id, &self.entity_type, id)
            .await;
        self.mutation_in_flight = false;

        result?;
        info!(entity_type = %self.entity_type, id, "entity deleted");
        self.entities.retain(|e| e.id != id);
        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }
        if self.editing_id.as_deref() == Some(id) {
            self.editing_id = None;
        }
        Ok(())
    }

    /// Generate an entity from project context and persist it. Generation
    /// itself never fails; only the store call can.
    pub async fn generate_and_create(
        &mut self,
        target: Option<TargetSeed>,
        custom_prompt: Option<&str>,
    ) -> Result<Entity, EngineError> {
        let context = self.generation_context(target);
        let config = self.registry.require(&self.entity_type)?;
        let fields = self
            .pipeline
            .generate_entity(config, &context, custom_prompt)
            .await;
        self.create_entity(fields).await
    }

    /// Regenerate one field of a cached entity and persist the result.
    /// Skips the store entirely when enhancement kept the current value.
    pub async fn enhance_entity_field(
        &mut self,
        id: &str,
        field_key: &str,
    ) -> Result<Entity, EngineError> {
        let entity = self
            .entities
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .clone();

        let current = entity.field(field_key).map(value::stringify).unwrap_or_default();
        let context = self.generation_context(None);
        let config = self.registry.require(&self.entity_type)?;
        let enhanced = self
            .pipeline
            .enhance_field(config, field_key, &current, &entity.fields, &context)
            .await;
        if enhanced == current {
            return Ok(entity);
        }

        let mut fields = HashMap::new();
        fields.insert(field_key.to_string(), Value::String(enhanced));
        self.update_entity(id, fields).await
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected_id = id;
    }

    pub fn selected(&self) -> Option<&Entity> {
        let id = self.selected_id.as_deref()?;
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn begin_editing(&mut self, id: impl Into<String>) {
        self.editing_id = Some(id.into());
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    fn begin_mutation(&mut self) -> Result<(), EngineError> {
        if self.mutation_in_flight {
            return Err(EngineError::MutationInFlight);
        }
        self.mutation_in_flight = true;
        Ok(())
    }

    fn generation_context(&self, target: Option<TargetSeed>) -> GenerationContext {
        let siblings: Vec<String> = self
            .entities
            .iter()
            .map(Entity::name)
            .filter(|name| !name.is_empty())
            .collect();
        let mut context = GenerationContext::new(self.project.clone()).with_siblings(siblings);
        if let Some(target) = target {
            context = context.with_target(target);
        }
        context
    }
}
