//! The persisted entity record and the store contract it travels through.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::generation::{AI_GENERATED_KEY, GENERATION_PROMPT_KEY};

/// One persisted entity. Configured fields live in the flattened map;
/// everything else is engine bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the entity came out of a successful provider call.
    #[serde(rename = "_aiGenerated", skip_serializing_if = "Option::is_none")]
    pub ai_generated: Option<bool>,
    #[serde(rename = "_generationPrompt", skip_serializing_if = "Option::is_none")]
    pub generation_prompt: Option<String>,
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl Entity {
    /// Build a fresh record from a field map, pulling the generation
    /// provenance markers out of the map and into their own slots.
    pub fn from_fields(project_id: impl Into<String>, mut fields: HashMap<String, Value>) -> Self {
        let ai_generated = match fields.remove(AI_GENERATED_KEY) {
            Some(Value::Bool(true)) => Some(true),
            _ => None,
        };
        let generation_prompt = match fields.remove(GENERATION_PROMPT_KEY) {
            Some(Value::String(prompt)) => Some(prompt),
            _ => None,
        };
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            created_at: now,
            updated_at: now,
            ai_generated,
            generation_prompt,
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn name(&self) -> String {
        self.field("name").map(crate::value::stringify).unwrap_or_default()
    }
}

/// One page of server-side search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub entities: Vec<Entity>,
    pub total: usize,
}

/// Persistence contract for one entity collection. Implementations decide
/// where records live; the engine only assumes these operations.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn list(&self, project_id: &str, entity_type: &str) -> Result<Vec<Entity>, StoreError>;

    async fn get(
        &self,
        project_id: &str,
        entity_type: &str,
        id: &str,
    ) -> Result<Entity, StoreError>;

    /// Persist a new entity built from the field map. The store assigns the
    /// id and timestamps.
    async fn create(
        &self,
        project_id: &str,
        entity_type: &str,
        fields: HashMap<String, Value>,
    ) -> Result<Entity, StoreError>;

    /// Merge the field map into an existing entity, refreshing `updated_at`.
    async fn update(
        &self,
        project_id: &str,
        entity_type: &str,
        id: &str,
        fields: HashMap<String, Value>,
    ) -> Result<Entity, StoreError>;

    async fn delete(
        &self,
        project_id: &str,
        entity_type: &str,
        id: &str,
    ) -> Result<(), StoreError>;

    /// Server-side search. Stores without a search endpoint keep this
    /// default and the engine filters client-side instead.
    async fn search(
        &self,
        _project_id: &str,
        _entity_type: &str,
        _query: &str,
    ) -> Result<SearchPage, StoreError> {
        Err(StoreError::SearchUnsupported)
    }
}

/// Store backed by the project REST API.
pub struct HttpEntityStore {
    client: Client,
    base_url: String,
}

impl HttpEntityStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn collection_url(&self, project_id: &str, entity_type: &str) -> String {
        format!("{}/api/projects/{project_id}/{entity_type}", self.base_url)
    }

    fn entity_url(&self, project_id: &str, entity_type: &str, id: &str) -> String {
        format!("{}/{id}", self.collection_url(project_id, entity_type))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, StoreError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(StoreError::Decode)
    }
}

fn check(operation: &'static str, response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(StoreError::Status {
            operation,
            status: response.status().as_u16(),
        })
    }
}

fn check_found(
    operation: &'static str,
    id: &str,
    response: Response,
) -> Result<Response, StoreError> {
    if response.status() == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(id.to_string()));
    }
    check(operation, response)
}

#[async_trait]
impl EntityStore for HttpEntityStore {
    async fn list(&self, project_id: &str, entity_type: &str) -> Result<Vec<Entity>, StoreError> {
        let response = self
            .client
            .get(self.collection_url(project_id, entity_type))
            .send()
            .await?;
        Self::decode(check("list", response)?).await
    }

    async fn get(
        &self,
        project_id: &str,
        entity_type: &str,
        id: &str,
    ) -> Result<Entity, StoreError> {
        let response = self
            .client
            .get(self.entity_url(project_id, entity_type, id))
            .send()
            .await?;
        Self::decode(check_found("get", id, response)?).await
    }

    async fn create(
        &self,
        project_id: &str,
        entity_type: &str,
        fields: HashMap<String, Value>,
    ) -> Result<Entity, StoreError> {
        let entity = Entity::from_fields(project_id, fields);
        debug!(entity_type, id = %entity.id, "creating entity");
        let response = self
            .client
            .post(self.collection_url(project_id, entity_type))
            .json(&entity)
            .send()
            .await?;
        // The server may adjust the record (normalized fields, its own
        // timestamps); the stored version is the truth, not the request.
        Self::decode(check("create", response)?).await
    }

    async fn update(
        &self,
        project_id: &str,
        entity_type: &str,
        id: &str,
        fields: HashMap<String, Value>,
    ) -> Result<Entity, StoreError> {
        let mut body = serde_json::Map::new();
        for (key, value) in fields {
            body.insert(key, value);
        }
        body.insert("updatedAt".to_string(), serde_json::json!(Utc::now()));

        debug!(entity_type, id, "updating entity");
        let response = self
            .client
            .put(self.entity_url(project_id, entity_type, id))
            .json(&Value::Object(body))
            .send()
            .await?;
        Self::decode(check_found("update", id, response)?).await
    }

    async fn delete(
        &self,
        project_id: &str,
        entity_type: &str,
        id: &str,
    ) -> Result<(), StoreError> {
        debug!(entity_type, id, "deleting entity");
        let response = self
            .client
            .delete(self.entity_url(project_id, entity_type, id))
            .send()
            .await?;
        check_found("delete", id, response)?;
        Ok(())
    }

    async fn search(
        &self,
        project_id: &str,
        entity_type: &str,
        query: &str,
    ) -> Result<SearchPage, StoreError> {
        let url = format!("{}/search", self.collection_url(project_id, entity_type));
        let response = self
            .client
            .get(url)
            .query(&[("q", query)])
            .send()
            .await?;
        Self::decode(check("search", response)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_fields_extracts_provenance_markers() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), json!("Aria"));
        fields.insert(AI_GENERATED_KEY.to_string(), json!(true));
        fields.insert(GENERATION_PROMPT_KEY.to_string(), json!("the prompt"));

        let entity = Entity::from_fields("p1", fields);
        assert_eq!(entity.ai_generated, Some(true));
        assert_eq!(entity.generation_prompt.as_deref(), Some("the prompt"));
        assert_eq!(entity.fields.get("name"), Some(&json!("Aria")));
        assert!(!entity.fields.contains_key(AI_GENERATED_KEY));
        assert_eq!(entity.project_id, "p1");
        assert_eq!(entity.created_at, entity.updated_at);
    }

    #[test]
    fn manual_entities_carry_no_markers() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), json!("Bren"));
        let entity = Entity::from_fields("p1", fields);
        assert_eq!(entity.ai_generated, None);
        assert_eq!(entity.generation_prompt, None);

        let json = serde_json::to_value(&entity).unwrap();
        assert!(json.get("_aiGenerated").is_none());
        assert!(json.get("_generationPrompt").is_none());
    }

    #[test]
    fn server_adjusted_record_survives_the_response_decode() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), json!("  Aria  "));
        let sent = Entity::from_fields("p1", fields);

        // Simulate a server that normalizes the name and stamps its own
        // updatedAt before echoing the record back.
        let mut body = serde_json::to_value(&sent).unwrap();
        body["name"] = json!("Aria");
        body["updatedAt"] = json!("2026-08-26T12:00:00Z");

        let stored: Entity = serde_json::from_str(&body.to_string()).unwrap();
        assert_eq!(stored.id, sent.id);
        assert_eq!(stored.field("name"), Some(&json!("Aria")));
        assert_ne!(stored.updated_at, sent.updated_at);
    }

    #[test]
    fn entity_serializes_flat_and_camel_case() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), json!("Aria"));
        fields.insert(AI_GENERATED_KEY.to_string(), json!(true));
        let entity = Entity::from_fields("p1", fields);

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["projectId"], json!("p1"));
        assert_eq!(json["name"], json!("Aria"));
        assert_eq!(json["_aiGenerated"], json!(true));
        assert!(json.get("createdAt").is_some());

        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, entity.id);
        assert_eq!(back.name(), "Aria");
        assert_eq!(back.ai_generated, Some(true));
    }
}
