//! Runtime context supplied to the generation pipeline. Built fresh per
//! call; never persisted.

/// Facts about the project the entity is being generated for.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub id: String,
    pub name: String,
    /// Project kind, e.g. "novel" or "screenplay".
    pub kind: String,
    pub description: Option<String>,
    pub genre: Vec<String>,
}

impl ProjectContext {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            description: None,
            genre: Vec::new(),
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn genre(mut self, genres: &[&str]) -> Self {
        self.genre = genres.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Partial target entity supplied as a seed.
#[derive(Debug, Clone, Default)]
pub struct TargetSeed {
    pub name: Option<String>,
    pub entity_type: Option<String>,
    pub description: Option<String>,
}

/// Everything the pipeline knows about one generation request.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub project: ProjectContext,
    /// Names of already-existing sibling entities, used for uniqueness and
    /// flavor hints in the prompt.
    pub siblings: Vec<String>,
    pub target: Option<TargetSeed>,
    /// Full replacement for the configuration's prompt template.
    pub custom_prompt: Option<String>,
}

impl GenerationContext {
    pub fn new(project: ProjectContext) -> Self {
        Self {
            project,
            siblings: Vec::new(),
            target: None,
            custom_prompt: None,
        }
    }

    pub fn with_siblings(mut self, names: Vec<String>) -> Self {
        self.siblings = names;
        self
    }

    pub fn with_target(mut self, target: TargetSeed) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target.as_ref().and_then(|t| t.name.as_deref())
    }
}
