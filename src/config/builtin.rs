//! Built-in entity configurations registered at bootstrap.

use std::collections::HashMap;

use super::entity::{
    CreationMethod, DisplayConfig, DisplayFields, EnhancementRule, EntityConfig, FilterKind,
    FilterOption, GenerationConfig, RelationshipConfig, SkipCondition, SortDirection, SortOption,
    WizardConfig, WizardStep,
};
use super::schema::{FieldPriority, FieldSchema, FieldType, FieldValidation, Section};

const CHARACTER_PROMPT: &str = "\
Generate a detailed character that fits seamlessly into the story world.
The character should be original, compelling, and have rich details that spark imagination.
Context: {context}
Entity Type: {entityType}
Story Genre: {genre}
Setting: {setting}

Create a character with authentic personality, realistic background, and clear motivations.
Make them feel like a real person with depth, flaws, and complexity.";

const LOCATION_PROMPT: &str = "\
Generate an evocative location for the story world of {projectName}.
Context: {context}
Story Genre: {genre}
Setting: {setting}

Create a place with a distinct atmosphere, a clear role in the story, and
details a writer can build scenes around.";

/// Character configuration.
pub fn character() -> EntityConfig {
    let fields = vec![
        // Identity
        FieldSchema::new("name", "Name", FieldType::Text, "identity")
            .priority(FieldPriority::Essential)
            .required()
            .placeholder("Character name")
            .max_length(200)
            .in_card()
            .in_list(),
        FieldSchema::new("role", "Story Role", FieldType::Select, "identity")
            .priority(FieldPriority::Essential)
            .options(&["Protagonist", "Antagonist", "Supporting", "Minor"])
            .in_card()
            .in_list(),
        FieldSchema::new("race", "Race", FieldType::Text, "identity")
            .placeholder("Human, Elf, Dwarf, etc.")
            .in_card(),
        FieldSchema::new("profession", "Profession", FieldType::Text, "identity")
            .placeholder("Job or career"),
        FieldSchema::new("age", "Age", FieldType::Number, "identity")
            .priority(FieldPriority::Optional)
            .validation(FieldValidation {
                min: Some(0.0),
                max: Some(10_000.0),
                ..FieldValidation::default()
            }),
        FieldSchema::new("alive", "Alive", FieldType::Boolean, "identity")
            .priority(FieldPriority::Optional),
        // Core description
        FieldSchema::new("description", "Description", FieldType::LongText, "core")
            .priority(FieldPriority::Essential)
            .placeholder("Overall character description")
            .in_card()
            .in_list(),
        // Personality
        FieldSchema::new("personality", "Personality", FieldType::LongText, "personality")
            .priority(FieldPriority::Essential)
            .placeholder("Core personality traits and characteristics")
            .in_card(),
        FieldSchema::new(
            "personalityTraits",
            "Personality Traits",
            FieldType::List,
            "personality",
        )
        .placeholder("Brave, cunning, compassionate, etc.")
        .validation(FieldValidation {
            max_items: Some(10),
            ..FieldValidation::default()
        }),
        FieldSchema::new("skills", "Skills", FieldType::List, "personality")
            .priority(FieldPriority::Optional)
            .placeholder("Swordplay, diplomacy, herbalism, etc."),
        // Background
        FieldSchema::new("backstory", "Backstory", FieldType::LongText, "background")
            .placeholder("History and formative events"),
        FieldSchema::new("motivation", "Motivation", FieldType::Text, "background")
            .placeholder("What drives this character"),
    ];

    let sections = vec![
        Section::new(
            "identity",
            "Identity",
            &["name", "role", "race", "profession", "age", "alive"],
        ),
        Section::new("core", "Description", &["description"]),
        Section::new(
            "personality",
            "Personality",
            &["personality", "personalityTraits", "skills"],
        ),
        Section::new("background", "Background", &["backstory", "motivation"]),
    ];

    let generation = GenerationConfig {
        prompt_template: CHARACTER_PROMPT.to_string(),
        context_fields: vec![
            "name".into(),
            "role".into(),
            "description".into(),
            "personality".into(),
        ],
        enhancement_rules: vec![
            EnhancementRule {
                field_key: "personality".into(),
                prompt_template: "Enhance the personality of {name}, a {role}. Current: {current}. \
                                  Make it more detailed and nuanced."
                    .into(),
                dependencies: vec!["name".into(), "role".into()],
            },
            EnhancementRule {
                field_key: "backstory".into(),
                prompt_template: "Create a compelling backstory for {name}, considering their \
                                  {personality} and {role}."
                    .into(),
                dependencies: vec!["name".into(), "personality".into(), "role".into()],
            },
        ],
        fallback_fields: HashMap::from([
            ("name".to_string(), "Unnamed Character".to_string()),
            ("role".to_string(), "Supporting".to_string()),
            (
                "description".to_string(),
                "A mysterious figure whose story is yet to be told.".to_string(),
            ),
        ]),
        max_retries: 3,
        temperature: 0.8,
    };

    let relationships = RelationshipConfig {
        allowed_types: vec![
            "family".into(),
            "friend".into(),
            "enemy".into(),
            "rival".into(),
            "mentor".into(),
            "ally".into(),
            "romantic".into(),
        ],
        default_types: vec!["friend".into()],
        bidirectional: true,
        ..RelationshipConfig::default()
    };

    let display = DisplayConfig {
        default_sort_field: "name".into(),
        sort_options: vec![
            SortOption {
                key: "name".into(),
                label: "Name".into(),
                direction: SortDirection::Asc,
            },
            SortOption {
                key: "age".into(),
                label: "Age".into(),
                direction: SortDirection::Asc,
            },
            SortOption {
                key: "createdAt".into(),
                label: "Created".into(),
                direction: SortDirection::Desc,
            },
            SortOption {
                key: "updatedAt".into(),
                label: "Modified".into(),
                direction: SortDirection::Desc,
            },
        ],
        filter_options: vec![
            FilterOption {
                key: "role".into(),
                label: "Story Role".into(),
                kind: FilterKind::Select,
                options: Some(vec![
                    "Protagonist".into(),
                    "Antagonist".into(),
                    "Supporting".into(),
                    "Minor".into(),
                ]),
            },
            FilterOption {
                key: "personalityTraits".into(),
                label: "Trait".into(),
                kind: FilterKind::Multiselect,
                options: None,
            },
            FilterOption {
                key: "alive".into(),
                label: "Alive".into(),
                kind: FilterKind::Boolean,
                options: None,
            },
            FilterOption {
                key: "age".into(),
                label: "Age".into(),
                kind: FilterKind::Range,
                options: None,
            },
        ],
        search_fields: vec![
            "name".into(),
            "description".into(),
            "personality".into(),
            "personalityTraits".into(),
        ],
        display_fields: DisplayFields {
            card: vec!["name".into(), "role".into(), "race".into(), "description".into()],
            list: vec!["name".into(), "role".into(), "description".into()],
            detail: vec![
                "name".into(),
                "role".into(),
                "description".into(),
                "personality".into(),
                "backstory".into(),
            ],
        },
    };

    let wizard = WizardConfig {
        steps: vec![
            WizardStep {
                id: "method-selection".into(),
                title: "Choose Method".into(),
                description: "How would you like to create this character?".into(),
                fields: Vec::new(),
                required: false,
                skip_condition: None,
            },
            WizardStep {
                id: "basics".into(),
                title: "Basics".into(),
                description: "Name and role".into(),
                fields: vec!["name".into(), "role".into()],
                required: true,
                skip_condition: None,
            },
            WizardStep {
                id: "description".into(),
                title: "Description".into(),
                description: "Who are they?".into(),
                fields: vec!["description".into(), "personality".into()],
                required: true,
                skip_condition: None,
            },
            // Minor characters do not need a deep backstory.
            WizardStep {
                id: "background".into(),
                title: "Background".into(),
                description: "History and motivation".into(),
                fields: vec!["backstory".into(), "motivation".into()],
                required: false,
                skip_condition: Some(SkipCondition::FieldEquals {
                    field: "role".into(),
                    value: serde_json::json!("Minor"),
                }),
            },
            WizardStep {
                id: "review".into(),
                title: "Review".into(),
                description: "Check everything before saving".into(),
                fields: Vec::new(),
                required: false,
                skip_condition: None,
            },
        ],
        methods: vec![
            CreationMethod::Manual,
            CreationMethod::Template,
            CreationMethod::Ai,
            CreationMethod::Upload,
        ],
    };

    EntityConfig {
        entity_type: "characters".into(),
        name: "Character".into(),
        plural_name: "Characters".into(),
        description: "People and beings that drive the story".into(),
        fields,
        sections,
        generation,
        relationships,
        display,
        wizard,
    }
}

/// Location configuration.
pub fn location() -> EntityConfig {
    let fields = vec![
        FieldSchema::new("name", "Name", FieldType::Text, "identity")
            .priority(FieldPriority::Essential)
            .required()
            .placeholder("Location name")
            .max_length(200)
            .in_card()
            .in_list(),
        FieldSchema::new("locationType", "Location Type", FieldType::Select, "identity")
            .priority(FieldPriority::Essential)
            .options(&[
                "City", "Town", "Village", "Forest", "Mountain", "Castle", "Ruins", "Other",
            ])
            .in_card(),
        FieldSchema::new("status", "Status", FieldType::Text, "identity")
            .priority(FieldPriority::Optional)
            .placeholder("Active, Ruins, Abandoned, etc."),
        FieldSchema::new("population", "Population", FieldType::Number, "identity")
            .priority(FieldPriority::Optional)
            .validation(FieldValidation {
                min: Some(0.0),
                ..FieldValidation::default()
            }),
        FieldSchema::new("founded", "Founded", FieldType::Date, "identity")
            .priority(FieldPriority::Optional),
        FieldSchema::new("description", "Description", FieldType::LongText, "core")
            .priority(FieldPriority::Essential)
            .placeholder("Overall location description")
            .in_card()
            .in_list(),
        FieldSchema::new("atmosphere", "Atmosphere", FieldType::LongText, "core")
            .placeholder("The mood and feeling of this place")
            .in_card(),
        FieldSchema::new("significance", "Significance", FieldType::LongText, "core")
            .placeholder("Why this location matters to the story"),
        FieldSchema::new("landmarks", "Landmarks", FieldType::List, "geography")
            .placeholder("Notable landmarks and monuments"),
        FieldSchema::new("climate", "Climate", FieldType::Text, "geography")
            .priority(FieldPriority::Optional)
            .placeholder("Weather patterns and climate"),
    ];

    let sections = vec![
        Section::new(
            "identity",
            "Identity",
            &["name", "locationType", "status", "population", "founded"],
        ),
        Section::new(
            "core",
            "Description",
            &["description", "atmosphere", "significance"],
        ),
        Section::new("geography", "Geography", &["landmarks", "climate"]),
    ];

    let generation = GenerationConfig {
        prompt_template: LOCATION_PROMPT.to_string(),
        context_fields: vec!["name".into(), "locationType".into(), "description".into()],
        enhancement_rules: vec![
            EnhancementRule {
                field_key: "atmosphere".into(),
                prompt_template: "Enhance the atmosphere of {name}, a {locationType}. \
                                  Current: {current}. Make it more vivid and sensory."
                    .into(),
                dependencies: vec!["name".into(), "locationType".into()],
            },
            EnhancementRule {
                field_key: "significance".into(),
                prompt_template: "Explain why {name} matters to the story, building on: \
                                  {description}. Current: {current}."
                    .into(),
                dependencies: vec!["name".into(), "description".into()],
            },
        ],
        fallback_fields: HashMap::from([
            ("name".to_string(), "Unnamed Place".to_string()),
            (
                "description".to_string(),
                "A place whose story is yet to be told.".to_string(),
            ),
        ]),
        max_retries: 3,
        temperature: 0.8,
    };

    let display = DisplayConfig {
        filter_options: vec![
            FilterOption {
                key: "locationType".into(),
                label: "Type".into(),
                kind: FilterKind::Select,
                options: Some(vec![
                    "City".into(),
                    "Town".into(),
                    "Village".into(),
                    "Forest".into(),
                    "Mountain".into(),
                    "Castle".into(),
                    "Ruins".into(),
                    "Other".into(),
                ]),
            },
            FilterOption {
                key: "population".into(),
                label: "Population".into(),
                kind: FilterKind::Range,
                options: None,
            },
        ],
        search_fields: vec!["name".into(), "description".into(), "atmosphere".into()],
        display_fields: DisplayFields {
            card: vec!["name".into(), "locationType".into(), "description".into()],
            list: vec!["name".into(), "locationType".into(), "description".into()],
            detail: vec![
                "name".into(),
                "locationType".into(),
                "description".into(),
                "atmosphere".into(),
                "significance".into(),
            ],
        },
        ..DisplayConfig::default()
    };

    let wizard = WizardConfig {
        steps: vec![
            WizardStep {
                id: "method-selection".into(),
                title: "Choose Method".into(),
                description: String::new(),
                fields: Vec::new(),
                required: false,
                skip_condition: None,
            },
            WizardStep {
                id: "basics".into(),
                title: "Basics".into(),
                description: "Name and type".into(),
                fields: vec!["name".into(), "locationType".into()],
                required: true,
                skip_condition: None,
            },
            WizardStep {
                id: "description".into(),
                title: "Description".into(),
                description: "What does it look and feel like?".into(),
                fields: vec!["description".into(), "atmosphere".into()],
                required: true,
                skip_condition: None,
            },
            WizardStep {
                id: "review".into(),
                title: "Review".into(),
                description: String::new(),
                fields: Vec::new(),
                required: false,
                skip_condition: None,
            },
        ],
        methods: vec![
            CreationMethod::Manual,
            CreationMethod::Template,
            CreationMethod::Ai,
        ],
    };

    EntityConfig {
        entity_type: "locations".into(),
        name: "Location".into(),
        plural_name: "Locations".into(),
        description: "Places where the story happens".into(),
        fields,
        sections,
        generation,
        relationships: RelationshipConfig::default(),
        display,
        wizard,
    }
}
