//! Reusable story worlds.

use crate::NewStoryParameters;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published story template players can start sessions from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// Record identifier
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Catalog blurb
    pub description: String,
    /// Free-form genre label
    pub genre: String,
    /// Parameters every session of this world starts with
    #[serde(flatten)]
    pub story: NewStoryParameters,
    /// Listed in the public catalog
    pub public: bool,
    /// Offered for instant play
    pub demo: bool,
    /// Teaser shown with demo listings
    pub preview_content: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl World {
    /// Story parameters for a new session in this world.
    pub fn story_parameters(&self) -> NewStoryParameters {
        self.story.clone()
    }
}

/// A world as submitted by its author.
///
/// # Examples
///
/// ```
/// use odyssey_core::NewWorld;
///
/// let world: NewWorld = serde_json::from_str(
///     r#"{"theme": "redemption", "setting": "a drowned city"}"#,
/// ).unwrap();
/// assert_eq!(world.title, "Untitled World");
/// assert_eq!(world.genre, "adventure");
/// assert!(world.public);
/// assert!(!world.demo);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorld {
    /// Display title
    #[serde(default = "default_title")]
    pub title: String,
    /// Catalog blurb
    #[serde(default)]
    pub description: String,
    /// Free-form genre label
    #[serde(default = "default_genre")]
    pub genre: String,
    /// Parameters every session of this world starts with
    #[serde(flatten)]
    pub story: NewStoryParameters,
    /// Listed in the public catalog
    #[serde(default = "default_public")]
    pub public: bool,
    /// Offered for instant play
    #[serde(default)]
    pub demo: bool,
    /// Teaser shown with demo listings
    #[serde(default)]
    pub preview_content: String,
}

fn default_title() -> String {
    "Untitled World".to_string()
}

fn default_genre() -> String {
    "adventure".to_string()
}

fn default_public() -> bool {
    true
}

impl NewWorld {
    /// A public, non-demo world with default labels around `story`.
    pub fn new(story: NewStoryParameters) -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            genre: default_genre(),
            story,
            public: default_public(),
            demo: false,
            preview_content: String::new(),
        }
    }

    /// Assign an identifier and stamp the creation time.
    pub fn into_world(self) -> World {
        World {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            genre: self.genre,
            story: self.story,
            public: self.public,
            demo: self.demo,
            preview_content: self.preview_content,
            created_at: Utc::now(),
        }
    }
}
