use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::validation;

/// Name + unique slug pair shared by categories and genres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSlug {
    pub name: String,
    /// The URL slug (e.g., "sci-fi")
    pub slug: String,
}

impl NamedSlug {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> DomainResult<Self> {
        let (name, slug) = (name.into(), slug.into());
        validation::validate_name(&name)?;
        validation::validate_slug(&slug)?;
        Ok(Self { name, slug })
    }
}

/// Broad kind of work (e.g., "Books", "Films"). A title has at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(skip_serializing)]
    pub id: Uuid,
    #[serde(flatten)]
    pub label: NamedSlug,
}

impl Category {
    pub fn new(label: NamedSlug) -> Self {
        Self {
            id: Uuid::now_v7(),
            label,
        }
    }

    pub fn slug(&self) -> &str {
        &self.label.slug
    }
}

/// Tag attached to titles; many-to-many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(skip_serializing)]
    pub id: Uuid,
    #[serde(flatten)]
    pub label: NamedSlug,
}

impl Genre {
    pub fn new(label: NamedSlug) -> Self {
        Self {
            id: Uuid::now_v7(),
            label,
        }
    }

    pub fn slug(&self) -> &str {
        &self.label.slug
    }
}

/// A reviewable work. The rating is derived from reviews and never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    /// `None` once the category was deleted.
    pub category_id: Option<Uuid>,
    pub genre_ids: Vec<Uuid>,
}

impl Title {
    /// Checks the invariants a newly created title must satisfy.
    pub fn validate(&self) -> DomainResult<()> {
        self.validate_fields()?;
        Self::validate_genres(&self.genre_ids)
    }

    /// Name and year only. A title left without genres by a genre delete
    /// still accepts partial updates.
    pub fn validate_fields(&self) -> DomainResult<()> {
        validation::validate_name(&self.name)?;
        validation::validate_year(self.year)
    }

    pub fn validate_genres(genre_ids: &[Uuid]) -> DomainResult<()> {
        if genre_ids.is_empty() {
            return Err(DomainError::Validation(
                "a title needs at least one genre".into(),
            ));
        }
        Ok(())
    }
}

/// Write payload for titles: category and genres are referenced by slug.
/// On update every field is optional; on create `name`, `year`, `category`
/// and `genre` are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub genre: Option<Vec<String>>,
}
