//! # Catalog Service
//!
//! Categories, genres and titles. Everyone may read; only admins write.
//! Title reads carry the rating, recomputed through [`RatingAggregator`].

use std::sync::Arc;

use domains::{
    authorize, Action, Actor, CatalogRepo, Category, DomainError, DomainResult, Genre, NamedSlug,
    Resource, Title, TitleDraft,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rating::RatingAggregator;

/// Read model of a title with its references resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleView {
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<Genre>,
    pub category: Option<Category>,
}

/// Query filters for title listings; all given filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Exact name.
    pub name: Option<String>,
    pub year: Option<i32>,
    /// `id`, `name` or `year`; a leading `-` sorts descending. Anything else
    /// keeps the default order by id.
    pub ordering: Option<String>,
}

impl TitleFilter {
    fn matches(&self, view: &TitleView) -> bool {
        let category_ok = self.category.as_deref().is_none_or(|slug| {
            view.category.as_ref().is_some_and(|c| c.slug() == slug)
        });
        let genre_ok = self
            .genre
            .as_deref()
            .is_none_or(|slug| view.genre.iter().any(|g| g.slug() == slug));
        let name_ok = self.name.as_deref().is_none_or(|name| view.name == name);
        let year_ok = self.year.is_none_or(|year| view.year == year);
        category_ok && genre_ok && name_ok && year_ok
    }

    fn sort(&self, views: &mut [TitleView]) {
        views.sort_by_key(|v| v.id);
        let Some(ordering) = self.ordering.as_deref() else {
            return;
        };
        let (field, descending) = match ordering.strip_prefix('-') {
            Some(field) => (field, true),
            None => (ordering, false),
        };
        match field {
            "id" => {}
            "name" => views.sort_by(|a, b| a.name.cmp(&b.name)),
            "year" => views.sort_by_key(|v| v.year),
            _ => return,
        }
        if descending {
            views.reverse();
        }
    }
}

pub struct CatalogService {
    catalog: Arc<dyn CatalogRepo>,
    rating: Arc<RatingAggregator>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepo>, rating: Arc<RatingAggregator>) -> Self {
        Self { catalog, rating }
    }

    // ── Categories ──────────────────────────────────────────────────────────

    pub async fn list_categories(&self) -> DomainResult<Vec<Category>> {
        self.catalog.list_categories().await
    }

    #[tracing::instrument(skip(self, actor))]
    pub async fn create_category(
        &self,
        actor: Option<&Actor>,
        name: &str,
        slug: &str,
    ) -> DomainResult<Category> {
        authorize(actor, Action::Create, &Resource::Catalog)?;
        let category = Category::new(NamedSlug::new(name, slug)?);
        self.catalog.insert_category(category.clone()).await?;
        tracing::info!(slug, "category created");
        Ok(category)
    }

    #[tracing::instrument(skip(self, actor))]
    pub async fn delete_category(&self, actor: Option<&Actor>, slug: &str) -> DomainResult<()> {
        authorize(actor, Action::Delete, &Resource::Catalog)?;
        let category = self
            .catalog
            .find_category_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("category", slug))?;
        self.catalog.delete_category(category.id).await?;
        tracing::info!(slug, "category deleted");
        Ok(())
    }

    // ── Genres ──────────────────────────────────────────────────────────────

    pub async fn list_genres(&self) -> DomainResult<Vec<Genre>> {
        self.catalog.list_genres().await
    }

    #[tracing::instrument(skip(self, actor))]
    pub async fn create_genre(
        &self,
        actor: Option<&Actor>,
        name: &str,
        slug: &str,
    ) -> DomainResult<Genre> {
        authorize(actor, Action::Create, &Resource::Catalog)?;
        let genre = Genre::new(NamedSlug::new(name, slug)?);
        self.catalog.insert_genre(genre.clone()).await?;
        tracing::info!(slug, "genre created");
        Ok(genre)
    }

    #[tracing::instrument(skip(self, actor))]
    pub async fn delete_genre(&self, actor: Option<&Actor>, slug: &str) -> DomainResult<()> {
        authorize(actor, Action::Delete, &Resource::Catalog)?;
        let genre = self
            .catalog
            .find_genre_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("genre", slug))?;
        self.catalog.delete_genre(genre.id).await?;
        tracing::info!(slug, "genre deleted");
        Ok(())
    }

    // ── Titles ──────────────────────────────────────────────────────────────

    pub async fn list_titles(&self, filter: &TitleFilter) -> DomainResult<Vec<TitleView>> {
        let mut views = Vec::new();
        for title in self.catalog.list_titles().await? {
            let view = self.view(title).await?;
            if filter.matches(&view) {
                views.push(view);
            }
        }
        filter.sort(&mut views);
        Ok(views)
    }

    pub async fn get_title(&self, id: Uuid) -> DomainResult<TitleView> {
        let title = self.find_title(id).await?;
        self.view(title).await
    }

    #[tracing::instrument(skip(self, actor, draft))]
    pub async fn create_title(
        &self,
        actor: Option<&Actor>,
        draft: TitleDraft,
    ) -> DomainResult<TitleView> {
        authorize(actor, Action::Create, &Resource::Catalog)?;

        let name = draft
            .name
            .ok_or_else(|| DomainError::Validation("name is required".into()))?;
        let year = draft
            .year
            .ok_or_else(|| DomainError::Validation("year is required".into()))?;
        let category_slug = draft
            .category
            .ok_or_else(|| DomainError::Validation("category is required".into()))?;
        let genre_slugs = draft
            .genre
            .ok_or_else(|| DomainError::Validation("genre is required".into()))?;

        let title = Title {
            id: Uuid::now_v7(),
            name,
            year,
            description: draft.description,
            category_id: Some(self.resolve_category(&category_slug).await?),
            genre_ids: self.resolve_genres(&genre_slugs).await?,
        };
        title.validate()?;

        self.catalog.insert_title(title.clone()).await?;
        tracing::info!(title_id = %title.id, "title created");
        self.view(title).await
    }

    #[tracing::instrument(skip(self, actor, draft))]
    pub async fn update_title(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        draft: TitleDraft,
    ) -> DomainResult<TitleView> {
        authorize(actor, Action::Update, &Resource::Catalog)?;
        let mut title = self.find_title(id).await?;

        if let Some(name) = draft.name {
            title.name = name;
        }
        if let Some(year) = draft.year {
            title.year = year;
        }
        if let Some(description) = draft.description {
            title.description = Some(description);
        }
        if let Some(slug) = draft.category {
            title.category_id = Some(self.resolve_category(&slug).await?);
        }
        if let Some(slugs) = draft.genre {
            let genre_ids = self.resolve_genres(&slugs).await?;
            Title::validate_genres(&genre_ids)?;
            title.genre_ids = genre_ids;
        }
        title.validate_fields()?;

        self.catalog.update_title(title.clone()).await?;
        self.view(title).await
    }

    #[tracing::instrument(skip(self, actor))]
    pub async fn delete_title(&self, actor: Option<&Actor>, id: Uuid) -> DomainResult<()> {
        authorize(actor, Action::Delete, &Resource::Catalog)?;
        if !self.catalog.delete_title(id).await? {
            return Err(DomainError::not_found("title", id));
        }
        tracing::info!(title_id = %id, "title deleted with its reviews");
        Ok(())
    }

    async fn find_title(&self, id: Uuid) -> DomainResult<Title> {
        self.catalog
            .find_title(id)
            .await?
            .ok_or_else(|| DomainError::not_found("title", id))
    }

    async fn resolve_category(&self, slug: &str) -> DomainResult<Uuid> {
        self.catalog
            .find_category_by_slug(slug)
            .await?
            .map(|c| c.id)
            .ok_or_else(|| DomainError::not_found("category", slug))
    }

    async fn resolve_genres(&self, slugs: &[String]) -> DomainResult<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            let genre = self
                .catalog
                .find_genre_by_slug(slug)
                .await?
                .ok_or_else(|| DomainError::not_found("genre", slug))?;
            if !ids.contains(&genre.id) {
                ids.push(genre.id);
            }
        }
        Ok(ids)
    }

    async fn view(&self, title: Title) -> DomainResult<TitleView> {
        let category = match title.category_id {
            Some(id) => self.catalog.find_category(id).await?,
            None => None,
        };
        let mut genre = Vec::with_capacity(title.genre_ids.len());
        for id in &title.genre_ids {
            if let Some(g) = self.catalog.find_genre(*id).await? {
                genre.push(g);
            }
        }
        let rating = self.rating.rating(title.id).await?;

        Ok(TitleView {
            id: title.id,
            name: title.name,
            year: title.year,
            rating,
            description: title.description,
            genre,
            category,
        })
    }
}
