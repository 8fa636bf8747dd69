//! # Bulk Import
//!
//! Loads the classic yamdb CSV dump (users, categories, genres, titles,
//! genre/title links, reviews, comments) through the regular store ports.
//! Foreign-key columns hold the dump's own ids; they are mapped onto the
//! UUIDs created here. Rows that violate an invariant are skipped and
//! reported, the rest of the file still loads.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    CatalogRepo, Category, Comment, DomainError, DomainResult, Genre, NamedSlug, Review,
    ReviewRepo, Role, Score, TimestampedAuthored, Title, User, UserPatch, UserRepo,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Same shape for `category.csv` and `genre.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedSlugRow {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleRow {
    pub id: String,
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreTitleRow {
    pub title_id: String,
    pub genre_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRow {
    pub id: String,
    pub title_id: String,
    pub text: String,
    pub author: String,
    pub score: i64,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRow {
    pub id: String,
    pub review_id: String,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

/// Every file of a dump, already parsed. Missing files are empty vectors.
#[derive(Debug, Clone, Default)]
pub struct ImportBundle {
    pub users: Vec<UserRow>,
    pub categories: Vec<NamedSlugRow>,
    pub genres: Vec<NamedSlugRow>,
    pub titles: Vec<TitleRow>,
    pub genre_titles: Vec<GenreTitleRow>,
    pub reviews: Vec<ReviewRow>,
    pub comments: Vec<CommentRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub source: &'static str,
    /// 1-based position of the row within its file (header excluded).
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub counts: Vec<(&'static str, SourceCount)>,
    pub issues: Vec<RowIssue>,
}

impl ImportReport {
    pub fn count(&self, source: &str) -> SourceCount {
        self.counts
            .iter()
            .find(|(name, _)| *name == source)
            .map(|(_, c)| c.clone())
            .unwrap_or_default()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn record(&mut self, source: &'static str, row: usize, outcome: DomainResult<()>) {
        let index = match self.counts.iter().position(|(name, _)| *name == source) {
            Some(i) => i,
            None => {
                self.counts.push((source, SourceCount::default()));
                self.counts.len() - 1
            }
        };
        match outcome {
            Ok(()) => self.counts[index].1.inserted += 1,
            Err(e) => {
                self.counts[index].1.skipped += 1;
                tracing::warn!(source, row, error = %e, "import row skipped");
                self.issues.push(RowIssue {
                    source,
                    row,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Dump ids of one file mapped to the UUIDs created for them.
type IdMap = HashMap<String, Uuid>;

fn lookup(map: &IdMap, entity: &'static str, key: &str) -> DomainResult<Uuid> {
    map.get(key)
        .copied()
        .ok_or_else(|| DomainError::not_found(entity, key))
}

pub struct ImportService {
    users: Arc<dyn UserRepo>,
    catalog: Arc<dyn CatalogRepo>,
    reviews: Arc<dyn ReviewRepo>,
}

impl ImportService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        catalog: Arc<dyn CatalogRepo>,
        reviews: Arc<dyn ReviewRepo>,
    ) -> Self {
        Self {
            users,
            catalog,
            reviews,
        }
    }

    /// Inserts parents before children. Store-level failures (e.g. the
    /// database going away) are reported per row like any other violation.
    #[tracing::instrument(skip_all)]
    pub async fn import(&self, bundle: ImportBundle) -> ImportReport {
        let mut report = ImportReport::default();

        let mut user_ids = IdMap::new();
        for (i, row) in bundle.users.into_iter().enumerate() {
            let key = row.id.clone();
            let outcome = self.import_user(row).await.map(|id| {
                user_ids.insert(key, id);
            });
            report.record("users", i + 1, outcome);
        }

        let mut category_ids = IdMap::new();
        for (i, row) in bundle.categories.into_iter().enumerate() {
            let outcome = match NamedSlug::new(row.name, row.slug) {
                Ok(label) => {
                    let category = Category::new(label);
                    let id = category.id;
                    self.catalog.insert_category(category).await.map(|()| {
                        category_ids.insert(row.id, id);
                    })
                }
                Err(e) => Err(e),
            };
            report.record("categories", i + 1, outcome);
        }

        let mut genre_ids = IdMap::new();
        for (i, row) in bundle.genres.into_iter().enumerate() {
            let outcome = match NamedSlug::new(row.name, row.slug) {
                Ok(label) => {
                    let genre = Genre::new(label);
                    let id = genre.id;
                    self.catalog.insert_genre(genre).await.map(|()| {
                        genre_ids.insert(row.id, id);
                    })
                }
                Err(e) => Err(e),
            };
            report.record("genres", i + 1, outcome);
        }

        // Titles need at least one genre, so links are gathered first and
        // only recorded once it is known whether their title was stored.
        let mut links: HashMap<String, Vec<Uuid>> = HashMap::new();
        let mut link_outcomes = Vec::with_capacity(bundle.genre_titles.len());
        for row in bundle.genre_titles {
            let outcome = lookup(&genre_ids, "genre", &row.genre_id).map(|genre_id| {
                let entry = links.entry(row.title_id.clone()).or_default();
                if !entry.contains(&genre_id) {
                    entry.push(genre_id);
                }
            });
            link_outcomes.push((row.title_id, outcome));
        }

        let mut title_ids = IdMap::new();
        for (i, row) in bundle.titles.into_iter().enumerate() {
            let outcome = async {
                let category_id = match row.category.as_deref().filter(|c| !c.is_empty()) {
                    Some(key) => Some(lookup(&category_ids, "category", key)?),
                    None => None,
                };
                let title = Title {
                    id: Uuid::now_v7(),
                    name: row.name,
                    year: row.year,
                    description: row.description.filter(|d| !d.is_empty()),
                    category_id,
                    genre_ids: links.remove(&row.id).unwrap_or_default(),
                };
                title.validate()?;
                let id = title.id;
                self.catalog.insert_title(title).await?;
                title_ids.insert(row.id, id);
                Ok::<(), DomainError>(())
            }
            .await;
            report.record("titles", i + 1, outcome);
        }

        for (i, (title_key, outcome)) in link_outcomes.into_iter().enumerate() {
            let outcome = outcome.and_then(|()| lookup(&title_ids, "title", &title_key).map(drop));
            report.record("genre_title", i + 1, outcome);
        }

        let mut review_ids = IdMap::new();
        for (i, row) in bundle.reviews.into_iter().enumerate() {
            let outcome = async {
                let title_id = lookup(&title_ids, "title", &row.title_id)?;
                let author_id = lookup(&user_ids, "user", &row.author)?;
                let score = Score::new(row.score)?;
                let post = TimestampedAuthored::at(author_id, row.text, row.pub_date)?;
                let review = Review::new(title_id, score, post);
                let id = review.id;
                self.reviews.insert_review(review).await?;
                review_ids.insert(row.id, id);
                Ok::<(), DomainError>(())
            }
            .await;
            report.record("reviews", i + 1, outcome);
        }

        for (i, row) in bundle.comments.into_iter().enumerate() {
            let outcome = async {
                let review_id = lookup(&review_ids, "review", &row.review_id)?;
                let author_id = lookup(&user_ids, "user", &row.author)?;
                let post = TimestampedAuthored::at(author_id, row.text, row.pub_date)?;
                self.reviews.insert_comment(Comment::new(review_id, post)).await
            }
            .await;
            report.record("comments", i + 1, outcome);
        }

        tracing::info!(issues = report.issues.len(), "import finished");
        report
    }

    async fn import_user(&self, row: UserRow) -> DomainResult<Uuid> {
        let mut user = User::new(&row.username, &row.email, row.role.unwrap_or_default())?;
        user.apply(UserPatch {
            bio: row.bio.filter(|b| !b.is_empty()),
            first_name: row.first_name.filter(|n| !n.is_empty()),
            last_name: row.last_name.filter(|n| !n.is_empty()),
            ..Default::default()
        })?;
        let id = user.id;
        self.users.insert_user(user).await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockCatalogRepo, MockReviewRepo, MockUserRepo};

    #[test]
    fn report_counts_per_source() {
        let mut report = ImportReport::default();
        report.record("reviews", 1, Ok(()));
        report.record("reviews", 2, Err(DomainError::InvalidScore(11)));
        report.record("users", 1, Ok(()));

        assert_eq!(
            report.count("reviews"),
            SourceCount {
                inserted: 1,
                skipped: 1
            }
        );
        assert_eq!(report.count("users").inserted, 1);
        assert_eq!(report.count("comments"), SourceCount::default());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].row, 2);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn review_with_unknown_title_is_skipped() {
        let mut users = MockUserRepo::new();
        users.expect_insert_user().returning(|_| Ok(()));
        let mut reviews = MockReviewRepo::new();
        reviews.expect_insert_review().never();
        let service = ImportService::new(
            Arc::new(users),
            Arc::new(MockCatalogRepo::new()),
            Arc::new(reviews),
        );

        let bundle = ImportBundle {
            users: vec![UserRow {
                id: "1".into(),
                username: "bingobongo".into(),
                email: "bingobongo@yamdb.fake".into(),
                role: Some(Role::User),
                bio: None,
                first_name: None,
                last_name: None,
            }],
            reviews: vec![ReviewRow {
                id: "1".into(),
                title_id: "99".into(),
                text: "Orphan".into(),
                author: "1".into(),
                score: 5,
                pub_date: Utc::now(),
            }],
            ..Default::default()
        };

        let report = service.import(bundle).await;
        assert_eq!(report.count("users").inserted, 1);
        assert_eq!(report.count("reviews").skipped, 1);
        assert_eq!(report.issues[0].reason, "title not found: 99");
    }

    #[tokio::test]
    async fn link_to_a_missing_title_is_reported() {
        let mut catalog = MockCatalogRepo::new();
        catalog.expect_insert_genre().times(1).returning(|_| Ok(()));
        catalog.expect_insert_title().never();
        let service = ImportService::new(
            Arc::new(MockUserRepo::new()),
            Arc::new(catalog),
            Arc::new(MockReviewRepo::new()),
        );

        let bundle = ImportBundle {
            genres: vec![NamedSlugRow {
                id: "1".into(),
                name: "Drama".into(),
                slug: "drama".into(),
            }],
            genre_titles: vec![GenreTitleRow {
                title_id: "404".into(),
                genre_id: "1".into(),
            }],
            ..Default::default()
        };

        let report = service.import(bundle).await;
        assert_eq!(
            report.count("genre_title"),
            SourceCount {
                inserted: 0,
                skipped: 1
            }
        );
        assert_eq!(report.issues[0].reason, "title not found: 404");
        assert!(!report.is_clean());
    }
}
