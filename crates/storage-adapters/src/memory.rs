//! # In-Memory Entity Store
//!
//! Every table lives behind one `RwLock`, so each port call runs as a single
//! atomic section: a uniqueness check and the insert it guards cannot be
//! interleaved with another writer, and cascades never leave orphans behind.
//!
//! Rows are keyed by UUID v7 in `BTreeMap`s, which keeps listings in
//! creation order without a separate index.

use std::collections::BTreeMap;

use async_trait::async_trait;
use domains::{
    CatalogRepo, Category, Comment, DomainError, DomainResult, Genre, Review, ReviewRepo, Title,
    User, UserRepo,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    categories: BTreeMap<Uuid, Category>,
    genres: BTreeMap<Uuid, Genre>,
    titles: BTreeMap<Uuid, Title>,
    reviews: BTreeMap<Uuid, Review>,
    comments: BTreeMap<Uuid, Comment>,
}

impl Tables {
    fn check_user_unique(&self, user: &User) -> DomainResult<()> {
        for other in self.users.values().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(DomainError::Conflict(format!(
                    "username `{}` is already taken",
                    user.username
                )));
            }
            if other.email == user.email {
                return Err(DomainError::Conflict(format!(
                    "email `{}` is already registered",
                    user.email
                )));
            }
        }
        Ok(())
    }

    fn check_title_refs(&self, title: &Title) -> DomainResult<()> {
        if let Some(category_id) = title.category_id {
            if !self.categories.contains_key(&category_id) {
                return Err(DomainError::not_found("category", category_id));
            }
        }
        if let Some(missing) = title.genre_ids.iter().find(|id| !self.genres.contains_key(id)) {
            return Err(DomainError::not_found("genre", missing));
        }
        Ok(())
    }

    fn remove_review(&mut self, id: Uuid) -> bool {
        if self.reviews.remove(&id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.review_id != id);
        true
    }

    fn remove_title(&mut self, id: Uuid) -> bool {
        if self.titles.remove(&id).is_none() {
            return false;
        }
        let orphaned: Vec<Uuid> = self
            .reviews
            .values()
            .filter(|r| r.title_id == id)
            .map(|r| r.id)
            .collect();
        for review_id in orphaned {
            self.remove_review(review_id);
        }
        true
    }
}

/// Volatile store used by tests, demos and the binary when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert_user(&self, user: User) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(DomainError::Conflict(format!("user {} already exists", user.id)));
        }
        tables.check_user_unique(&user)?;
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn update_user(&self, user: User) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(DomainError::not_found("user", user.id));
        }
        tables.check_user_unique(&user)?;
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, search: Option<String>) -> DomainResult<Vec<User>> {
        let needle = search.map(|s| s.to_lowercase());
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| {
                needle
                    .as_deref()
                    .is_none_or(|n| u.username.to_lowercase().contains(n))
            })
            .cloned()
            .collect())
    }

    async fn delete_user(&self, id: Uuid) -> DomainResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        let authored: Vec<Uuid> = tables
            .reviews
            .values()
            .filter(|r| r.post.is_authored_by(id))
            .map(|r| r.id)
            .collect();
        for review_id in authored {
            tables.remove_review(review_id);
        }
        tables.comments.retain(|_, c| !c.post.is_authored_by(id));
        tracing::debug!(user_id = %id, "user removed with authored content");
        Ok(true)
    }
}

#[async_trait]
impl CatalogRepo for MemoryStore {
    async fn insert_category(&self, category: Category) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.slug() == category.slug()) {
            return Err(DomainError::Conflict(format!(
                "category slug `{}` already exists",
                category.slug()
            )));
        }
        tables.categories.insert(category.id, category);
        Ok(())
    }

    async fn find_category(&self, id: Uuid) -> DomainResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn find_category_by_slug(&self, slug: &str) -> DomainResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug() == slug).cloned())
    }

    async fn list_categories(&self) -> DomainResult<Vec<Category>> {
        Ok(self.tables.read().await.categories.values().cloned().collect())
    }

    async fn delete_category(&self, id: Uuid) -> DomainResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for title in tables.titles.values_mut() {
            if title.category_id == Some(id) {
                title.category_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_genre(&self, genre: Genre) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if tables.genres.values().any(|g| g.slug() == genre.slug()) {
            return Err(DomainError::Conflict(format!(
                "genre slug `{}` already exists",
                genre.slug()
            )));
        }
        tables.genres.insert(genre.id, genre);
        Ok(())
    }

    async fn find_genre(&self, id: Uuid) -> DomainResult<Option<Genre>> {
        Ok(self.tables.read().await.genres.get(&id).cloned())
    }

    async fn find_genre_by_slug(&self, slug: &str) -> DomainResult<Option<Genre>> {
        let tables = self.tables.read().await;
        Ok(tables.genres.values().find(|g| g.slug() == slug).cloned())
    }

    async fn list_genres(&self) -> DomainResult<Vec<Genre>> {
        Ok(self.tables.read().await.genres.values().cloned().collect())
    }

    async fn delete_genre(&self, id: Uuid) -> DomainResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.genres.remove(&id).is_none() {
            return Ok(false);
        }
        for title in tables.titles.values_mut() {
            title.genre_ids.retain(|g| *g != id);
        }
        Ok(true)
    }

    async fn insert_title(&self, title: Title) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if tables.titles.contains_key(&title.id) {
            return Err(DomainError::Conflict(format!("title {} already exists", title.id)));
        }
        tables.check_title_refs(&title)?;
        tables.titles.insert(title.id, title);
        Ok(())
    }

    async fn update_title(&self, title: Title) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.titles.contains_key(&title.id) {
            return Err(DomainError::not_found("title", title.id));
        }
        tables.check_title_refs(&title)?;
        tables.titles.insert(title.id, title);
        Ok(())
    }

    async fn find_title(&self, id: Uuid) -> DomainResult<Option<Title>> {
        Ok(self.tables.read().await.titles.get(&id).cloned())
    }

    async fn list_titles(&self) -> DomainResult<Vec<Title>> {
        Ok(self.tables.read().await.titles.values().cloned().collect())
    }

    async fn delete_title(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.tables.write().await.remove_title(id))
    }
}

#[async_trait]
impl ReviewRepo for MemoryStore {
    async fn insert_review(&self, review: Review) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.titles.contains_key(&review.title_id) {
            return Err(DomainError::not_found("title", review.title_id));
        }
        if !tables.users.contains_key(&review.post.author_id) {
            return Err(DomainError::not_found("user", review.post.author_id));
        }
        let duplicate = tables.reviews.values().any(|r| {
            r.title_id == review.title_id && r.post.is_authored_by(review.post.author_id)
        });
        if duplicate {
            return Err(DomainError::DuplicateReview);
        }
        tables.reviews.insert(review.id, review);
        Ok(())
    }

    async fn update_review(&self, review: Review) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        match tables.reviews.get_mut(&review.id) {
            // Author and title are fixed at creation.
            Some(stored) => {
                stored.score = review.score;
                stored.post.text = review.post.text;
                Ok(())
            }
            None => Err(DomainError::not_found("review", review.id)),
        }
    }

    async fn find_review(&self, id: Uuid) -> DomainResult<Option<Review>> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn list_reviews(&self, title_id: Uuid) -> DomainResult<Vec<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .filter(|r| r.title_id == title_id)
            .cloned()
            .collect())
    }

    async fn delete_review(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.tables.write().await.remove_review(id))
    }

    async fn insert_comment(&self, comment: Comment) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.reviews.contains_key(&comment.review_id) {
            return Err(DomainError::not_found("review", comment.review_id));
        }
        if !tables.users.contains_key(&comment.post.author_id) {
            return Err(DomainError::not_found("user", comment.post.author_id));
        }
        tables.comments.insert(comment.id, comment);
        Ok(())
    }

    async fn update_comment(&self, comment: Comment) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        match tables.comments.get_mut(&comment.id) {
            Some(stored) => {
                stored.post.text = comment.post.text;
                Ok(())
            }
            None => Err(DomainError::not_found("comment", comment.id)),
        }
    }

    async fn find_comment(&self, id: Uuid) -> DomainResult<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn list_comments(&self, review_id: Uuid) -> DomainResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.review_id == review_id)
            .cloned()
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use domains::{NamedSlug, Role, Score, TimestampedAuthored};

    async fn user(store: &MemoryStore, name: &str) -> User {
        let user = User::new(name, &format!("{name}@yamdb.fake"), Role::User).unwrap();
        store.insert_user(user.clone()).await.unwrap();
        user
    }

    async fn genre(store: &MemoryStore, slug: &str) -> Genre {
        let genre = Genre::new(NamedSlug::new(slug, slug).unwrap());
        store.insert_genre(genre.clone()).await.unwrap();
        genre
    }

    async fn title(store: &MemoryStore, category_id: Option<Uuid>, genre_ids: Vec<Uuid>) -> Title {
        let title = Title {
            id: Uuid::now_v7(),
            name: "Stalker".into(),
            year: 1979,
            description: None,
            category_id,
            genre_ids,
        };
        store.insert_title(title.clone()).await.unwrap();
        title
    }

    fn review(title_id: Uuid, author_id: Uuid, score: i64) -> Review {
        Review::new(
            title_id,
            Score::new(score).unwrap(),
            TimestampedAuthored::new(author_id, "Worth it").unwrap(),
        )
    }

    async fn comment(store: &MemoryStore, review_id: Uuid, author_id: Uuid) -> Comment {
        let comment = Comment::new(
            review_id,
            TimestampedAuthored::new(author_id, "Agreed").unwrap(),
        );
        store.insert_comment(comment.clone()).await.unwrap();
        comment
    }

    #[tokio::test]
    async fn second_review_by_same_author_is_rejected() {
        let store = MemoryStore::new();
        let author = user(&store, "critic").await;
        let drama = genre(&store, "drama").await;
        let work = title(&store, None, vec![drama.id]).await;

        store.insert_review(review(work.id, author.id, 7)).await.unwrap();
        assert_eq!(
            store.insert_review(review(work.id, author.id, 3)).await,
            Err(DomainError::DuplicateReview)
        );
        assert_eq!(store.list_reviews(work.id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reviews_for_one_pair_have_a_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let author = user(&store, "critic").await;
        let drama = genre(&store, "drama").await;
        let work = title(&store, None, vec![drama.id]).await;

        let (title_id, author_id) = (work.id, author.id);
        let handles: Vec<_> = (1..=8)
            .map(|score| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.insert_review(review(title_id, author_id, score)).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(e) => assert_eq!(e, DomainError::DuplicateReview),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.list_reviews(work.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn review_needs_existing_title_and_author() {
        let store = MemoryStore::new();
        let author = user(&store, "critic").await;
        let ghost_title = Uuid::now_v7();
        assert_eq!(
            store.insert_review(review(ghost_title, author.id, 5)).await,
            Err(DomainError::not_found("title", ghost_title))
        );

        let drama = genre(&store, "drama").await;
        let work = title(&store, None, vec![drama.id]).await;
        let ghost_author = Uuid::now_v7();
        assert_eq!(
            store.insert_review(review(work.id, ghost_author, 5)).await,
            Err(DomainError::not_found("user", ghost_author))
        );
    }

    #[tokio::test]
    async fn deleting_a_title_removes_reviews_and_comments() {
        let store = MemoryStore::new();
        let author = user(&store, "critic").await;
        let reader = user(&store, "reader").await;
        let drama = genre(&store, "drama").await;
        let work = title(&store, None, vec![drama.id]).await;
        let kept = title(&store, None, vec![drama.id]).await;

        let doomed = review(work.id, author.id, 9);
        store.insert_review(doomed.clone()).await.unwrap();
        let survivor = review(kept.id, author.id, 4);
        store.insert_review(survivor.clone()).await.unwrap();
        let orphan = comment(&store, doomed.id, reader.id).await;
        let other = comment(&store, survivor.id, reader.id).await;

        assert!(store.delete_title(work.id).await.unwrap());
        assert!(store.find_review(doomed.id).await.unwrap().is_none());
        assert!(store.find_comment(orphan.id).await.unwrap().is_none());
        assert!(store.find_review(survivor.id).await.unwrap().is_some());
        assert!(store.find_comment(other.id).await.unwrap().is_some());
        assert!(!store.delete_title(work.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_content_only() {
        let store = MemoryStore::new();
        let author = user(&store, "critic").await;
        let reader = user(&store, "reader").await;
        let drama = genre(&store, "drama").await;
        let work = title(&store, None, vec![drama.id]).await;

        let theirs = review(work.id, author.id, 8);
        store.insert_review(theirs.clone()).await.unwrap();
        let mine = review(work.id, reader.id, 2);
        store.insert_review(mine.clone()).await.unwrap();
        let under_theirs = comment(&store, theirs.id, reader.id).await;
        let by_them = comment(&store, mine.id, author.id).await;
        let under_mine = comment(&store, mine.id, reader.id).await;

        assert!(store.delete_user(author.id).await.unwrap());
        assert!(store.find_review(theirs.id).await.unwrap().is_none());
        assert!(store.find_comment(under_theirs.id).await.unwrap().is_none());
        assert!(store.find_comment(by_them.id).await.unwrap().is_none());
        assert!(store.find_review(mine.id).await.unwrap().is_some());
        assert!(store.find_comment(under_mine.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_a_category_detaches_titles() {
        let store = MemoryStore::new();
        let films = Category::new(NamedSlug::new("Films", "films").unwrap());
        store.insert_category(films.clone()).await.unwrap();
        let drama = genre(&store, "drama").await;
        let work = title(&store, Some(films.id), vec![drama.id]).await;

        assert!(store.delete_category(films.id).await.unwrap());
        let stored = store.find_title(work.id).await.unwrap().unwrap();
        assert_eq!(stored.category_id, None);
    }

    #[tokio::test]
    async fn deleting_a_genre_only_drops_associations() {
        let store = MemoryStore::new();
        let drama = genre(&store, "drama").await;
        let crime = genre(&store, "crime").await;
        let work = title(&store, None, vec![drama.id, crime.id]).await;

        assert!(store.delete_genre(crime.id).await.unwrap());
        let stored = store.find_title(work.id).await.unwrap().unwrap();
        assert_eq!(stored.genre_ids, vec![drama.id]);
    }

    #[tokio::test]
    async fn slugs_usernames_and_emails_are_unique() {
        let store = MemoryStore::new();
        genre(&store, "drama").await;
        let clash = Genre::new(NamedSlug::new("Drama again", "drama").unwrap());
        assert!(matches!(
            store.insert_genre(clash).await,
            Err(DomainError::Conflict(_))
        ));

        user(&store, "critic").await;
        let same_name = User::new("critic", "other@yamdb.fake", Role::User).unwrap();
        assert!(matches!(
            store.insert_user(same_name).await,
            Err(DomainError::Conflict(_))
        ));
        let same_email = User::new("other", "critic@yamdb.fake", Role::User).unwrap();
        assert!(matches!(
            store.insert_user(same_email).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn title_with_unknown_genre_is_not_stored() {
        let store = MemoryStore::new();
        let ghost = Uuid::now_v7();
        let work = Title {
            id: Uuid::now_v7(),
            name: "Nowhere".into(),
            year: 2000,
            description: None,
            category_id: None,
            genre_ids: vec![ghost],
        };
        assert_eq!(
            store.insert_title(work).await,
            Err(DomainError::not_found("genre", ghost))
        );
        assert!(store.list_titles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn user_search_is_case_insensitive() {
        let store = MemoryStore::new();
        user(&store, "BingoBongo").await;
        user(&store, "capt_obvious").await;

        let found = store.list_users(Some("bingo".into())).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "BingoBongo");
        assert_eq!(store.list_users(None).await.unwrap().len(), 2);
    }
}
