//! # Ports
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Store implementations own the referential contract: cascades and
//! uniqueness are enforced inside a single atomic write, never by callers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::DomainResult;
use crate::models::{Category, Comment, Genre, Review, Title, User};

/// Persistence contract for accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn insert_user(&self, user: User) -> DomainResult<()>;
    /// Replaces the stored row. `NotFound` if absent, `Conflict` on a taken username/email.
    async fn update_user(&self, user: User) -> DomainResult<()>;
    async fn find_user(&self, id: Uuid) -> DomainResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    /// Optional case-insensitive username substring filter.
    async fn list_users(&self, search: Option<String>) -> DomainResult<Vec<User>>;
    /// Removes the user with their reviews (and those reviews' comments) and comments.
    async fn delete_user(&self, id: Uuid) -> DomainResult<bool>;
}

/// Persistence contract for categories, genres and titles.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn insert_category(&self, category: Category) -> DomainResult<()>;
    async fn find_category(&self, id: Uuid) -> DomainResult<Option<Category>>;
    async fn find_category_by_slug(&self, slug: &str) -> DomainResult<Option<Category>>;
    async fn list_categories(&self) -> DomainResult<Vec<Category>>;
    /// Referencing titles keep existing with `category_id = None`.
    async fn delete_category(&self, id: Uuid) -> DomainResult<bool>;

    async fn insert_genre(&self, genre: Genre) -> DomainResult<()>;
    async fn find_genre(&self, id: Uuid) -> DomainResult<Option<Genre>>;
    async fn find_genre_by_slug(&self, slug: &str) -> DomainResult<Option<Genre>>;
    async fn list_genres(&self) -> DomainResult<Vec<Genre>>;
    /// Only the title/genre associations go away.
    async fn delete_genre(&self, id: Uuid) -> DomainResult<bool>;

    /// `NotFound` when the category or a genre does not exist.
    async fn insert_title(&self, title: Title) -> DomainResult<()>;
    async fn update_title(&self, title: Title) -> DomainResult<()>;
    async fn find_title(&self, id: Uuid) -> DomainResult<Option<Title>>;
    async fn list_titles(&self) -> DomainResult<Vec<Title>>;
    /// Cascades to the title's reviews and their comments.
    async fn delete_title(&self, id: Uuid) -> DomainResult<bool>;
}

/// Persistence contract for reviews and comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewRepo: Send + Sync {
    /// `DuplicateReview` when the (author, title) pair already has a review.
    async fn insert_review(&self, review: Review) -> DomainResult<()>;
    async fn update_review(&self, review: Review) -> DomainResult<()>;
    async fn find_review(&self, id: Uuid) -> DomainResult<Option<Review>>;
    async fn list_reviews(&self, title_id: Uuid) -> DomainResult<Vec<Review>>;
    /// Cascades to the review's comments.
    async fn delete_review(&self, id: Uuid) -> DomainResult<bool>;

    async fn insert_comment(&self, comment: Comment) -> DomainResult<()>;
    async fn update_comment(&self, comment: Comment) -> DomainResult<()>;
    async fn find_comment(&self, id: Uuid) -> DomainResult<Option<Comment>>;
    async fn list_comments(&self, review_id: Uuid) -> DomainResult<Vec<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> DomainResult<bool>;
}

/// Produces fresh confirmation codes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// One-way hashing for secrets kept at rest (confirmation codes).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SecretHasher: Send + Sync {
    fn hash(&self, secret: &str) -> DomainResult<String>;
    fn verify(&self, secret: &str, hash: &str) -> bool;
}

/// Issues and checks the bearer tokens handed out after confirmation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenService: Send + Sync {
    fn issue(&self, user: &User) -> DomainResult<String>;
    /// Returns the id of the user the token was issued for.
    fn verify(&self, token: &str) -> DomainResult<Uuid>;
}

/// Out-of-band delivery of a confirmation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationMessage {
    pub to: String,
    pub username: String,
    pub code: String,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation_code(&self, message: ConfirmationMessage) -> DomainResult<()>;
}
