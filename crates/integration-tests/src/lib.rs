//! # integration-tests
//!
//! Shared fixtures: a `World` wires the real services to one `MemoryStore`,
//! real auth adapters and an in-memory outbox that captures confirmation mail.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auth_adapters::{Argon2SecretHasher, JwtTokenService, UuidCodeGenerator};
use domains::{
    CatalogRepo, Category, Comment, ConfirmationMessage, DomainResult, Genre, Mailer, NamedSlug,
    Review, ReviewRepo, Role, Score, SecretHasher, TimestampedAuthored, Title, TokenService, User,
    UserRepo,
};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use services::{AccountService, CatalogService, ImportService, RatingAggregator, ReviewService};
use storage_adapters::MemoryStore;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-secret";

/// Mailer double that keeps every message.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: Mutex<Vec<ConfirmationMessage>>,
}

impl Outbox {
    pub fn last_code_for(&self, username: &str) -> Option<String> {
        let sent = self.sent.lock().expect("outbox lock poisoned");
        sent.iter()
            .rev()
            .find(|m| m.username == username)
            .map(|m| m.code.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().expect("outbox lock poisoned").len()
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send_confirmation_code(&self, message: ConfirmationMessage) -> DomainResult<()> {
        self.sent
            .lock()
            .expect("outbox lock poisoned")
            .push(message);
        Ok(())
    }
}

pub fn hasher() -> Arc<dyn SecretHasher> {
    Arc::new(Argon2SecretHasher::with_cost(8, 1).expect("valid argon2 params"))
}

pub fn tokens() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(JWT_SECRET, chrono::Duration::hours(1)))
}

/// Some review or comment body.
pub fn text() -> String {
    Sentence(3..8).fake()
}

pub struct World {
    pub store: Arc<MemoryStore>,
    pub outbox: Arc<Outbox>,
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub reviews: ReviewService,
    pub rating: Arc<RatingAggregator>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        let outbox = Arc::new(Outbox::default());
        let store = Arc::new(MemoryStore::new());
        let rating = Arc::new(RatingAggregator::new(store.clone()));
        Self {
            accounts: AccountService::new(
                store.clone(),
                Arc::new(UuidCodeGenerator),
                hasher(),
                tokens(),
                outbox.clone(),
            ),
            catalog: CatalogService::new(store.clone(), Arc::clone(&rating)),
            reviews: ReviewService::new(store.clone(), store.clone()),
            rating,
            outbox,
            store,
        }
    }

    pub fn importer(&self) -> ImportService {
        ImportService::new(self.store.clone(), self.store.clone(), self.store.clone())
    }

    // ── Direct seeding through the store ────────────────────────────────────

    pub async fn user(&self, username: &str, role: Role) -> User {
        let user = User::new(username, &format!("{username}@yamdb.fake"), role)
            .expect("valid fixture user");
        self.store
            .insert_user(user.clone())
            .await
            .expect("fixture user stored");
        user
    }

    pub async fn category(&self, slug: &str) -> Category {
        let category = Category::new(NamedSlug::new(slug.to_uppercase(), slug).expect("valid slug"));
        self.store
            .insert_category(category.clone())
            .await
            .expect("fixture category stored");
        category
    }

    pub async fn genre(&self, slug: &str) -> Genre {
        let genre = Genre::new(NamedSlug::new(slug.to_uppercase(), slug).expect("valid slug"));
        self.store
            .insert_genre(genre.clone())
            .await
            .expect("fixture genre stored");
        genre
    }

    pub async fn title(&self, name: &str, genres: &[&Genre], category: Option<&Category>) -> Title {
        let title = Title {
            id: Uuid::now_v7(),
            name: name.to_string(),
            year: 1979,
            description: None,
            category_id: category.map(|c| c.id),
            genre_ids: genres.iter().map(|g| g.id).collect(),
        };
        self.store
            .insert_title(title.clone())
            .await
            .expect("fixture title stored");
        title
    }

    pub async fn review(&self, author: &User, title: &Title, score: i64) -> Review {
        let review = Review::new(
            title.id,
            Score::new(score).expect("valid fixture score"),
            TimestampedAuthored::new(author.id, text()).expect("valid body"),
        );
        self.store
            .insert_review(review.clone())
            .await
            .expect("fixture review stored");
        review
    }

    pub async fn comment(&self, author: &User, review: &Review) -> Comment {
        let comment = Comment::new(
            review.id,
            TimestampedAuthored::new(author.id, text()).expect("valid body"),
        );
        self.store
            .insert_comment(comment.clone())
            .await
            .expect("fixture comment stored");
        comment
    }

    /// Runs the real confirmation flow for an existing account.
    pub async fn token_for(&self, user: &User) -> String {
        self.accounts
            .sign_up(&user.username, &user.email)
            .await
            .expect("sign-up for fixture user");
        let code = self
            .outbox
            .last_code_for(&user.username)
            .expect("confirmation code delivered");
        self.accounts
            .obtain_token(&user.username, &code)
            .await
            .expect("token issued")
    }
}

#[cfg(feature = "web-axum")]
pub mod http {
    //! Request helpers over the axum router.

    use std::sync::Arc;

    use api_adapters::{router, AppState, AuthPorts};
    use auth_adapters::UuidCodeGenerator;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::{hasher, tokens, World};

    impl World {
        /// Router over the same store and outbox as the services.
        pub fn router(&self) -> Router {
            let state = AppState::new(
                self.store.clone(),
                self.store.clone(),
                self.store.clone(),
                AuthPorts {
                    codes: Arc::new(UuidCodeGenerator),
                    hasher: hasher(),
                    tokens: tokens(),
                    mailer: self.outbox.clone(),
                },
            );
            router(state)
        }
    }

    /// Sends one request and decodes the JSON body (`Null` when empty).
    pub async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = app.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, json)
    }
}
