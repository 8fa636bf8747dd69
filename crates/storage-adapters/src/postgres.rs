//! # Postgres Entity Store
//!
//! Maps the relational schema in `migrations/` onto the `domains` models.
//! Cascades and the one-review-per-author rule are enforced by foreign keys
//! and unique constraints; constraint violations are translated back into
//! domain errors by constraint name.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    CatalogRepo, Category, Comment, DomainError, DomainResult, Genre, NamedSlug, Review,
    ReviewRepo, Score, TimestampedAuthored, Title, User, UserRepo,
};
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

const TITLE_SELECT: &str = "SELECT t.id, t.name, t.year, t.description, t.category_id, \
     ARRAY(SELECT tg.genre_id FROM title_genres tg WHERE tg.title_id = t.id ORDER BY tg.position) AS genre_ids \
     FROM titles t";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(store_error)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations.
    pub async fn migrate(&self) -> DomainResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(format!("migration failed: {e}")))?;
        tracing::info!("database schema up to date");
        Ok(())
    }
}

// ── Error translation ───────────────────────────────────────────────────────

fn store_error(err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "database error");
    DomainError::Internal(err.to_string())
}

fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    let db = err.as_database_error()?;
    match db.kind() {
        ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation => db.constraint(),
        _ => None,
    }
}

/// Lets the caller name the constraints it expects; anything else is internal.
fn map_violation(
    err: sqlx::Error,
    classify: impl FnOnce(&str) -> Option<DomainError>,
) -> DomainError {
    let mapped = violated_constraint(&err).and_then(classify);
    mapped.unwrap_or_else(|| store_error(err))
}

// ── Row records ─────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    role: String,
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    status: String,
    confirmation_code_hash: Option<String>,
}

impl UserRecord {
    fn into_user(self) -> DomainResult<User> {
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role.parse()?,
            bio: self.bio,
            first_name: self.first_name,
            last_name: self.last_name,
            status: self.status.parse()?,
            confirmation_code_hash: self.confirmation_code_hash,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LabelRecord {
    id: Uuid,
    name: String,
    slug: String,
}

impl LabelRecord {
    fn label(self) -> (Uuid, NamedSlug) {
        (
            self.id,
            NamedSlug {
                name: self.name,
                slug: self.slug,
            },
        )
    }

    fn into_category(self) -> Category {
        let (id, label) = self.label();
        Category { id, label }
    }

    fn into_genre(self) -> Genre {
        let (id, label) = self.label();
        Genre { id, label }
    }
}

#[derive(sqlx::FromRow)]
struct TitleRecord {
    id: Uuid,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<Uuid>,
    genre_ids: Vec<Uuid>,
}

impl From<TitleRecord> for Title {
    fn from(r: TitleRecord) -> Self {
        Title {
            id: r.id,
            name: r.name,
            year: r.year,
            description: r.description,
            category_id: r.category_id,
            genre_ids: r.genre_ids,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRecord {
    id: Uuid,
    title_id: Uuid,
    author_id: Uuid,
    text: String,
    score: i16,
    pub_date: DateTime<Utc>,
}

impl ReviewRecord {
    fn into_review(self) -> DomainResult<Review> {
        Ok(Review {
            id: self.id,
            title_id: self.title_id,
            score: Score::new(i64::from(self.score))?,
            post: TimestampedAuthored {
                author_id: self.author_id,
                text: self.text,
                pub_date: self.pub_date,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct CommentRecord {
    id: Uuid,
    review_id: Uuid,
    author_id: Uuid,
    text: String,
    pub_date: DateTime<Utc>,
}

impl From<CommentRecord> for Comment {
    fn from(r: CommentRecord) -> Self {
        Comment {
            id: r.id,
            review_id: r.review_id,
            post: TimestampedAuthored {
                author_id: r.author_id,
                text: r.text,
                pub_date: r.pub_date,
            },
        }
    }
}

fn user_conflict(user: &User) -> impl FnOnce(&str) -> Option<DomainError> + '_ {
    move |constraint| match constraint {
        "users_username_unique" => Some(DomainError::Conflict(format!(
            "username `{}` is already taken",
            user.username
        ))),
        "users_email_unique" => Some(DomainError::Conflict(format!(
            "email `{}` is already registered",
            user.email
        ))),
        _ => None,
    }
}

// ── Users ───────────────────────────────────────────────────────────────────

#[async_trait]
impl UserRepo for PgStore {
    async fn insert_user(&self, user: User) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, role, bio, first_name, last_name, status, confirmation_code_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.status.as_str())
        .bind(&user.confirmation_code_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_violation(e, user_conflict(&user)))?;
        Ok(())
    }

    async fn update_user(&self, user: User) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, email = $3, role = $4, bio = $5, first_name = $6, \
             last_name = $7, status = $8, confirmation_code_hash = $9 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.status.as_str())
        .bind(&user.confirmation_code_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_violation(e, user_conflict(&user)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("user", user.id));
        }
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(UserRecord::into_user)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(UserRecord::into_user)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(UserRecord::into_user)
            .transpose()
    }

    async fn list_users(&self, search: Option<String>) -> DomainResult<Vec<User>> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users \
             WHERE $1::TEXT IS NULL OR strpos(lower(username), lower($1)) > 0 \
             ORDER BY id",
        )
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?
        .into_iter()
        .map(UserRecord::into_user)
        .collect()
    }

    async fn delete_user(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// ── Catalog ─────────────────────────────────────────────────────────────────

impl PgStore {
    /// Rewrites the genre links of a title inside an open transaction.
    async fn write_title_genres(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        title: &Title,
    ) -> DomainResult<()> {
        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(title.id)
            .execute(&mut **tx)
            .await
            .map_err(store_error)?;

        for (position, genre_id) in title.genre_ids.iter().enumerate() {
            sqlx::query("INSERT INTO title_genres (title_id, genre_id, position) VALUES ($1, $2, $3)")
                .bind(title.id)
                .bind(genre_id)
                .bind(position as i32)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    map_violation(e, |c| {
                        (c == "title_genres_genre_fk")
                            .then(|| DomainError::not_found("genre", genre_id))
                    })
                })?;
        }
        Ok(())
    }
}

fn slug_conflict<'a>(entity: &'static str, slug: &'a str) -> impl FnOnce(&str) -> Option<DomainError> + 'a {
    move |constraint| {
        constraint.ends_with("_slug_unique").then(|| {
            DomainError::Conflict(format!("{entity} slug `{slug}` already exists"))
        })
    }
}

fn category_missing(title: &Title) -> impl FnOnce(&str) -> Option<DomainError> + '_ {
    move |constraint| {
        (constraint == "titles_category_fk").then(|| {
            DomainError::not_found("category", title.category_id.unwrap_or_default())
        })
    }
}

#[async_trait]
impl CatalogRepo for PgStore {
    async fn insert_category(&self, category: Category) -> DomainResult<()> {
        sqlx::query("INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3)")
            .bind(category.id)
            .bind(&category.label.name)
            .bind(&category.label.slug)
            .execute(&self.pool)
            .await
            .map_err(|e| map_violation(e, slug_conflict("category", category.slug())))?;
        Ok(())
    }

    async fn find_category(&self, id: Uuid) -> DomainResult<Option<Category>> {
        let record = sqlx::query_as::<_, LabelRecord>("SELECT id, name, slug FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(record.map(LabelRecord::into_category))
    }

    async fn find_category_by_slug(&self, slug: &str) -> DomainResult<Option<Category>> {
        let record = sqlx::query_as::<_, LabelRecord>("SELECT id, name, slug FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(record.map(LabelRecord::into_category))
    }

    async fn list_categories(&self) -> DomainResult<Vec<Category>> {
        let records = sqlx::query_as::<_, LabelRecord>("SELECT id, name, slug FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(records.into_iter().map(LabelRecord::into_category).collect())
    }

    async fn delete_category(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_genre(&self, genre: Genre) -> DomainResult<()> {
        sqlx::query("INSERT INTO genres (id, name, slug) VALUES ($1, $2, $3)")
            .bind(genre.id)
            .bind(&genre.label.name)
            .bind(&genre.label.slug)
            .execute(&self.pool)
            .await
            .map_err(|e| map_violation(e, slug_conflict("genre", genre.slug())))?;
        Ok(())
    }

    async fn find_genre(&self, id: Uuid) -> DomainResult<Option<Genre>> {
        let record = sqlx::query_as::<_, LabelRecord>("SELECT id, name, slug FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(record.map(LabelRecord::into_genre))
    }

    async fn find_genre_by_slug(&self, slug: &str) -> DomainResult<Option<Genre>> {
        let record = sqlx::query_as::<_, LabelRecord>("SELECT id, name, slug FROM genres WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(record.map(LabelRecord::into_genre))
    }

    async fn list_genres(&self) -> DomainResult<Vec<Genre>> {
        let records = sqlx::query_as::<_, LabelRecord>("SELECT id, name, slug FROM genres ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(records.into_iter().map(LabelRecord::into_genre).collect())
    }

    async fn delete_genre(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    /// Title row and genre links are written in one transaction.
    async fn insert_title(&self, title: Title) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        // 1. Insert the title
        sqlx::query(
            "INSERT INTO titles (id, name, year, description, category_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(title.id)
        .bind(&title.name)
        .bind(title.year)
        .bind(&title.description)
        .bind(title.category_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_violation(e, category_missing(&title)))?;

        // 2. Link its genres
        Self::write_title_genres(&mut tx, &title).await?;

        tx.commit().await.map_err(store_error)?;
        Ok(())
    }

    async fn update_title(&self, title: Title) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let result = sqlx::query(
            "UPDATE titles SET name = $2, year = $3, description = $4, category_id = $5 WHERE id = $1",
        )
        .bind(title.id)
        .bind(&title.name)
        .bind(title.year)
        .bind(&title.description)
        .bind(title.category_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_violation(e, category_missing(&title)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("title", title.id));
        }

        Self::write_title_genres(&mut tx, &title).await?;
        tx.commit().await.map_err(store_error)?;
        Ok(())
    }

    async fn find_title(&self, id: Uuid) -> DomainResult<Option<Title>> {
        let record = sqlx::query_as::<_, TitleRecord>(&format!("{TITLE_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(record.map(Title::from))
    }

    async fn list_titles(&self) -> DomainResult<Vec<Title>> {
        let records = sqlx::query_as::<_, TitleRecord>(&format!("{TITLE_SELECT} ORDER BY t.id"))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(records.into_iter().map(Title::from).collect())
    }

    async fn delete_title(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// ── Reviews & comments ──────────────────────────────────────────────────────

#[async_trait]
impl ReviewRepo for PgStore {
    async fn insert_review(&self, review: Review) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO reviews (id, title_id, author_id, text, score, pub_date) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(review.id)
        .bind(review.title_id)
        .bind(review.post.author_id)
        .bind(&review.post.text)
        .bind(i16::from(review.score.value()))
        .bind(review.post.pub_date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_violation(e, |c| match c {
                "reviews_one_per_author" => Some(DomainError::DuplicateReview),
                "reviews_title_fk" => Some(DomainError::not_found("title", review.title_id)),
                "reviews_author_fk" => Some(DomainError::not_found("user", review.post.author_id)),
                _ => None,
            })
        })?;
        Ok(())
    }

    async fn update_review(&self, review: Review) -> DomainResult<()> {
        let result = sqlx::query("UPDATE reviews SET text = $2, score = $3 WHERE id = $1")
            .bind(review.id)
            .bind(&review.post.text)
            .bind(i16::from(review.score.value()))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("review", review.id));
        }
        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> DomainResult<Option<Review>> {
        sqlx::query_as::<_, ReviewRecord>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(ReviewRecord::into_review)
            .transpose()
    }

    async fn list_reviews(&self, title_id: Uuid) -> DomainResult<Vec<Review>> {
        sqlx::query_as::<_, ReviewRecord>("SELECT * FROM reviews WHERE title_id = $1 ORDER BY id")
            .bind(title_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(ReviewRecord::into_review)
            .collect()
    }

    async fn delete_review(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, comment: Comment) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO comments (id, review_id, author_id, text, pub_date) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id)
        .bind(comment.review_id)
        .bind(comment.post.author_id)
        .bind(&comment.post.text)
        .bind(comment.post.pub_date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_violation(e, |c| match c {
                "comments_review_fk" => Some(DomainError::not_found("review", comment.review_id)),
                "comments_author_fk" => Some(DomainError::not_found("user", comment.post.author_id)),
                _ => None,
            })
        })?;
        Ok(())
    }

    async fn update_comment(&self, comment: Comment) -> DomainResult<()> {
        let result = sqlx::query("UPDATE comments SET text = $2 WHERE id = $1")
            .bind(comment.id)
            .bind(&comment.post.text)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("comment", comment.id));
        }
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> DomainResult<Option<Comment>> {
        let record = sqlx::query_as::<_, CommentRecord>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(record.map(Comment::from))
    }

    async fn list_comments(&self, review_id: Uuid) -> DomainResult<Vec<Comment>> {
        let records = sqlx::query_as::<_, CommentRecord>(
            "SELECT * FROM comments WHERE review_id = $1 ORDER BY id",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(records.into_iter().map(Comment::from).collect())
    }

    async fn delete_comment(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }
}
