//! # Review Service
//!
//! Consistency guard for reviews and their comments: scores stay in range,
//! one review per (author, title), and only the author or staff may change
//! or remove a post. Reads are open to everyone, anonymous callers included.

use std::sync::Arc;

use domains::{
    authorize, Action, Actor, CatalogRepo, Comment, DomainError, DomainResult, Resource, Review,
    ReviewRepo, Score, TimestampedAuthored,
};
use serde::Deserialize;
use uuid::Uuid;

/// Create/update payload for a review. Both fields are required on create.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentDraft {
    #[serde(default)]
    pub text: Option<String>,
}

pub struct ReviewService {
    catalog: Arc<dyn CatalogRepo>,
    reviews: Arc<dyn ReviewRepo>,
}

impl ReviewService {
    pub fn new(catalog: Arc<dyn CatalogRepo>, reviews: Arc<dyn ReviewRepo>) -> Self {
        Self { catalog, reviews }
    }

    async fn ensure_title(&self, title_id: Uuid) -> DomainResult<()> {
        match self.catalog.find_title(title_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("title", title_id)),
        }
    }

    // ── Reviews ─────────────────────────────────────────────────────────────

    pub async fn list_reviews(&self, title_id: Uuid) -> DomainResult<Vec<Review>> {
        self.ensure_title(title_id).await?;
        self.reviews.list_reviews(title_id).await
    }

    /// A review is only visible under the title it belongs to.
    pub async fn get_review(&self, title_id: Uuid, review_id: Uuid) -> DomainResult<Review> {
        match self.reviews.find_review(review_id).await? {
            Some(review) if review.title_id == title_id => Ok(review),
            _ => Err(DomainError::not_found("review", review_id)),
        }
    }

    #[tracing::instrument(skip(self, draft), fields(actor = ?actor.map(|a| a.id)))]
    pub async fn create_review(
        &self,
        actor: Option<&Actor>,
        title_id: Uuid,
        draft: ReviewDraft,
    ) -> DomainResult<Review> {
        authorize(actor, Action::Create, &Resource::Review { author: None })?;
        let actor = actor.ok_or(DomainError::Unauthenticated)?;

        let score = draft
            .score
            .ok_or_else(|| DomainError::Validation("score is required".into()))
            .and_then(Score::new)?;
        let text = draft
            .text
            .ok_or_else(|| DomainError::Validation("text is required".into()))?;
        let post = TimestampedAuthored::new(actor.id, text)?;

        self.ensure_title(title_id).await?;

        let review = Review::new(title_id, score, post);
        match self.reviews.insert_review(review.clone()).await {
            Ok(()) => {
                tracing::info!(review_id = %review.id, %title_id, score = score.value(), "review created");
                Ok(review)
            }
            Err(DomainError::DuplicateReview) => {
                tracing::debug!(%title_id, "duplicate review rejected");
                Err(DomainError::DuplicateReview)
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, draft), fields(actor = ?actor.map(|a| a.id)))]
    pub async fn update_review(
        &self,
        actor: Option<&Actor>,
        title_id: Uuid,
        review_id: Uuid,
        draft: ReviewDraft,
    ) -> DomainResult<Review> {
        let mut review = self.get_review(title_id, review_id).await?;
        authorize(
            actor,
            Action::Update,
            &Resource::Review {
                author: Some(review.post.author_id),
            },
        )?;

        if let Some(score) = draft.score {
            review.score = Score::new(score)?;
        }
        if let Some(text) = draft.text {
            domains::validation::validate_text(&text)?;
            review.post.text = text;
        }

        self.reviews.update_review(review.clone()).await?;
        Ok(review)
    }

    #[tracing::instrument(skip(self), fields(actor = ?actor.map(|a| a.id)))]
    pub async fn delete_review(
        &self,
        actor: Option<&Actor>,
        title_id: Uuid,
        review_id: Uuid,
    ) -> DomainResult<()> {
        let review = self.get_review(title_id, review_id).await?;
        authorize(
            actor,
            Action::Delete,
            &Resource::Review {
                author: Some(review.post.author_id),
            },
        )?;

        if !self.reviews.delete_review(review.id).await? {
            return Err(DomainError::not_found("review", review_id));
        }
        tracing::info!(%review_id, "review deleted");
        Ok(())
    }

    // ── Comments ────────────────────────────────────────────────────────────

    pub async fn list_comments(&self, title_id: Uuid, review_id: Uuid) -> DomainResult<Vec<Comment>> {
        let review = self.get_review(title_id, review_id).await?;
        self.reviews.list_comments(review.id).await
    }

    pub async fn get_comment(
        &self,
        title_id: Uuid,
        review_id: Uuid,
        comment_id: Uuid,
    ) -> DomainResult<Comment> {
        let review = self.get_review(title_id, review_id).await?;
        match self.reviews.find_comment(comment_id).await? {
            Some(comment) if comment.review_id == review.id => Ok(comment),
            _ => Err(DomainError::not_found("comment", comment_id)),
        }
    }

    #[tracing::instrument(skip(self, draft), fields(actor = ?actor.map(|a| a.id)))]
    pub async fn create_comment(
        &self,
        actor: Option<&Actor>,
        title_id: Uuid,
        review_id: Uuid,
        draft: CommentDraft,
    ) -> DomainResult<Comment> {
        authorize(actor, Action::Create, &Resource::Comment { author: None })?;
        let actor = actor.ok_or(DomainError::Unauthenticated)?;

        let text = draft
            .text
            .ok_or_else(|| DomainError::Validation("text is required".into()))?;
        let post = TimestampedAuthored::new(actor.id, text)?;
        let review = self.get_review(title_id, review_id).await?;

        let comment = Comment::new(review.id, post);
        self.reviews.insert_comment(comment.clone()).await?;
        tracing::info!(comment_id = %comment.id, %review_id, "comment created");
        Ok(comment)
    }

    #[tracing::instrument(skip(self, draft), fields(actor = ?actor.map(|a| a.id)))]
    pub async fn update_comment(
        &self,
        actor: Option<&Actor>,
        title_id: Uuid,
        review_id: Uuid,
        comment_id: Uuid,
        draft: CommentDraft,
    ) -> DomainResult<Comment> {
        let mut comment = self.get_comment(title_id, review_id, comment_id).await?;
        authorize(
            actor,
            Action::Update,
            &Resource::Comment {
                author: Some(comment.post.author_id),
            },
        )?;

        if let Some(text) = draft.text {
            domains::validation::validate_text(&text)?;
            comment.post.text = text;
        }
        self.reviews.update_comment(comment.clone()).await?;
        Ok(comment)
    }

    #[tracing::instrument(skip(self), fields(actor = ?actor.map(|a| a.id)))]
    pub async fn delete_comment(
        &self,
        actor: Option<&Actor>,
        title_id: Uuid,
        review_id: Uuid,
        comment_id: Uuid,
    ) -> DomainResult<()> {
        let comment = self.get_comment(title_id, review_id, comment_id).await?;
        authorize(
            actor,
            Action::Delete,
            &Resource::Comment {
                author: Some(comment.post.author_id),
            },
        )?;

        if !self.reviews.delete_comment(comment.id).await? {
            return Err(DomainError::not_found("comment", comment_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockCatalogRepo, MockReviewRepo, Role, Title};

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::now_v7(),
            role,
        }
    }

    fn title(id: Uuid) -> Title {
        Title {
            id,
            name: "Dune".into(),
            year: 1965,
            description: None,
            category_id: None,
            genre_ids: vec![Uuid::now_v7()],
        }
    }

    fn catalog_with_title(id: Uuid) -> MockCatalogRepo {
        let mut catalog = MockCatalogRepo::new();
        catalog
            .expect_find_title()
            .returning(move |tid| Ok((tid == id).then(|| title(id))));
        catalog
    }

    fn draft(score: i64) -> ReviewDraft {
        ReviewDraft {
            text: Some("Worth reading".into()),
            score: Some(score),
        }
    }

    #[tokio::test]
    async fn out_of_range_scores_never_reach_the_store() {
        let title_id = Uuid::now_v7();
        let mut reviews = MockReviewRepo::new();
        reviews.expect_insert_review().never();
        let service = ReviewService::new(Arc::new(catalog_with_title(title_id)), Arc::new(reviews));
        let author = actor(Role::User);

        for score in [0, 11, -3] {
            let err = service
                .create_review(Some(&author), title_id, draft(score))
                .await
                .unwrap_err();
            assert_eq!(err, DomainError::InvalidScore(score));
        }
    }

    #[tokio::test]
    async fn boundary_scores_are_accepted() {
        let title_id = Uuid::now_v7();
        let mut reviews = MockReviewRepo::new();
        reviews.expect_insert_review().times(2).returning(|_| Ok(()));
        let service = ReviewService::new(Arc::new(catalog_with_title(title_id)), Arc::new(reviews));

        for score in [1, 10] {
            let review = service
                .create_review(Some(&actor(Role::User)), title_id, draft(score))
                .await
                .unwrap();
            assert_eq!(i64::from(review.score), score);
        }
    }

    #[tokio::test]
    async fn duplicate_from_store_is_surfaced() {
        let title_id = Uuid::now_v7();
        let mut reviews = MockReviewRepo::new();
        reviews
            .expect_insert_review()
            .returning(|_| Err(DomainError::DuplicateReview));
        let service = ReviewService::new(Arc::new(catalog_with_title(title_id)), Arc::new(reviews));

        let err = service
            .create_review(Some(&actor(Role::User)), title_id, draft(5))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateReview);
    }

    #[tokio::test]
    async fn anonymous_cannot_review() {
        let title_id = Uuid::now_v7();
        let service = ReviewService::new(
            Arc::new(catalog_with_title(title_id)),
            Arc::new(MockReviewRepo::new()),
        );
        let err = service.create_review(None, title_id, draft(5)).await.unwrap_err();
        assert_eq!(err, DomainError::Unauthenticated);
    }

    #[tokio::test]
    async fn unknown_title_is_not_found() {
        let service = ReviewService::new(
            Arc::new(catalog_with_title(Uuid::now_v7())),
            Arc::new(MockReviewRepo::new()),
        );
        let err = service
            .create_review(Some(&actor(Role::User)), Uuid::now_v7(), draft(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "title", .. }));
    }

    #[tokio::test]
    async fn stranger_cannot_delete_and_store_is_untouched() {
        let title_id = Uuid::now_v7();
        let author = actor(Role::User);
        let existing = Review::new(
            title_id,
            Score::new(7).unwrap(),
            TimestampedAuthored::new(author.id, "Mine").unwrap(),
        );
        let review_id = existing.id;

        let mut reviews = MockReviewRepo::new();
        reviews
            .expect_find_review()
            .returning(move |_| Ok(Some(existing.clone())));
        reviews.expect_delete_review().never();
        reviews.expect_update_review().never();
        let service = ReviewService::new(Arc::new(MockCatalogRepo::new()), Arc::new(reviews));

        let stranger = actor(Role::User);
        let err = service
            .delete_review(Some(&stranger), title_id, review_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = service
            .update_review(Some(&stranger), title_id, review_id, draft(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn moderator_may_delete_any_review() {
        let title_id = Uuid::now_v7();
        let existing = Review::new(
            title_id,
            Score::new(2).unwrap(),
            TimestampedAuthored::new(Uuid::now_v7(), "Spam").unwrap(),
        );
        let review_id = existing.id;

        let mut reviews = MockReviewRepo::new();
        reviews
            .expect_find_review()
            .returning(move |_| Ok(Some(existing.clone())));
        reviews
            .expect_delete_review()
            .withf(move |id| *id == review_id)
            .times(1)
            .returning(|_| Ok(true));
        let service = ReviewService::new(Arc::new(MockCatalogRepo::new()), Arc::new(reviews));

        service
            .delete_review(Some(&actor(Role::Moderator)), title_id, review_id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn review_under_another_title_is_hidden() {
        let existing = Review::new(
            Uuid::now_v7(),
            Score::new(6).unwrap(),
            TimestampedAuthored::new(Uuid::now_v7(), "Elsewhere").unwrap(),
        );
        let review_id = existing.id;
        let mut reviews = MockReviewRepo::new();
        reviews
            .expect_find_review()
            .returning(move |_| Ok(Some(existing.clone())));
        let service = ReviewService::new(Arc::new(MockCatalogRepo::new()), Arc::new(reviews));

        let err = service.get_review(Uuid::now_v7(), review_id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "review", .. }));
    }

    #[tokio::test]
    async fn author_update_revalidates_score() {
        let title_id = Uuid::now_v7();
        let author = actor(Role::User);
        let existing = Review::new(
            title_id,
            Score::new(4).unwrap(),
            TimestampedAuthored::new(author.id, "Meh").unwrap(),
        );
        let review_id = existing.id;
        let mut reviews = MockReviewRepo::new();
        reviews
            .expect_find_review()
            .returning(move |_| Ok(Some(existing.clone())));
        reviews
            .expect_update_review()
            .withf(|r| r.score.value() == 9 && r.post.text == "Meh")
            .times(1)
            .returning(|_| Ok(()));
        let service = ReviewService::new(Arc::new(MockCatalogRepo::new()), Arc::new(reviews));

        let bad = ReviewDraft {
            text: None,
            score: Some(12),
        };
        assert_eq!(
            service
                .update_review(Some(&author), title_id, review_id, bad)
                .await
                .unwrap_err(),
            DomainError::InvalidScore(12)
        );

        let good = ReviewDraft {
            text: None,
            score: Some(9),
        };
        let updated = service
            .update_review(Some(&author), title_id, review_id, good)
            .await
            .unwrap();
        assert_eq!(updated.score.value(), 9);
    }
}
