//! # Rating Aggregator
//!
//! A title's rating is the arithmetic mean of its review scores, recomputed
//! from the store on every read. The mean is returned unrounded.

use std::sync::Arc;

use domains::{DomainResult, ReviewRepo, Score};
use uuid::Uuid;

/// Mean of the given scores, `None` for an empty set.
pub fn mean_score<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = Score>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), score| {
            (sum + u64::from(score.value()), count + 1)
        });
    (count > 0).then(|| sum as f64 / count as f64)
}

pub struct RatingAggregator {
    reviews: Arc<dyn ReviewRepo>,
}

impl RatingAggregator {
    pub fn new(reviews: Arc<dyn ReviewRepo>) -> Self {
        Self { reviews }
    }

    #[tracing::instrument(skip(self))]
    pub async fn rating(&self, title_id: Uuid) -> DomainResult<Option<f64>> {
        let reviews = self.reviews.list_reviews(title_id).await?;
        Ok(mean_score(reviews.iter().map(|r| r.score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{DomainError, MockReviewRepo, Review, TimestampedAuthored};

    fn scores(values: &[i64]) -> Vec<Score> {
        values.iter().map(|v| Score::new(*v).unwrap()).collect()
    }

    #[test]
    fn empty_set_has_no_rating() {
        assert_eq!(mean_score(Vec::new()), None);
    }

    #[test]
    fn mean_is_exact() {
        assert_eq!(mean_score(scores(&[10])), Some(10.0));
        assert_eq!(mean_score(scores(&[1, 10])), Some(5.5));
        let third = mean_score(scores(&[1, 1, 2])).unwrap();
        assert!((third - 4.0 / 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn aggregator_reads_current_reviews() {
        let title_id = Uuid::now_v7();
        let mut repo = MockReviewRepo::new();
        repo.expect_list_reviews()
            .withf(move |id| *id == title_id)
            .times(1)
            .returning(move |id| {
                Ok([3, 8]
                    .into_iter()
                    .map(|s| {
                        Review::new(
                            id,
                            Score::new(s).unwrap(),
                            TimestampedAuthored::new(Uuid::now_v7(), "text").unwrap(),
                        )
                    })
                    .collect())
            });

        let aggregator = RatingAggregator::new(Arc::new(repo));
        assert_eq!(aggregator.rating(title_id).await.unwrap(), Some(5.5));
    }

    #[tokio::test]
    async fn aggregator_without_reviews_is_none() {
        let mut repo = MockReviewRepo::new();
        repo.expect_list_reviews().returning(|_| Ok(vec![]));
        let aggregator = RatingAggregator::new(Arc::new(repo));
        assert_eq!(aggregator.rating(Uuid::now_v7()).await.unwrap(), None);
    }

    #[test]
    fn store_failure_is_propagated() {
        let mut repo = MockReviewRepo::new();
        repo.expect_list_reviews()
            .returning(|_| Err(DomainError::Internal("connection reset".into())));
        let aggregator = RatingAggregator::new(Arc::new(repo));
        tokio_test::assert_err!(tokio_test::block_on(aggregator.rating(Uuid::now_v7())));
    }
}
