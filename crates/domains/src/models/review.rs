use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::validation;

/// Integer score in the inclusive range 1..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> DomainResult<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DomainError::InvalidScore(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> Self {
        i64::from(score.0)
    }
}

/// Author, body and publication time shared by reviews and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedAuthored {
    pub author_id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

impl TimestampedAuthored {
    /// Stamps the body with the current time.
    pub fn new(author_id: Uuid, text: impl Into<String>) -> DomainResult<Self> {
        Self::at(author_id, text, Utc::now())
    }

    pub fn at(
        author_id: Uuid,
        text: impl Into<String>,
        pub_date: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let text = text.into();
        validation::validate_text(&text)?;
        Ok(Self {
            author_id,
            text,
            pub_date,
        })
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub title_id: Uuid,
    pub score: Score,
    #[serde(flatten)]
    pub post: TimestampedAuthored,
}

impl Review {
    pub fn new(title_id: Uuid, score: Score, post: TimestampedAuthored) -> Self {
        Self {
            id: Uuid::now_v7(),
            title_id,
            score,
            post,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub review_id: Uuid,
    #[serde(flatten)]
    pub post: TimestampedAuthored,
}

impl Comment {
    pub fn new(review_id: Uuid, post: TimestampedAuthored) -> Self {
        Self {
            id: Uuid::now_v7(),
            review_id,
            post,
        }
    }
}
