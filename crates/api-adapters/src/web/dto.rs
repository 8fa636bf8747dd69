//! Request and response bodies that differ from the domain models.

use chrono::{DateTime, Utc};
use domains::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub confirmation_code: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct NamedSlugRequest {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    pub search: Option<String>,
}

/// Public profile shape; the id and confirmation state stay internal.
#[derive(Debug, Serialize)]
pub struct UserBody {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

/// Reviews and comments expose the author by username.
#[derive(Debug, Serialize)]
pub struct ReviewBody {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub score: u8,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CommentBody {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
}
