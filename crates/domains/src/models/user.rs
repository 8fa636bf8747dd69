use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::policy::Actor;
use crate::validation;

/// The three roles a user can hold. Referenced everywhere instead of raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Moderators and admins.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::Validation(format!("unknown role `{other}`"))),
        }
    }
}

/// Registration progress of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Signed up (or created by an admin), no code exchanged yet.
    #[default]
    Unconfirmed,
    /// A confirmation code was exchanged for a token at least once.
    Active,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Unconfirmed => "unconfirmed",
            UserStatus::Active => "active",
        }
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unconfirmed" => Ok(UserStatus::Unconfirmed),
            "active" => Ok(UserStatus::Active),
            other => Err(DomainError::Validation(format!("unknown status `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: UserStatus,
    /// Hash of the outstanding confirmation code, if any. Never leaves the core.
    #[serde(skip)]
    pub confirmation_code_hash: Option<String>,
}

impl User {
    /// Validates username and email and builds an unconfirmed account.
    pub fn new(username: &str, email: &str, role: Role) -> DomainResult<Self> {
        validation::validate_username(username)?;
        validation::validate_email(email)?;
        Ok(Self {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            bio: None,
            first_name: None,
            last_name: None,
            status: UserStatus::Unconfirmed,
            confirmation_code_hash: None,
        })
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role,
        }
    }

    /// Applies a patch after validating every supplied field.
    /// Callers decide beforehand which fields the actor may touch.
    pub fn apply(&mut self, patch: UserPatch) -> DomainResult<()> {
        if let Some(username) = &patch.username {
            validation::validate_username(username)?;
        }
        if let Some(email) = &patch.email {
            validation::validate_email(email)?;
        }
        if let Some(first_name) = &patch.first_name {
            validation::validate_person_name("first_name", first_name)?;
        }
        if let Some(last_name) = &patch.last_name {
            validation::validate_person_name("last_name", last_name)?;
        }

        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = Some(first_name);
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = Some(last_name);
        }
        if let Some(bio) = patch.bio {
            self.bio = Some(bio);
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        Ok(())
    }
}

/// Admin-side account creation payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
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

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}
