//! # Access Control Policy
//!
//! One table-driven decision function replaces per-endpoint permission
//! classes. The HTTP layer and the services both consult it; neither needs
//! any request context beyond the actor.
//!
//! | Resource             | Read            | Create        | Update / Delete          |
//! |----------------------|-----------------|---------------|--------------------------|
//! | Catalog              | anyone          | admin         | admin                    |
//! | Review / Comment     | anyone          | authenticated | author, moderator, admin |
//! | Users (collection)   | moderator/admin | admin         | admin                    |
//! | Profile (other's)    | moderator/admin | admin         | admin                    |
//! | Profile (own)        | self            | self          | self                     |

use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::models::Role;

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn is_safe(self) -> bool {
        self == Action::Read
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Categories, genres and titles.
    Catalog,
    /// `author` is `None` when addressing the collection (create).
    Review { author: Option<Uuid> },
    Comment { author: Option<Uuid> },
    /// The user collection itself (listing, admin-side creation).
    Users,
    Profile { owner: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Pure decision over (actor, action, resource). `None` is the anonymous caller.
pub fn decide(actor: Option<&Actor>, action: Action, resource: &Resource) -> Decision {
    let role = actor.map(|a| a.role);
    let is_admin = role.is_some_and(Role::is_admin);
    let is_staff = role.is_some_and(Role::is_staff);

    let allowed = match *resource {
        Resource::Catalog => action.is_safe() || is_admin,
        Resource::Review { author } | Resource::Comment { author } => match action {
            Action::Read => true,
            Action::Create => actor.is_some(),
            Action::Update | Action::Delete => {
                is_staff || matches!((actor, author), (Some(a), Some(owner)) if a.id == owner)
            }
        },
        Resource::Users => match action {
            Action::Read => is_staff,
            _ => is_admin,
        },
        Resource::Profile { owner } => {
            let is_self = actor.is_some_and(|a| a.id == owner);
            match action {
                Action::Read => is_self || is_staff,
                _ => is_self || is_admin,
            }
        }
    };
    Decision::from_bool(allowed)
}

/// [`decide`], turned into the error the caller should see on denial.
pub fn authorize(actor: Option<&Actor>, action: Action, resource: &Resource) -> DomainResult<()> {
    match (decide(actor, action, resource), actor) {
        (Decision::Allow, _) => Ok(()),
        (Decision::Deny, None) => Err(DomainError::Unauthenticated),
        (Decision::Deny, Some(actor)) => Err(DomainError::Forbidden(format!(
            "{} may not {:?} {:?}",
            actor.role, action, resource
        ))),
    }
}
