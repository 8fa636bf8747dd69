//! # Domain Models
//!
//! These structs represent the core entities of yamdb.
//! We use UUID v7 for time-ordered, globally unique identification.

mod catalog;
mod review;
mod user;

pub use catalog::{Category, Genre, NamedSlug, Title, TitleDraft};
pub use review::{Comment, Review, Score, TimestampedAuthored};
pub use user::{NewUser, Role, User, UserPatch, UserStatus};
