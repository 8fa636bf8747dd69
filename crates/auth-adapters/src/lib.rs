//! # auth-adapters
//!
//! Implementations of the account-side ports: confirmation code generation,
//! Argon2 hashing of codes at rest, mail delivery and (behind `auth-jwt`)
//! bearer tokens.

pub mod codes;
pub mod hashing;
#[cfg(feature = "auth-jwt")]
pub mod jwt;
pub mod mail;

pub use codes::UuidCodeGenerator;
pub use hashing::Argon2SecretHasher;
#[cfg(feature = "auth-jwt")]
pub use jwt::JwtTokenService;
pub use mail::LogMailer;
