//! # Account Service
//!
//! Registration, confirmation and profile management.
//!
//! Sign-up state machine:
//! - unknown username: create an `Unconfirmed` user and deliver a code
//! - known username, same email: regenerate and redeliver (no new row)
//! - known username, other email: `EmailMismatch`
//!
//! Exchanging a valid code activates the account, consumes the code and
//! issues a token. Only the code's hash is ever persisted.

use std::sync::Arc;

use domains::{
    authorize, validation, Action, Actor, CodeGenerator, ConfirmationMessage, DomainError,
    DomainResult, Mailer, NewUser, Resource, SecretHasher, TokenService, User, UserPatch,
    UserRepo, UserStatus,
};

pub struct AccountService {
    users: Arc<dyn UserRepo>,
    codes: Arc<dyn CodeGenerator>,
    hasher: Arc<dyn SecretHasher>,
    tokens: Arc<dyn TokenService>,
    mailer: Arc<dyn Mailer>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        codes: Arc<dyn CodeGenerator>,
        hasher: Arc<dyn SecretHasher>,
        tokens: Arc<dyn TokenService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            users,
            codes,
            hasher,
            tokens,
            mailer,
        }
    }

    // ── Registration ────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self, email))]
    pub async fn sign_up(&self, username: &str, email: &str) -> DomainResult<User> {
        validation::validate_username(username)?;
        validation::validate_email(email)?;

        let code = self.codes.generate();
        let code_hash = self.hasher.hash(&code)?;

        let user = match self.users.find_user_by_username(username).await? {
            Some(user) if user.email != email => return Err(DomainError::EmailMismatch),
            Some(mut user) => {
                user.confirmation_code_hash = Some(code_hash);
                self.users.update_user(user.clone()).await?;
                tracing::info!(user_id = %user.id, "confirmation code regenerated");
                user
            }
            None => {
                if self.users.find_user_by_email(email).await?.is_some() {
                    return Err(DomainError::Conflict(
                        "email is already registered to another user".into(),
                    ));
                }
                let mut user = User::new(username, email, Default::default())?;
                user.confirmation_code_hash = Some(code_hash);
                self.users.insert_user(user.clone()).await?;
                tracing::info!(user_id = %user.id, "user signed up");
                user
            }
        };

        self.deliver_code(&user, code).await;
        Ok(user)
    }

    /// Delivery problems are logged, never returned: the code is stored and
    /// the caller can simply sign up again to get a fresh one.
    async fn deliver_code(&self, user: &User, code: String) {
        let message = ConfirmationMessage {
            to: user.email.clone(),
            username: user.username.clone(),
            code,
        };
        if let Err(error) = self.mailer.send_confirmation_code(message).await {
            tracing::warn!(user_id = %user.id, %error, "confirmation code delivery failed");
        }
    }

    #[tracing::instrument(skip(self, confirmation_code))]
    pub async fn obtain_token(&self, username: &str, confirmation_code: &str) -> DomainResult<String> {
        let mut user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;

        let matches = user
            .confirmation_code_hash
            .as_deref()
            .is_some_and(|hash| self.hasher.verify(confirmation_code, hash));
        if !matches {
            tracing::debug!(user_id = %user.id, "confirmation code rejected");
            return Err(DomainError::InvalidConfirmationCode);
        }

        user.status = UserStatus::Active;
        user.confirmation_code_hash = None;
        let token = self.tokens.issue(&user)?;
        self.users.update_user(user.clone()).await?;

        tracing::info!(user_id = %user.id, "token issued");
        Ok(token)
    }

    /// Resolves a bearer token to the current state of its account, so a role
    /// change or deletion takes effect on the very next request.
    pub async fn authenticate(&self, token: &str) -> DomainResult<Actor> {
        let user_id = self.tokens.verify(token)?;
        match self.users.find_user(user_id).await? {
            Some(user) => Ok(user.actor()),
            None => {
                tracing::debug!(%user_id, "token for a deleted user");
                Err(DomainError::Unauthenticated)
            }
        }
    }

    pub async fn username_of(&self, user_id: uuid::Uuid) -> DomainResult<String> {
        self.users
            .find_user(user_id)
            .await?
            .map(|u| u.username)
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }

    // ── Own profile ─────────────────────────────────────────────────────────

    pub async fn me(&self, actor: Option<&Actor>) -> DomainResult<User> {
        let actor = actor.ok_or(DomainError::Unauthenticated)?;
        self.users
            .find_user(actor.id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", actor.id))
    }

    pub async fn update_me(&self, actor: Option<&Actor>, patch: UserPatch) -> DomainResult<User> {
        let mut user = self.me(actor).await?;
        let actor = actor.ok_or(DomainError::Unauthenticated)?;

        user.apply(restrict_patch(actor, patch))?;
        self.users.update_user(user.clone()).await?;
        Ok(user)
    }

    // ── Administration ──────────────────────────────────────────────────────

    pub async fn list_users(
        &self,
        actor: Option<&Actor>,
        search: Option<String>,
    ) -> DomainResult<Vec<User>> {
        authorize(actor, Action::Read, &Resource::Users)?;
        self.users.list_users(search).await
    }

    /// Admin-created accounts start `Unconfirmed`; the owner confirms them
    /// by signing up with the same username and email.
    #[tracing::instrument(skip(self, actor, new_user), fields(username = %new_user.username))]
    pub async fn create_user(&self, actor: Option<&Actor>, new_user: NewUser) -> DomainResult<User> {
        authorize(actor, Action::Create, &Resource::Users)?;

        let mut user = User::new(
            &new_user.username,
            &new_user.email,
            new_user.role.unwrap_or_default(),
        )?;
        user.apply(UserPatch {
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            bio: new_user.bio,
            ..Default::default()
        })?;
        self.users.insert_user(user.clone()).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created by admin");
        Ok(user)
    }

    pub async fn get_user(&self, actor: Option<&Actor>, username: &str) -> DomainResult<User> {
        let user = self.find_visible(actor, username).await?;
        authorize(actor, Action::Read, &Resource::Profile { owner: user.id })?;
        Ok(user)
    }

    pub async fn update_user(
        &self,
        actor: Option<&Actor>,
        username: &str,
        patch: UserPatch,
    ) -> DomainResult<User> {
        let mut user = self.find_visible(actor, username).await?;
        authorize(actor, Action::Update, &Resource::Profile { owner: user.id })?;
        let actor = actor.ok_or(DomainError::Unauthenticated)?;

        user.apply(restrict_patch(actor, patch))?;
        self.users.update_user(user.clone()).await?;
        Ok(user)
    }

    #[tracing::instrument(skip(self, actor))]
    pub async fn delete_user(&self, actor: Option<&Actor>, username: &str) -> DomainResult<()> {
        let user = self.find_visible(actor, username).await?;
        authorize(actor, Action::Delete, &Resource::Profile { owner: user.id })?;
        self.users.delete_user(user.id).await?;
        tracing::info!(user_id = %user.id, "user deleted with their reviews and comments");
        Ok(())
    }

    /// Callers who may not browse the user collection learn nothing about
    /// which usernames exist.
    async fn find_visible(&self, actor: Option<&Actor>, username: &str) -> DomainResult<User> {
        match self.users.find_user_by_username(username).await? {
            Some(user) => Ok(user),
            None => {
                authorize(actor, Action::Read, &Resource::Users)?;
                Err(DomainError::UserNotFound(username.to_string()))
            }
        }
    }
}

/// Only admins change roles or usernames. Anyone else's attempt is dropped,
/// not rejected, so the remaining fields of the patch still apply.
fn restrict_patch(actor: &Actor, mut patch: UserPatch) -> UserPatch {
    if !actor.role.is_admin() {
        if patch.role.take().is_some() {
            tracing::debug!(actor = %actor.id, "role change by non-admin ignored");
        }
        if patch.username.take().is_some() {
            tracing::debug!(actor = %actor.id, "username change by non-admin ignored");
        }
    }
    patch
}
