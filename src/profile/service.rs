use std::sync::Arc;

use serde_json::json;

use crate::{
    backend::IdentityProvider,
    errors::AppError,
    models::account::AccountUpdate,
    profile::avatar::AvatarChange,
    session::SessionContext,
};

/// Post-signup account changes. Every operation acts on the account of the
/// session held by the given context.
#[derive(Clone)]
pub struct ProfileService {
    identity: Arc<dyn IdentityProvider>,
    avatar_function: String,
}

impl ProfileService {
    pub fn new(identity: Arc<dyn IdentityProvider>, avatar_function: &str) -> Self {
        Self {
            identity,
            avatar_function: avatar_function.to_string(),
        }
    }

    /// Goes through the privileged remote function so the identity service
    /// applies its own authorization; the avatar field is never written directly.
    pub async fn update_avatar(&self, ctx: &SessionContext, avatar: &str) -> Result<(), AppError> {
        let session = ctx.require()?;

        self.identity
            .run_function(
                &session,
                &self.avatar_function,
                json!({ "userId": session.account.id, "avatar": avatar }),
            )
            .await
            .map_err(|e| {
                tracing::error!("Error updating avatar for {}: {}", session.account.id, e);
                e.into_mutation()
            })?;

        ctx.replace_account(|account| account.avatar = Some(avatar.to_string()));
        tracing::info!("Avatar updated for {}", session.account.id);
        Ok(())
    }

    /// Runs [`ProfileService::update_avatar`] inside an optimistic change:
    /// committed on success, rolled back to the previous key on failure.
    pub async fn change_avatar(
        &self,
        ctx: &SessionContext,
        change: &mut AvatarChange,
        avatar: &str,
    ) -> Result<(), AppError> {
        if !change.begin(avatar) {
            return Err(AppError::Validation(
                "An avatar change is already in progress".into(),
            ));
        }

        match self.update_avatar(ctx, avatar).await {
            Ok(()) => {
                change.commit();
                Ok(())
            }
            Err(e) => {
                change.roll_back(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn update_email(&self, ctx: &SessionContext, new_email: &str) -> Result<(), AppError> {
        let new_email = new_email.trim();
        if new_email.is_empty() {
            return Err(AppError::Validation("Please enter a new email".into()));
        }

        let session = ctx.require()?;
        self.identity
            .update_account(
                &session,
                AccountUpdate {
                    email: Some(new_email.to_string()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                tracing::error!("Error updating email for {}: {}", session.account.id, e);
                e.into_mutation()
            })?;

        ctx.replace_account(|account| account.email = Some(new_email.to_string()));
        tracing::info!("Email updated for {}", session.account.id);
        Ok(())
    }

    /// Re-authenticates with `current_password` before writing the new one.
    /// The re-authenticated session replaces the one in `ctx`.
    pub async fn update_password(
        &self,
        ctx: &SessionContext,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AppError> {
        if current_password.trim().is_empty()
            || new_password.trim().is_empty()
            || confirm_password.trim().is_empty()
        {
            return Err(AppError::Validation("Please fill in all fields".into()));
        }
        if new_password != confirm_password {
            return Err(AppError::Validation(
                "The new password and its confirmation do not match".into(),
            ));
        }

        let session = ctx.require()?;
        let fresh = self
            .identity
            .sign_in(&session.account.username, current_password)
            .await
            .map_err(|e| match e {
                AppError::Auth(msg) => AppError::Auth(msg),
                other => AppError::Auth(format!("Could not confirm current password: {}", other)),
            })?;
        ctx.establish(fresh.clone());

        self.identity
            .update_account(
                &fresh,
                AccountUpdate {
                    password: Some(new_password.to_string()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                tracing::error!("Error updating password for {}: {}", fresh.account.id, e);
                e.into_mutation()
            })?;

        tracing::info!("Password updated for {}", fresh.account.id);
        Ok(())
    }
}
