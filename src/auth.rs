use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::{
    backend::IdentityProvider,
    errors::AppError,
    models::{
        Session,
        account::{DEFAULT_AVATAR, SignUpRequest},
    },
    session::SessionContext,
    state::AppState,
};

/// Request extractor resolving the bearer token into an established session.
pub struct AuthSession(pub SessionContext);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    (
                        StatusCode::UNAUTHORIZED,
                        "Missing or invalid Authorization header".into(),
                    )
                })?;

        let session = state
            .accounts
            .resolve(bearer.token())
            .await
            .map_err(|e| e.to_response())?;

        Ok(Self(SessionContext::established(session)))
    }
}

#[derive(Clone)]
pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
}

impl AccountService {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// The email doubles as the username.
    pub async fn sign_up(
        &self,
        ctx: &SessionContext,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
        avatar: Option<&str>,
    ) -> Result<Session, AppError> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty()
            || email.is_empty()
            || password.trim().is_empty()
            || confirm_password.trim().is_empty()
        {
            return Err(AppError::Validation("Please fill in all fields".into()));
        }
        if password != confirm_password {
            return Err(AppError::Validation("Passwords do not match".into()));
        }

        let avatar = avatar
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AVATAR);

        let session = self
            .identity
            .sign_up(SignUpRequest {
                username: email.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                avatar: avatar.to_string(),
            })
            .await?;

        tracing::info!("Account created: {}", session.account.id);
        ctx.establish(session.clone());
        Ok(session)
    }

    pub async fn sign_in(
        &self,
        ctx: &SessionContext,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(AppError::Validation("Please fill in all fields".into()));
        }

        let session = self.identity.sign_in(email, password).await?;
        tracing::info!("Signed in: {}", session.account.id);
        ctx.establish(session.clone());
        Ok(session)
    }

    pub async fn sign_out(&self, ctx: &SessionContext) -> Result<(), AppError> {
        let session = ctx.require()?;
        self.identity.sign_out(&session.token).await?;
        ctx.clear();
        tracing::info!("Signed out: {}", session.account.id);
        Ok(())
    }

    /// Current-session lookup for a token presented by the client.
    pub async fn resolve(&self, token: &str) -> Result<Session, AppError> {
        let account = self.identity.current_account(token).await?;
        Ok(Session {
            token: token.to_string(),
            account,
        })
    }
}
