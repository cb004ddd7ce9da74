pub mod memory;
pub mod parse;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::{
    errors::AppError,
    models::{
        Account, Session,
        account::{AccountUpdate, SignUpRequest},
    },
};

pub const USER_CLASS: &str = "_User";

/// Accounts, sessions and credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, AppError>;

    /// Fails with [`AppError::Auth`] on bad credentials.
    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, AppError>;

    async fn sign_out(&self, token: &str) -> Result<(), AppError>;

    /// Looks up the account behind a session token.
    async fn current_account(&self, token: &str) -> Result<Account, AppError>;

    /// Direct field write on the session's own account.
    async fn update_account(&self, session: &Session, update: AccountUpdate)
    -> Result<(), AppError>;

    /// Runs a privileged server-side function and returns its result.
    async fn run_function(
        &self,
        session: &Session,
        name: &str,
        params: Value,
    ) -> Result<Value, AppError>;
}

/// Typed-record storage. Objects travel as JSON maps carrying at least
/// `objectId` and `createdAt`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persists a new object and returns it with its assigned `objectId` and `createdAt`.
    async fn create(
        &self,
        class: &str,
        fields: Map<String, Value>,
        session: Option<&Session>,
    ) -> Result<Value, AppError>;

    /// Fails with [`AppError::NotFound`] when no object has this id.
    async fn get(&self, class: &str, id: &str, include: &[String]) -> Result<Value, AppError>;

    async fn find(&self, query: &Query) -> Result<Vec<Value>, AppError>;

    /// Fails with [`AppError::NotFound`] when no object has this id.
    async fn delete(&self, class: &str, id: &str, session: Option<&Session>)
    -> Result<(), AppError>;
}

/// Equality constraints, one descending order field and pointer includes.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub class: String,
    pub equal_to: Map<String, Value>,
    pub descending: Option<String>,
    pub include: Vec<String>,
}

impl Query {
    pub fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
            equal_to: Map::new(),
            descending: None,
            include: Vec::new(),
        }
    }

    pub fn equal_to(mut self, field: &str, value: Value) -> Self {
        self.equal_to.insert(field.to_string(), value);
        self
    }

    pub fn descending(mut self, field: &str) -> Self {
        self.descending = Some(field.to_string());
        self
    }

    pub fn include(mut self, field: &str) -> Self {
        self.include.push(field.to_string());
        self
    }
}

pub fn pointer(class: &str, id: &str) -> Value {
    json!({
        "__type": "Pointer",
        "className": class,
        "objectId": id,
    })
}

/// Returns `(className, objectId)` when the value is a pointer or an included object.
pub fn pointer_target(value: &Value) -> Option<(&str, &str)> {
    let kind = value.get("__type")?.as_str()?;
    if kind != "Pointer" && kind != "Object" {
        return None;
    }
    let class = value.get("className")?.as_str()?;
    let id = value.get("objectId")?.as_str()?;
    Some((class, id))
}
