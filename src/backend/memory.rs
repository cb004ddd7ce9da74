use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    backend::{IdentityProvider, Query, RecordStore, USER_CLASS, pointer_target},
    config::DEFAULT_AVATAR_FUNCTION,
    errors::AppError,
    models::{
        Account, Session,
        account::{AccountUpdate, SignUpRequest},
    },
};

/// Operations of the in-memory backend, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOp {
    SignUp,
    SignIn,
    SignOut,
    CurrentAccount,
    UpdateAccount,
    RunFunction,
    Create,
    Get,
    Find,
    Delete,
}

#[derive(Default)]
struct MemoryData {
    classes: HashMap<String, Vec<Map<String, Value>>>,
    passwords: HashMap<String, String>,
    sessions: HashMap<String, String>,
    calls: HashMap<MemoryOp, usize>,
    failing: HashSet<MemoryOp>,
}

impl MemoryData {
    fn record(&mut self, op: MemoryOp) -> Result<(), AppError> {
        *self.calls.entry(op).or_default() += 1;
        if self.failing.contains(&op) {
            return Err(AppError::Persistence(format!("{:?} is unavailable", op)));
        }
        Ok(())
    }

    fn objects(&self, class: &str) -> &[Map<String, Value>] {
        self.classes.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find_object(&self, class: &str, id: &str) -> Option<&Map<String, Value>> {
        self.objects(class)
            .iter()
            .find(|obj| obj.get("objectId").and_then(Value::as_str) == Some(id))
    }

    fn user_by_username(&self, username: &str) -> Option<&Map<String, Value>> {
        self.objects(USER_CLASS)
            .iter()
            .find(|obj| obj.get("username").and_then(Value::as_str) == Some(username))
    }

    fn user_by_token(&self, token: &str) -> Result<Account, AppError> {
        self.sessions
            .get(token)
            .and_then(|id| self.find_object(USER_CLASS, id))
            .map(account_from_object)
            .ok_or_else(|| AppError::Unauthorized("Invalid session token".into()))
    }

    fn user_mut(&mut self, id: &str) -> Option<&mut Map<String, Value>> {
        self.classes
            .get_mut(USER_CLASS)?
            .iter_mut()
            .find(|obj| obj.get("objectId").and_then(Value::as_str) == Some(id))
    }

    fn open_session(&mut self, account: Account) -> Session {
        let token = format!("r:{}", Uuid::new_v4().simple());
        self.sessions.insert(token.clone(), account.id.clone());
        Session { token, account }
    }

    fn resolve_includes(&self, object: &Map<String, Value>, include: &[String]) -> Value {
        let mut resolved = object.clone();
        for field in include {
            let target = resolved
                .get(field)
                .and_then(pointer_target)
                .and_then(|(class, id)| {
                    self.find_object(class, id)
                        .map(|obj| (class.to_string(), obj.clone()))
                });

            if let Some((class, mut included)) = target {
                included.insert("__type".into(), json!("Object"));
                included.insert("className".into(), json!(class));
                resolved.insert(field.clone(), Value::Object(included));
            }
        }
        Value::Object(resolved)
    }
}

fn account_from_object(obj: &Map<String, Value>) -> Account {
    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    Account {
        id: text("objectId").unwrap_or_default(),
        username: text("username").unwrap_or_default(),
        email: text("email"),
        display_name: text("name"),
        avatar: text("avatar"),
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn field_matches(actual: Option<&Value>, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return expected.is_null();
    };
    match (pointer_target(actual), pointer_target(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// In-process identity and record storage sharing one user table.
#[derive(Clone)]
pub struct MemoryBackend {
    data: Arc<Mutex<MemoryData>>,
    avatar_function: String,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: Arc::default(),
            avatar_function: DEFAULT_AVATAR_FUNCTION.to_string(),
        }
    }

    pub fn with_avatar_function(mut self, name: &str) -> Self {
        self.avatar_function = name.to_string();
        self
    }

    /// Makes every subsequent call of `op` fail until cleared.
    pub async fn set_failing(&self, op: MemoryOp, failing: bool) {
        let mut data = self.data.lock().await;
        if failing {
            data.failing.insert(op);
        } else {
            data.failing.remove(&op);
        }
    }

    pub async fn calls(&self, op: MemoryOp) -> usize {
        self.data.lock().await.calls.get(&op).copied().unwrap_or(0)
    }

    pub async fn count(&self, class: &str) -> usize {
        self.data.lock().await.objects(class).len()
    }

    /// Checks a stored credential without opening a session or counting a call.
    pub async fn password_matches(&self, username: &str, password: &str) -> bool {
        let data = self.data.lock().await;
        data.user_by_username(username)
            .and_then(|obj| obj.get("objectId").and_then(Value::as_str))
            .and_then(|id| data.passwords.get(id))
            .is_some_and(|stored| stored == password)
    }

    /// Removes an account and its sessions, leaving anything that points at it.
    pub async fn remove_account(&self, id: &str) {
        let mut data = self.data.lock().await;
        if let Some(users) = data.classes.get_mut(USER_CLASS) {
            users.retain(|obj| obj.get("objectId").and_then(Value::as_str) != Some(id));
        }
        data.passwords.remove(id);
        data.sessions.retain(|_, user_id| user_id != id);
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::SignUp)?;

        if data.user_by_username(&request.username).is_some() {
            return Err(AppError::Validation(
                "Account already exists for this username".into(),
            ));
        }

        let id = Uuid::new_v4().simple().to_string();
        let mut user = Map::new();
        user.insert("objectId".into(), json!(id));
        user.insert("username".into(), json!(request.username));
        user.insert("email".into(), json!(request.email));
        user.insert("name".into(), json!(request.name));
        user.insert("avatar".into(), json!(request.avatar));
        user.insert("createdAt".into(), json!(now_timestamp()));

        let account = account_from_object(&user);
        data.classes
            .entry(USER_CLASS.to_string())
            .or_default()
            .push(user);
        data.passwords.insert(id, request.password);

        Ok(data.open_session(account))
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::SignIn)?;

        let account = data
            .user_by_username(username)
            .map(account_from_object)
            .filter(|account| data.passwords.get(&account.id).map(String::as_str) == Some(password))
            .ok_or_else(|| AppError::Auth("Invalid username/password.".into()))?;

        Ok(data.open_session(account))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::SignOut)?;

        data.sessions
            .remove(token)
            .map(|_| ())
            .ok_or_else(|| AppError::Unauthorized("Invalid session token".into()))
    }

    async fn current_account(&self, token: &str) -> Result<Account, AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::CurrentAccount)?;
        data.user_by_token(token)
    }

    async fn update_account(
        &self,
        session: &Session,
        update: AccountUpdate,
    ) -> Result<(), AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::UpdateAccount)?;

        let account = data.user_by_token(&session.token)?;
        if account.id != session.account.id {
            return Err(AppError::Unauthorized(
                "Cannot modify another user's account".into(),
            ));
        }

        if let Some(password) = update.password {
            data.passwords.insert(account.id.clone(), password);
        }
        if let Some(email) = update.email {
            if let Some(user) = data.user_mut(&account.id) {
                user.insert("email".into(), json!(email));
            }
        }

        Ok(())
    }

    async fn run_function(
        &self,
        session: &Session,
        name: &str,
        params: Value,
    ) -> Result<Value, AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::RunFunction)?;

        if name != self.avatar_function {
            return Err(AppError::NotFound(format!("Invalid function: \"{}\"", name)));
        }

        let caller = data.user_by_token(&session.token)?;
        let user_id = params.get("userId").and_then(Value::as_str);
        let avatar = params.get("avatar").and_then(Value::as_str);

        let (Some(user_id), Some(avatar)) = (user_id, avatar) else {
            return Err(AppError::Validation("userId and avatar are required".into()));
        };

        if user_id != caller.id {
            return Err(AppError::Unauthorized(
                "Cannot change another user's avatar".into(),
            ));
        }

        let user = data
            .user_mut(user_id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.insert("avatar".into(), json!(avatar));

        Ok(json!({ "success": true }))
    }
}

#[async_trait]
impl RecordStore for MemoryBackend {
    async fn create(
        &self,
        class: &str,
        fields: Map<String, Value>,
        _session: Option<&Session>,
    ) -> Result<Value, AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::Create)?;

        let mut object = fields;
        object.insert("objectId".into(), json!(Uuid::new_v4().simple().to_string()));
        object.insert("createdAt".into(), json!(now_timestamp()));

        data.classes
            .entry(class.to_string())
            .or_default()
            .push(object.clone());

        Ok(Value::Object(object))
    }

    async fn get(&self, class: &str, id: &str, include: &[String]) -> Result<Value, AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::Get)?;

        let object = data
            .find_object(class, id)
            .ok_or_else(|| AppError::NotFound("Object not found.".into()))?;
        Ok(data.resolve_includes(object, include))
    }

    async fn find(&self, query: &Query) -> Result<Vec<Value>, AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::Find)?;

        // newest insertion first so equal sort keys keep that order
        let mut matches: Vec<&Map<String, Value>> = data
            .objects(&query.class)
            .iter()
            .rev()
            .filter(|obj| {
                query
                    .equal_to
                    .iter()
                    .all(|(field, expected)| field_matches(obj.get(field), expected))
            })
            .collect();

        if let Some(field) = &query.descending {
            matches.sort_by(|a, b| compare_values(b.get(field), a.get(field)));
        }

        Ok(matches
            .into_iter()
            .map(|obj| data.resolve_includes(obj, &query.include))
            .collect())
    }

    async fn delete(
        &self,
        class: &str,
        id: &str,
        _session: Option<&Session>,
    ) -> Result<(), AppError> {
        let mut data = self.data.lock().await;
        data.record(MemoryOp::Delete)?;

        let objects = data
            .classes
            .get_mut(class)
            .ok_or_else(|| AppError::NotFound("Object not found.".into()))?;
        let before = objects.len();
        objects.retain(|obj| obj.get("objectId").and_then(Value::as_str) != Some(id));

        if objects.len() == before {
            return Err(AppError::NotFound("Object not found.".into()));
        }
        Ok(())
    }
}
