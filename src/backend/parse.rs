use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    backend::{IdentityProvider, Query, RecordStore},
    config::ParseConfig,
    errors::AppError,
    models::{
        Account, Session,
        account::{AccountUpdate, SignUpRequest},
    },
};

const OBJECT_NOT_FOUND: i64 = 101;
const USERNAME_TAKEN: i64 = 202;
const EMAIL_TAKEN: i64 = 203;
const INVALID_SESSION_TOKEN: i64 = 209;

#[derive(Debug, Deserialize)]
struct ParseErrorBody {
    code: Option<i64>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRow {
    object_id: String,
    #[serde(default)]
    username: String,
    email: Option<String>,
    name: Option<String>,
    avatar: Option<String>,
    session_token: Option<String>,
}

impl From<UserRow> for Account {
    fn from(row: UserRow) -> Self {
        Account {
            id: row.object_id,
            username: row.username,
            email: row.email,
            display_name: row.name,
            avatar: row.avatar,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedRow {
    object_id: String,
    created_at: String,
    session_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    results: Vec<Value>,
}

/// Identity and record storage over the Parse Server REST API.
#[derive(Clone)]
pub struct ParseClient {
    http: reqwest::Client,
    config: ParseConfig,
}

impl ParseClient {
    pub fn new(config: ParseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!(
            "{}/{}",
            self.config.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut builder = self
            .http
            .request(method, url)
            .header("X-Parse-Application-Id", &self.config.app_id)
            .header("X-Parse-REST-API-Key", &self.config.rest_key);

        if let Some(token) = token {
            builder = builder.header("X-Parse-Session-Token", token);
        }

        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, AppError> {
        let res = builder.send().await?;
        let status = res.status();

        if status.is_success() {
            return res
                .json::<Value>()
                .await
                .map_err(|e| AppError::Deserialization(format!("Invalid Parse response: {}", e)));
        }

        let text = res.text().await.unwrap_or_default();
        let err = classify(status, &text);
        tracing::debug!("Parse request failed with {}: {}", status, err);
        Err(err)
    }
}

/// Maps a failed Parse response onto the error taxonomy. The Parse `code`
/// wins over the HTTP status when the body carries one.
fn classify(status: StatusCode, body: &str) -> AppError {
    let body: ParseErrorBody = serde_json::from_str(body).unwrap_or(ParseErrorBody {
        code: None,
        error: None,
    });
    let message = body.error.unwrap_or_else(|| format!("HTTP {}", status));

    match body.code {
        Some(OBJECT_NOT_FOUND) => AppError::NotFound(message),
        Some(USERNAME_TAKEN) | Some(EMAIL_TAKEN) => AppError::Validation(message),
        Some(INVALID_SESSION_TOKEN) => AppError::Unauthorized(message),
        _ if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
            AppError::Unauthorized(message)
        }
        Some(code) => AppError::Persistence(format!("Parse error {}: {}", code, message)),
        None => AppError::Persistence(message),
    }
}

/// Parse answers a bad username or password on `login` with 101.
fn login_error(err: AppError) -> AppError {
    match err {
        AppError::NotFound(msg) | AppError::Unauthorized(msg) => AppError::Auth(msg),
        other => other,
    }
}

fn session_error(err: AppError) -> AppError {
    match err {
        AppError::NotFound(msg) => AppError::Unauthorized(msg),
        other => other,
    }
}

fn find_params(query: &Query) -> Result<Vec<(&'static str, String)>, AppError> {
    let where_clause = serde_json::to_string(&query.equal_to)
        .map_err(|e| AppError::Serialization(e.to_string()))?;

    let mut params = vec![("where", where_clause)];
    if let Some(field) = &query.descending {
        params.push(("order", format!("-{}", field)));
    }
    if !query.include.is_empty() {
        params.push(("include", query.include.join(",")));
    }
    Ok(params)
}

fn parse_json<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Deserialization(e.to_string()))
}

#[async_trait]
impl IdentityProvider for ParseClient {
    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, AppError> {
        let body = serde_json::to_value(&request)
            .map_err(|e| AppError::Serialization(e.to_string()))?;

        let created: CreatedRow = parse_json(
            self.send(
                self.request(Method::POST, "users", None)
                    .header("X-Parse-Revocable-Session", "1")
                    .json(&body),
            )
            .await?,
        )?;

        let token = created
            .session_token
            .ok_or_else(|| AppError::Deserialization("Sign up returned no session".into()))?;

        Ok(Session {
            token,
            account: Account {
                id: created.object_id,
                username: request.username,
                email: Some(request.email),
                display_name: Some(request.name),
                avatar: Some(request.avatar),
            },
        })
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, AppError> {
        let value = self
            .send(
                self.request(Method::POST, "login", None)
                    .header("X-Parse-Revocable-Session", "1")
                    .json(&json!({ "username": username, "password": password })),
            )
            .await
            .map_err(login_error)?;

        let mut row: UserRow = parse_json(value)?;
        let token = row
            .session_token
            .take()
            .ok_or_else(|| AppError::Deserialization("Login returned no session".into()))?;

        Ok(Session {
            token,
            account: row.into(),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        self.send(self.request(Method::POST, "logout", Some(token)))
            .await?;
        Ok(())
    }

    async fn current_account(&self, token: &str) -> Result<Account, AppError> {
        let value = self
            .send(self.request(Method::GET, "users/me", Some(token)))
            .await
            .map_err(session_error)?;

        let row: UserRow = parse_json(value)?;
        Ok(row.into())
    }

    async fn update_account(
        &self,
        session: &Session,
        update: AccountUpdate,
    ) -> Result<(), AppError> {
        let path = format!("users/{}", session.account.id);
        self.send(
            self.request(Method::PUT, &path, Some(&session.token))
                .json(&update),
        )
        .await?;
        Ok(())
    }

    async fn run_function(
        &self,
        session: &Session,
        name: &str,
        params: Value,
    ) -> Result<Value, AppError> {
        let path = format!("functions/{}", name);
        let mut value = self
            .send(
                self.request(Method::POST, &path, Some(&session.token))
                    .json(&params),
            )
            .await?;

        Ok(value
            .get_mut("result")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}

#[async_trait]
impl RecordStore for ParseClient {
    async fn create(
        &self,
        class: &str,
        fields: Map<String, Value>,
        session: Option<&Session>,
    ) -> Result<Value, AppError> {
        let path = format!("classes/{}", class);
        let token = session.map(|s| s.token.as_str());

        let created: CreatedRow = parse_json(
            self.send(self.request(Method::POST, &path, token).json(&fields))
                .await?,
        )?;

        let mut object = fields;
        object.insert("objectId".into(), Value::String(created.object_id));
        object.insert("createdAt".into(), Value::String(created.created_at));
        Ok(Value::Object(object))
    }

    async fn get(&self, class: &str, id: &str, include: &[String]) -> Result<Value, AppError> {
        let path = format!("classes/{}/{}", class, id);
        let mut builder = self.request(Method::GET, &path, None);
        if !include.is_empty() {
            builder = builder.query(&[("include", include.join(","))]);
        }
        self.send(builder).await
    }

    async fn find(&self, query: &Query) -> Result<Vec<Value>, AppError> {
        let path = format!("classes/{}", query.class);
        let params = find_params(query)?;

        let response: FindResponse = parse_json(
            self.send(self.request(Method::GET, &path, None).query(&params))
                .await?,
        )?;

        Ok(response.results)
    }

    async fn delete(
        &self,
        class: &str,
        id: &str,
        session: Option<&Session>,
    ) -> Result<(), AppError> {
        let path = format!("classes/{}/{}", class, id);
        let token = session.map(|s| s.token.as_str());
        self.send(self.request(Method::DELETE, &path, token))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{USER_CLASS, pointer};

    #[test]
    fn object_not_found_maps_to_not_found() {
        let err = classify(
            StatusCode::NOT_FOUND,
            r#"{"code":101,"error":"Object not found."}"#,
        );
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Object not found."));
    }

    #[test]
    fn invalid_session_token_maps_to_unauthorized() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"code":209,"error":"Invalid session token"}"#,
        );
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn taken_username_maps_to_validation() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"code":202,"error":"Account already exists for this username."}"#,
        );
        assert!(matches!(err, AppError::Validation(_)));

        let err = classify(StatusCode::BAD_REQUEST, r#"{"code":203,"error":"taken"}"#);
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn bare_401_maps_to_unauthorized() {
        let err = classify(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, AppError::Unauthorized(msg) if msg.contains("401")));

        let err = classify(StatusCode::FORBIDDEN, r#"{"error":"unauthorized"}"#);
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn server_error_with_html_body_is_persistence() {
        let err = classify(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html><body>Bad Gateway</body></html>",
        );
        assert!(matches!(err, AppError::Persistence(msg) if msg.contains("500")));

        let err = classify(StatusCode::BAD_REQUEST, r#"{"code":141,"error":"boom"}"#);
        assert!(matches!(err, AppError::Persistence(msg) if msg.contains("141")));
    }

    #[test]
    fn failed_login_is_auth_error() {
        let err = login_error(classify(
            StatusCode::NOT_FOUND,
            r#"{"code":101,"error":"Invalid username/password."}"#,
        ));
        assert!(matches!(err, AppError::Auth(_)));

        let err = login_error(classify(StatusCode::INTERNAL_SERVER_ERROR, ""));
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[test]
    fn missing_current_user_is_unauthorized() {
        let err = session_error(classify(
            StatusCode::NOT_FOUND,
            r#"{"code":101,"error":"Object not found."}"#,
        ));
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn find_params_carry_where_order_and_include() {
        let query = Query::new("GameRating")
            .equal_to("user", pointer(USER_CLASS, "u1"))
            .descending("createdAt")
            .include("user");

        let params = find_params(&query).unwrap();
        assert_eq!(params.len(), 3);

        let (key, where_clause) = &params[0];
        assert_eq!(*key, "where");
        let where_value: Value = serde_json::from_str(where_clause).unwrap();
        assert_eq!(
            where_value,
            json!({ "user": { "__type": "Pointer", "className": "_User", "objectId": "u1" } })
        );
        assert_eq!(params[1], ("order", "-createdAt".to_string()));
        assert_eq!(params[2], ("include", "user".to_string()));
    }

    #[test]
    fn find_params_without_order_or_include() {
        let query = Query::new("GameRating").equal_to("gameId", json!("3498"));
        let params = find_params(&query).unwrap();
        assert_eq!(params, vec![("where", r#"{"gameId":"3498"}"#.to_string())]);
    }
}
