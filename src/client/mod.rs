//! Typed HTTP client for the `/api/v1` surface.
//!
//! Every request carries the session token in the `X-Nexus-Token` header.
//! A call fails on a non-2xx status or on a body with `success: false`;
//! there is no retry.

use reqwest::{Method, multipart};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::model::entity::{CourseCreate, CourseUpdate, Item, ItemCreate, ItemType, ItemUpdate, ModuleUpdate};
use crate::web::dto::{
    account::{Credentials, MeResponse, SessionResponse},
    common::{CreatedResponse, ReorderRequest, SuccessResponse, UploadResponse},
    courses::{CourseDetail, CourseSummary},
    player::{CompleteResponse, PlayerCourse},
    tree::{ContentEntry, ContentTab, CourseTree, ModuleSummary},
};
use crate::web::middlewares::AUTH_HEADER;

mod error;
pub use error::{ApiError, ApiResult, FALLBACK_MESSAGE, extract_message};

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` points at the API root, e.g. `http://host:5000/api/v1`.
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client<S: Into<String>>(client: reqwest::Client, base_url: S) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn builder(&self, method: Method, endpoint: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(endpoint));
        match &self.token {
            Some(token) => builder.header(AUTH_HEADER, token),
            None => builder,
        }
    }

    /// Sends one request and returns the decoded JSON body.
    #[tracing::instrument(level = "debug", skip(self, body))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let mut builder = self.builder(method, endpoint);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Self::read_body(builder.send().await?).await
    }

    async fn read_body(response: reqwest::Response) -> ApiResult<Value> {
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(body) => body,
                Err(e) if status.is_success() => return Err(e.into()),
                Err(_) => Value::Null,
            }
        };

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }
        if body.get("success") == Some(&Value::Bool(false)) {
            return Err(ApiError::Rejected {
                message: extract_message(&body),
            });
        }

        Ok(body)
    }

    async fn call<B, T>(&self, method: Method, endpoint: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        let value = self.request(method, endpoint, body.as_ref()).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.call::<Value, T>(Method::GET, endpoint, None).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.call(Method::POST, endpoint, Some(body)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.call(Method::PUT, endpoint, Some(body)).await
    }

    async fn delete(&self, endpoint: &str) -> ApiResult<()> {
        self.call::<Value, SuccessResponse>(Method::DELETE, endpoint, None)
            .await
            .map(|_| ())
    }

    /// Sends `bytes` as the multipart field `file`.
    #[tracing::instrument(level = "debug", skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_file(
        &self,
        endpoint: &str,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<UploadResponse> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .builder(Method::POST, endpoint)
            .multipart(form)
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Signs in and keeps the returned token for later calls.
    pub async fn signin(&mut self, username: &str, password: &str) -> ApiResult<SessionResponse> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let session: SessionResponse = self.post("account/signin", &credentials).await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn me(&self) -> ApiResult<MeResponse> {
        self.get("account/me").await
    }

    pub async fn list_courses(&self) -> ApiResult<Vec<CourseSummary>> {
        self.get("studio/courses").await
    }

    pub async fn get_course(&self, id: i64) -> ApiResult<CourseDetail> {
        self.get(&format!("studio/courses/{id}")).await
    }

    pub async fn create_course(&self, data: &CourseCreate) -> ApiResult<i64> {
        let created: CreatedResponse = self.post("studio/courses", data).await?;
        Ok(created.id)
    }

    pub async fn update_course(&self, id: i64, data: &CourseUpdate) -> ApiResult<CourseDetail> {
        self.put(&format!("studio/courses/{id}"), data).await
    }

    pub async fn delete_course(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("studio/courses/{id}")).await
    }

    pub async fn list_modules(&self, course_id: i64) -> ApiResult<Vec<ModuleSummary>> {
        self.get(&format!("studio/courses/{course_id}/modules")).await
    }

    pub async fn create_module(&self, course_id: i64, name: &str) -> ApiResult<i64> {
        let body = ModuleUpdate {
            name: name.to_string(),
        };
        let created: CreatedResponse = self
            .post(&format!("studio/courses/{course_id}/modules"), &body)
            .await?;
        Ok(created.id)
    }

    pub async fn rename_module(&self, id: i64, name: &str) -> ApiResult<ModuleSummary> {
        let body = ModuleUpdate {
            name: name.to_string(),
        };
        self.put(&format!("studio/modules/{id}"), &body).await
    }

    pub async fn delete_module(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("studio/modules/{id}")).await
    }

    pub async fn load_tree(&self, course_id: i64) -> ApiResult<CourseTree> {
        self.get(&format!("studio/courses/{course_id}/items")).await
    }

    pub async fn get_item(&self, id: i64) -> ApiResult<Item> {
        self.get(&format!("studio/items/{id}")).await
    }

    pub async fn create_item(&self, data: &ItemCreate) -> ApiResult<i64> {
        let created: CreatedResponse = self.post("studio/items", data).await?;
        Ok(created.id)
    }

    pub async fn update_item(&self, id: i64, data: &ItemUpdate) -> ApiResult<Item> {
        self.put(&format!("studio/items/{id}"), data).await
    }

    pub async fn delete_item(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("studio/items/{id}")).await
    }

    pub async fn reorder(&self, data: &ReorderRequest) -> ApiResult<()> {
        let _: SuccessResponse = self.post("studio/reorder", data).await?;
        Ok(())
    }

    pub async fn upload_media(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> ApiResult<UploadResponse> {
        self.upload_file("studio/media", file_name, mime, bytes).await
    }

    pub async fn content_tabs(&self) -> ApiResult<Vec<ContentTab>> {
        self.get("studio/content-tabs").await
    }

    pub async fn content(&self, item_type: ItemType) -> ApiResult<Vec<ContentEntry>> {
        self.get(&format!("studio/content?type={}", item_type.as_str()))
            .await
    }

    pub async fn player_course(&self, course_id: i64) -> ApiResult<PlayerCourse> {
        self.get(&format!("course/{course_id}")).await
    }

    pub async fn complete_lesson(&self, lesson_id: i64) -> ApiResult<CompleteResponse> {
        self.post(&format!("lesson/{lesson_id}/complete"), &Value::Null)
            .await
    }
}
