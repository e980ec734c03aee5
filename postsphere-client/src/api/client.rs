use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::Path;

use super::{ApiError, ApiResult};
use crate::session::SessionHandle;
use postsphere_types::*;

/// API client for communicating with the PostSphere server.
///
/// The bearer token is read from the shared [`SessionHandle`] on every
/// request, so a client built before login starts authenticating as soon as
/// the session is set.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionHandle,
}

impl ApiClient {
    /// Create a new API client. `base_url` includes the `/api` prefix.
    pub fn new(base_url: impl Into<String>, session: SessionHandle) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Helper to add the bearer token to a request if a session exists
    fn add_auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Maps a non-2xx response to an [`ApiError`]
    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        // Proxies answer with HTML pages that are useless to show
        let clean_error = if error_text.contains("<html") || error_text.contains("<!DOCTYPE") {
            format!("Server returned {} error. Please check the server URL.", status.as_u16())
        } else if error_text.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        } else {
            error_text
        };

        ApiError::from_status(status.as_u16(), clean_error)
    }

    /// Helper to handle JSON API responses
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        if response.status().is_success() {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// Helper for endpoints that answer with plain text
    async fn handle_text_response(&self, response: reqwest::Response) -> ApiResult<String> {
        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> ApiResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    // Authentication endpoints

    /// Register a new account; returns the server's confirmation text
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<String> {
        let url = format!("{}/auth/signup", self.base_url);
        crate::log_api_call!("POST {} username={}", url, request.username);
        let response = self.client.post(&url).json(request).send().await?;
        self.handle_text_response(response).await
    }

    /// Exchange credentials for the user record and a bearer token.
    /// Does not touch the session; see `AuthService::login`.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        let url = format!("{}/auth/login", self.base_url);
        crate::log_api_call!("POST {} username={}", url, request.username);
        let response = self.client.post(&url).json(request).send().await?;
        self.handle_response(response).await
    }

    /// Ask the server to email a verification code
    pub async fn forgot_password(&self, email: &str) -> ApiResult<String> {
        let url = format!("{}/auth/forgot-password", self.base_url);
        crate::log_api_call!("POST {}", url);
        let request = ForgotPasswordRequest {
            email: email.to_string(),
        };
        let response = self.client.post(&url).json(&request).send().await?;
        self.handle_text_response(response).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> ApiResult<String> {
        let url = format!("{}/auth/reset-password", self.base_url);
        crate::log_api_call!("POST {}", url);
        let response = self.client.post(&url).json(request).send().await?;
        self.handle_text_response(response).await
    }

    // Post endpoints

    /// Get every post, in server order
    pub async fn get_posts(&self) -> ApiResult<Vec<Post>> {
        let url = format!("{}/posts", self.base_url);
        crate::log_api_call!("GET {}", url);
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        let items: Vec<serde_json::Value> = self.handle_response(response).await?;
        Ok(keep_well_formed(items))
    }

    /// Get a single post with its comments
    pub async fn get_post(&self, post_id: PostId) -> ApiResult<Post> {
        let url = format!("{}/posts/{}", self.base_url, post_id);
        crate::log_api_call!("GET {}", url);
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    /// Create a post from a multipart form; returns the raw response text
    pub async fn create_post(&self, post: NewPost) -> ApiResult<String> {
        let url = format!("{}/posts/create", self.base_url);
        crate::log_api_call!(
            "POST {} author_id={} thumbnail={}",
            url,
            post.author_id,
            post.thumbnail.is_some()
        );

        let mut form = Form::new()
            .text("title", post.title)
            .text("intro", post.intro)
            .text("content", post.content)
            .text("authorId", post.author_id.to_string());

        if let Some(thumbnail) = post.thumbnail {
            let part = Part::bytes(thumbnail.bytes)
                .file_name(thumbnail.file_name)
                .mime_str(&thumbnail.mime_type)?;
            form = form.part("thumbnail", part);
        }

        let req = self.add_auth_header(self.client.post(&url).multipart(form));
        let response = req.send().await?;
        self.handle_text_response(response).await
    }

    pub async fn delete_post(&self, post_id: PostId) -> ApiResult<()> {
        let url = format!("{}/posts/{}", self.base_url, post_id);
        crate::log_api_call!("DELETE {}", url);
        let req = self.add_auth_header(self.client.delete(&url));
        let response = req.send().await?;
        self.handle_empty_response(response).await
    }

    // Comment endpoints

    /// Add a comment; the server answers with the stored comment
    pub async fn add_comment(&self, post_id: PostId, username: &str, content: &str) -> ApiResult<Comment> {
        let url = format!("{}/posts/{}/comments", self.base_url, post_id);
        crate::log_api_call!("POST {} username={}", url, username);
        let form = Form::new()
            .text("username", username.to_string())
            .text("content", content.to_string());
        let req = self.add_auth_header(self.client.post(&url).multipart(form));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    /// Delete a comment. The server answers 403 unless `username` wrote it.
    pub async fn delete_comment(&self, post_id: PostId, comment_id: CommentId, username: &str) -> ApiResult<()> {
        let url = format!(
            "{}/posts/{}/comments/{}?username={}",
            self.base_url,
            post_id,
            comment_id,
            urlencoding::encode(username)
        );
        crate::log_api_call!("DELETE {}", url);
        let req = self.add_auth_header(self.client.delete(&url));
        let response = req.send().await?;
        self.handle_empty_response(response).await
    }

    // Like endpoints

    /// Toggle the user's like on a post.
    ///
    /// The body is parsed leniently: anything that is not a JSON object with
    /// `liked`/`likeCount` yields an empty [`LikeToggleResponse`].
    pub async fn toggle_like(&self, post_id: PostId, username: &str) -> ApiResult<LikeToggleResponse> {
        let url = format!("{}/posts/{}/likes", self.base_url, post_id);
        crate::log_api_call!("POST {} username={}", url, username);
        let form = Form::new().text("username", username.to_string());
        let req = self.add_auth_header(self.client.post(&url).multipart(form));
        let response = req.send().await?;
        let body = self.handle_text_response(response).await?;
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    // User endpoints

    pub async fn get_users(&self) -> ApiResult<Vec<User>> {
        let url = format!("{}/users", self.base_url);
        crate::log_api_call!("GET {}", url);
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        let items: Vec<serde_json::Value> = self.handle_response(response).await?;
        Ok(keep_well_formed(items))
    }
}

/// Parses each list entry on its own, dropping the ones that don't fit `T`
fn keep_well_formed<T: DeserializeOwned>(items: Vec<serde_json::Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Skipping malformed entry in server response: {}", e);
                None
            }
        })
        .collect()
}

/// Fields sent to `POST /posts/create`
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub intro: String,
    /// HTML from the rich-text editor
    pub content: String,
    pub author_id: UserId,
    pub thumbnail: Option<Thumbnail>,
}

/// An image attached to a new post
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Thumbnail {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Reads an image from disk, guessing its MIME type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read thumbnail {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("thumbnail")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}
