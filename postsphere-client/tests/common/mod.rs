//! In-process stand-in for the PostSphere API.
#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use postsphere::api::ApiClient;
use postsphere::auth::AuthService;
use postsphere::session::SessionHandle;
use postsphere::storage::MemoryStorageAdapter;

pub const ALICE_TOKEN: &str = "tok-alice-123456";
pub const RESET_CODE: &str = "123456";
/// Comment by alice that the server refuses to delete
pub const LOCKED_COMMENT_ID: i64 = 12;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
    pub body: String,
}

#[derive(Default)]
pub struct MockState {
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub posts: Mutex<Vec<Value>>,
    pub likes: Mutex<HashMap<(i64, String), bool>>,
    pub fail_likes: AtomicBool,
    pub fail_deletes: AtomicBool,
    next_id: AtomicI64,
}

pub struct MockApi {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockApi {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState {
            posts: Mutex::new(fixture_posts()),
            next_id: AtomicI64::new(100),
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/signup", post(signup))
            .route("/api/auth/forgot-password", post(forgot_password))
            .route("/api/auth/reset-password", post(reset_password))
            .route("/api/posts", get(list_posts))
            .route("/api/posts/create", post(create_post))
            .route("/api/posts/:id", get(get_post).delete(delete_post))
            .route("/api/posts/:id/comments", post(add_comment))
            .route("/api/posts/:id/comments/:comment_id", delete(delete_comment))
            .route("/api/posts/:id/likes", post(toggle_like))
            .route("/api/users", get(list_users))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), SessionHandle::new())
    }

    /// Auth service over a fresh client with in-memory session storage
    pub fn auth(&self) -> (ApiClient, AuthService) {
        let client = self.client();
        let auth = AuthService::new(client.clone(), Box::new(MemoryStorageAdapter::new()));
        (client, auth)
    }

    pub async fn logged_in_as_alice(&self) -> ApiClient {
        let (client, auth) = self.auth();
        auth.login("alice", "secret1!").await.unwrap();
        client
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

fn fixture_posts() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "title": "Rust tips",
            "intro": "Borrowing made easy",
            "content": "<p>Use references.</p>",
            "thumbnailUrl": "/uploads/rust.png",
            "createdAt": "2024-12-20T10:30:00",
            "likeCount": 5,
            "author": { "id": 1, "username": "alice", "email": "alice@example.com" },
            "comments": [
                { "id": 10, "content": "My own note", "createdAt": "2024-12-20T11:00:00", "user": { "username": "alice" } },
                { "id": 11, "content": "Great read", "createdAt": "2024-12-20T12:00:00", "user": { "username": "bob" } },
                { "id": LOCKED_COMMENT_ID, "content": "Pinned", "createdAt": "2024-12-20T13:00:00", "user": { "username": "alice" } }
            ]
        }),
        json!({
            "id": 2,
            "title": "Gardening",
            "intro": "Tomatoes in spring",
            "content": "<p>Water daily.</p>",
            "thumbnailUrl": null,
            "createdAt": "2024-12-22T09:00:00",
            "likeCount": 0,
            "author": { "id": 2, "username": "bob", "email": "bob@example.com" },
            "comments": []
        }),
        json!({
            "id": 3,
            "title": "Async Rust",
            "intro": "Tokio in practice",
            "content": "<p>Spawn tasks.</p>",
            "createdAt": "2024-12-21T08:15:00",
            "likeCount": 2,
            "author": { "id": 1, "username": "alice", "email": "alice@example.com" },
            "comments": []
        }),
    ]
}

fn record(
    state: &MockState,
    method: &'static str,
    path: String,
    headers: &HeaderMap,
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
    body: String,
) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path,
        authorization,
        fields,
        files,
        body,
    });
}

async fn read_multipart(mut multipart: Multipart) -> (HashMap<String, String>, Vec<UploadedFile>) {
    let mut fields = HashMap::new();
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.unwrap();
                files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    size: bytes.len(),
                });
            }
            None => {
                fields.insert(name, field.text().await.unwrap());
            }
        }
    }
    (fields, files)
}

fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

async fn login(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    let text = String::from_utf8_lossy(&body).to_string();
    let request: Value = serde_json::from_str(&text).unwrap_or_default();
    // Password is never echoed into the request log
    record(&state, "POST", "/api/auth/login".into(), &headers, HashMap::new(), vec![], String::new());

    if request["username"] == "alice" && request["password"] == "secret1!" {
        Json(json!({
            "id": 1,
            "username": "alice",
            "email": "alice@example.com",
            "bio": "Writes about Rust",
            "token": ALICE_TOKEN
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Bad credentials for user").into_response()
    }
}

async fn signup(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    let text = String::from_utf8_lossy(&body).to_string();
    let request: Value = serde_json::from_str(&text).unwrap_or_default();
    record(&state, "POST", "/api/auth/signup".into(), &headers, HashMap::new(), vec![], text);

    if request["username"] == "taken" {
        (StatusCode::BAD_REQUEST, "Username already exists").into_response()
    } else {
        "User registered successfully".into_response()
    }
}

async fn forgot_password(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    let text = String::from_utf8_lossy(&body).to_string();
    record(&state, "POST", "/api/auth/forgot-password".into(), &headers, HashMap::new(), vec![], text);
    format!("Verification code sent. Code: {}", RESET_CODE).into_response()
}

async fn reset_password(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    let text = String::from_utf8_lossy(&body).to_string();
    let request: Value = serde_json::from_str(&text).unwrap_or_default();
    record(&state, "POST", "/api/auth/reset-password".into(), &headers, HashMap::new(), vec![], text);

    if request["verificationCode"] == RESET_CODE {
        "Password reset successful".into_response()
    } else {
        (StatusCode::BAD_REQUEST, "Invalid verification code").into_response()
    }
}

async fn list_posts(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/api/posts".into(), &headers, HashMap::new(), vec![], String::new());
    let posts = state.posts.lock().unwrap().clone();
    Json(Value::Array(posts)).into_response()
}

async fn get_post(State(state): State<Arc<MockState>>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    record(&state, "GET", format!("/api/posts/{}", id), &headers, HashMap::new(), vec![], String::new());
    let posts = state.posts.lock().unwrap();
    match posts.iter().find(|p| p["id"] == id) {
        Some(post) => Json(post.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "Post not found").into_response(),
    }
}

async fn create_post(State(state): State<Arc<MockState>>, headers: HeaderMap, multipart: Multipart) -> Response {
    let (fields, files) = read_multipart(multipart).await;
    let title = fields.get("title").cloned().unwrap_or_default();
    record(&state, "POST", "/api/posts/create".into(), &headers, fields.clone(), files, String::new());

    if title == "slow" {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    if title == "fail" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let author_id: i64 = fields.get("authorId").and_then(|s| s.parse().ok()).unwrap_or_default();
    let post = json!({
        "id": id,
        "title": title,
        "intro": fields.get("intro").cloned().unwrap_or_default(),
        "content": fields.get("content").cloned().unwrap_or_default(),
        "createdAt": now_timestamp(),
        "likeCount": 0,
        "author": { "id": author_id, "username": "alice" },
        "comments": []
    });
    state.posts.lock().unwrap().push(post.clone());
    Json(post).into_response()
}

async fn delete_post(State(state): State<Arc<MockState>>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    record(&state, "DELETE", format!("/api/posts/{}", id), &headers, HashMap::new(), vec![], String::new());
    if state.fail_deletes.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }
    state.posts.lock().unwrap().retain(|p| p["id"] != id);
    "Post deleted".into_response()
}

async fn add_comment(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let (fields, files) = read_multipart(multipart).await;
    record(&state, "POST", format!("/api/posts/{}/comments", id), &headers, fields.clone(), files, String::new());

    let comment = json!({
        "id": state.next_id.fetch_add(1, Ordering::SeqCst),
        "content": fields.get("content").cloned().unwrap_or_default(),
        "createdAt": now_timestamp(),
        "user": { "username": fields.get("username").cloned().unwrap_or_default() }
    });
    Json(comment).into_response()
}

async fn delete_comment(
    State(state): State<Arc<MockState>>,
    Path((id, comment_id)): Path<(i64, i64)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut fields = HashMap::new();
    if let Some(username) = query.get("username") {
        fields.insert("username".to_string(), username.clone());
    }
    record(
        &state,
        "DELETE",
        format!("/api/posts/{}/comments/{}", id, comment_id),
        &headers,
        fields,
        vec![],
        String::new(),
    );

    if comment_id == LOCKED_COMMENT_ID {
        return (StatusCode::FORBIDDEN, "Comment is locked").into_response();
    }
    "Comment deleted".into_response()
}

async fn toggle_like(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let (fields, files) = read_multipart(multipart).await;
    let username = fields.get("username").cloned().unwrap_or_default();
    record(&state, "POST", format!("/api/posts/{}/likes", id), &headers, fields, files, String::new());

    if state.fail_likes.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "like service down").into_response();
    }

    let liked = {
        let mut likes = state.likes.lock().unwrap();
        let entry = likes.entry((id, username)).or_insert(false);
        *entry = !*entry;
        *entry
    };

    let mut posts = state.posts.lock().unwrap();
    let Some(post) = posts.iter_mut().find(|p| p["id"] == id) else {
        return (StatusCode::NOT_FOUND, "Post not found").into_response();
    };
    let count = post["likeCount"].as_i64().unwrap_or_default() + if liked { 1 } else { -1 };
    post["likeCount"] = json!(count);

    Json(json!({ "liked": liked, "likeCount": count })).into_response()
}

async fn list_users(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/api/users".into(), &headers, HashMap::new(), vec![], String::new());
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", ALICE_TOKEN));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Missing token").into_response();
    }

    Json(json!([
        { "id": 1, "username": "alice", "email": "alice@example.com", "bio": "Writes about Rust" },
        { "id": 2, "username": "bob", "email": "bob@example.com", "bio": null }
    ]))
    .into_response()
}
