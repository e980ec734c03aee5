use postsphere_types::PostId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::{ApiClient, NewPost, Thumbnail};
use crate::error::{ClientError, ClientResult};
use crate::validation::require;

/// What the author filled in
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub intro: String,
    /// Body as HTML from the editor
    pub body_html: String,
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostCreated {
    /// Id of the new post when the server reported one
    pub post_id: Option<PostId>,
    pub message: String,
}

/// Submits new posts, one at a time per composer
#[derive(Clone)]
pub struct PostComposer {
    api_client: ApiClient,
    submitting: Arc<AtomicBool>,
}

/// Clears the in-flight flag however the submission ends
struct SubmitGuard(Arc<AtomicBool>);

impl SubmitGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PostComposer {
    pub fn new(api_client: ApiClient) -> Self {
        Self {
            api_client,
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Uploads the draft as a new post by the logged-in user.
    ///
    /// A second call while one is in flight is rejected without sending
    /// anything. Failed submissions are not retried.
    pub async fn submit_post(&self, draft: PostDraft) -> ClientResult<PostCreated> {
        let _guard = SubmitGuard::acquire(&self.submitting)
            .ok_or_else(|| ClientError::ActionFailed("A submission is already in progress".to_string()))?;

        let author_id = self
            .api_client
            .session()
            .user_id()
            .ok_or_else(|| ClientError::AuthRequired("Please log in to create a post".to_string()))?;
        require(&draft.title, "Title")?;

        let post = NewPost {
            title: draft.title.trim().to_string(),
            intro: draft.intro,
            content: draft.body_html,
            author_id,
            thumbnail: draft.thumbnail,
        };
        crate::log_action!("Submitting post {:?} by user {}", post.title, author_id);

        match self.api_client.create_post(post).await {
            Ok(body) => {
                let created = parse_created(&body);
                crate::log_action!("Post created: id={:?}", created.post_id);
                Ok(created)
            }
            Err(e) => match e.status() {
                Some(status) => {
                    log::warn!("Post creation rejected: {}", e);
                    Err(ClientError::ActionFailed(format!("HTTP error! status: {}", status)))
                }
                None => {
                    log::warn!("Post creation failed: {}", e);
                    Err(e.into())
                }
            },
        }
    }
}

/// Reads the new post's id from whatever the server answered with: a post
/// object, `{"postId": ..}`, or a bare number.
fn parse_created(body: &str) -> PostCreated {
    let value: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let post_id = value.as_ref().and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("postId"))
            .and_then(|id| id.as_i64().or_else(|| id.as_str().and_then(|s| s.parse().ok()))),
        _ => None,
    });

    let message = match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Post created successfully")
            .to_string(),
        _ if body.trim().is_empty() || post_id.is_some() => "Post created successfully".to_string(),
        _ => body.trim().to_string(),
    };

    PostCreated { post_id, message }
}
