use postsphere_types::{Comment, CommentId, Post, PostId};

use crate::api::{ApiClient, ApiError};
use crate::error::{ClientError, ClientResult};
use crate::optimistic::Optimistic;
use crate::view::ViewScope;

const ANONYMOUS: &str = "Anonymous";
const LIKE_FAILED: &str = "Failed to update like status";
const COMMENT_FAILED: &str = "Failed to add comment";
const DELETE_COMMENT_FORBIDDEN: &str = "You are not authorized to delete this comment";
const DELETE_COMMENT_FAILED: &str = "Failed to delete comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Loaded,
    /// A like toggle is waiting on the server
    PendingLike,
    /// A new comment is waiting on the server
    PendingComment,
}

/// Like overlay kept beside the post; the post itself is never edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeStatus {
    pub is_liked: bool,
    pub like_count: i64,
}

impl LikeStatus {
    pub fn toggled(self) -> Self {
        if self.is_liked {
            Self {
                is_liked: false,
                like_count: self.like_count - 1,
            }
        } else {
            Self {
                is_liked: true,
                like_count: self.like_count + 1,
            }
        }
    }
}

/// Posts by the same author as `current`, without `current` itself
pub fn related_posts(posts: &[Post], current: &Post) -> Vec<Post> {
    posts
        .iter()
        .filter(|p| p.author.username == current.author.username && p.id != current.id)
        .cloned()
        .collect()
}

/// One post with its comments, likes and related posts.
///
/// Every async method re-checks the [`ViewScope`] once the server answers;
/// after the view is closed results are dropped and `ViewClosed` is
/// returned.
pub struct PostDetailController {
    api_client: ApiClient,
    scope: ViewScope,
    post_id: PostId,
    state: DetailState,
    post: Option<Post>,
    comments: Vec<Comment>,
    likes: LikeStatus,
    related: Vec<Post>,
    pub draft_comment: String,
    pub error: Option<String>,
}

impl PostDetailController {
    pub fn new(api_client: ApiClient, post_id: PostId) -> Self {
        Self {
            api_client,
            scope: ViewScope::new(),
            post_id,
            state: DetailState::Loading,
            post: None,
            comments: Vec::new(),
            likes: LikeStatus::default(),
            related: Vec::new(),
            draft_comment: String::new(),
            error: None,
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope.clone()
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn state(&self) -> DetailState {
        self.state
    }

    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn like_status(&self) -> LikeStatus {
        self.likes
    }

    pub fn related(&self) -> &[Post] {
        &self.related
    }

    pub async fn load(&mut self) -> ClientResult<()> {
        self.state = DetailState::Loading;
        self.error = None;

        let result = self.api_client.get_post(self.post_id).await;
        self.scope.ensure_open()?;

        match result {
            Ok(post) => {
                self.seed(post);
                Ok(())
            }
            Err(e) => {
                let err = ClientError::from(e);
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Shows `post` as freshly loaded
    pub fn seed(&mut self, post: Post) {
        self.comments = post.comments.clone();
        self.likes = LikeStatus {
            is_liked: false,
            like_count: post.like_count,
        };
        self.post = Some(post);
        self.state = DetailState::Loaded;
    }

    /// Flips the like locally, then asks the server to do the same.
    /// The local change is rolled back if the server call fails.
    pub async fn toggle_like(&mut self) -> ClientResult<LikeStatus> {
        let username = self
            .api_client
            .session()
            .username()
            .ok_or_else(|| ClientError::AuthRequired("Please log in to like posts".to_string()))?;

        self.state = DetailState::PendingLike;
        let change = Optimistic::apply(&mut self.likes, |likes| *likes = likes.toggled());
        crate::log_action!(
            "Like toggle on post {} by {}: liked={}",
            self.post_id,
            username,
            self.likes.is_liked
        );

        let result = self.api_client.toggle_like(self.post_id, &username).await;
        if let Err(closed) = self.scope.ensure_open() {
            let _ = change.revert(&mut self.likes);
            return Err(closed);
        }
        self.state = DetailState::Loaded;

        match result {
            Ok(response) => {
                let _ = change.commit();
                if let Some(liked) = response.liked {
                    self.likes.is_liked = liked;
                }
                if let Some(count) = response.like_count {
                    self.likes.like_count = count;
                }
                Ok(self.likes)
            }
            Err(e) => {
                log::warn!(
                    "Like toggle on post {} failed, restoring {:?}: {}",
                    self.post_id,
                    change.snapshot(),
                    e
                );
                let _ = change.revert(&mut self.likes);
                self.error = Some(LIKE_FAILED.to_string());
                Err(ClientError::ActionFailed(LIKE_FAILED.to_string()))
            }
        }
    }

    /// Sends the current draft as a comment
    pub async fn submit_draft(&mut self) -> ClientResult<Option<Comment>> {
        let content = self.draft_comment.clone();
        self.add_comment(&content).await
    }

    /// Posts a comment. Blank content is ignored and returns `Ok(None)`.
    ///
    /// On failure the text stays in the draft so the user can retry.
    pub async fn add_comment(&mut self, content: &str) -> ClientResult<Option<Comment>> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        self.draft_comment = content.to_string();

        let username = self
            .api_client
            .session()
            .username()
            .unwrap_or_else(|| ANONYMOUS.to_string());

        self.state = DetailState::PendingComment;
        let result = self
            .api_client
            .add_comment(self.post_id, &username, content.trim())
            .await;
        self.scope.ensure_open()?;
        self.state = DetailState::Loaded;

        match result {
            Ok(comment) => {
                crate::log_action!("Comment {} added to post {} by {}", comment.id, self.post_id, username);
                self.comments.push(comment.clone());
                self.draft_comment.clear();
                Ok(Some(comment))
            }
            Err(e) => {
                log::warn!("Adding comment to post {} failed: {}", self.post_id, e);
                self.error = Some(COMMENT_FAILED.to_string());
                Err(ClientError::ActionFailed(COMMENT_FAILED.to_string()))
            }
        }
    }

    /// Deletes one of the logged-in user's comments.
    ///
    /// Comments by someone else are refused locally before any request.
    pub async fn delete_comment(&mut self, comment_id: CommentId) -> ClientResult<()> {
        let username = self
            .api_client
            .session()
            .username()
            .ok_or_else(|| ClientError::AuthRequired("Please log in to delete comments".to_string()))?;

        let comment = self
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| ClientError::NotFound(format!("Comment {} not found", comment_id)))?;

        if !comment.is_owned_by(&username) {
            self.error = Some(DELETE_COMMENT_FORBIDDEN.to_string());
            return Err(ClientError::Forbidden(DELETE_COMMENT_FORBIDDEN.to_string()));
        }

        let result = self
            .api_client
            .delete_comment(self.post_id, comment_id, &username)
            .await;
        self.scope.ensure_open()?;

        match result {
            Ok(()) => {
                crate::log_action!("Comment {} deleted from post {}", comment_id, self.post_id);
                self.comments.retain(|c| c.id != comment_id);
                Ok(())
            }
            Err(ApiError::Forbidden(_)) => {
                self.error = Some(DELETE_COMMENT_FORBIDDEN.to_string());
                Err(ClientError::Forbidden(DELETE_COMMENT_FORBIDDEN.to_string()))
            }
            Err(e) => {
                log::warn!("Deleting comment {} failed: {}", comment_id, e);
                self.error = Some(DELETE_COMMENT_FAILED.to_string());
                Err(ClientError::ActionFailed(DELETE_COMMENT_FAILED.to_string()))
            }
        }
    }

    /// Fetches the other posts by this post's author. Does nothing until
    /// the post itself has loaded.
    pub async fn load_related(&mut self) -> ClientResult<&[Post]> {
        if self.post.is_none() {
            return Ok(&self.related);
        }

        let result = self.api_client.get_posts().await;
        self.scope.ensure_open()?;

        let posts = result?;
        if let Some(current) = &self.post {
            self.related = related_posts(&posts, current);
        }
        Ok(&self.related)
    }
}
