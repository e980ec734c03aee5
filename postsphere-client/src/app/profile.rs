use postsphere_types::{Post, PostId, UserId};

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::view::ViewScope;

const DELETE_POST_FAILED: &str = "Failed to delete post. Please try again later.";

/// Posts written by `user_id`, in fetch order.
///
/// The API has no per-author listing, so this scans every post.
pub fn filter_owned_posts(posts: Vec<Post>, user_id: UserId) -> Vec<Post> {
    posts.into_iter().filter(|p| p.is_authored_by(user_id)).collect()
}

/// A user's page: their posts, deletable when it is your own
pub struct ProfileController {
    api_client: ApiClient,
    scope: ViewScope,
    viewed_user_id: Option<UserId>,
    posts: Vec<Post>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ProfileController {
    pub fn new(api_client: ApiClient) -> Self {
        Self {
            api_client,
            scope: ViewScope::new(),
            viewed_user_id: None,
            posts: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope.clone()
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn viewed_user_id(&self) -> Option<UserId> {
        self.viewed_user_id
    }

    pub fn is_own_profile(&self) -> bool {
        match (self.viewed_user_id, self.api_client.session().user_id()) {
            (Some(viewed), Some(me)) => viewed == me,
            _ => false,
        }
    }

    pub async fn load_owned_posts(&mut self, viewed_user_id: UserId) -> ClientResult<&[Post]> {
        self.viewed_user_id = Some(viewed_user_id);
        self.loading = true;
        self.error = None;

        let result = self.api_client.get_posts().await;
        self.scope.ensure_open()?;
        self.loading = false;

        match result {
            Ok(posts) => {
                self.posts = filter_owned_posts(posts, viewed_user_id);
                Ok(&self.posts)
            }
            Err(e) => {
                let err = ClientError::from(e);
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Deletes a post and drops it from the list. On failure the list is
    /// left as it was.
    pub async fn delete_post(&mut self, post_id: PostId) -> ClientResult<()> {
        if !self.api_client.session().is_authenticated() {
            return Err(ClientError::AuthRequired("Please log in to delete posts".to_string()));
        }

        let result = self.api_client.delete_post(post_id).await;
        self.scope.ensure_open()?;

        match result {
            Ok(()) => {
                crate::log_action!("Post {} deleted", post_id);
                self.posts.retain(|p| p.id != post_id);
                Ok(())
            }
            Err(e) => {
                log::warn!("Deleting post {} failed: {}", post_id, e);
                self.error = Some(DELETE_POST_FAILED.to_string());
                Err(ClientError::ActionFailed(DELETE_POST_FAILED.to_string()))
            }
        }
    }
}
