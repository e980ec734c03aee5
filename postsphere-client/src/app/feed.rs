use postsphere_types::{Post, SortMode, User};

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::view::ViewScope;

/// Derives what the feed shows from the fetched posts.
///
/// `Recommended` keeps fetch order, `MostLiked` sorts by like count and
/// `Latest` by creation time, both descending with ties left in fetch order.
/// The query keeps posts whose title or intro contains it, ignoring case.
pub fn compute_visible_feed(posts: &[Post], sort_mode: SortMode, query: &str) -> Vec<Post> {
    let needle = query.to_lowercase();
    let mut visible: Vec<Post> = posts
        .iter()
        .filter(|post| needle.is_empty() || matches_query(post, &needle))
        .cloned()
        .collect();

    match sort_mode {
        SortMode::Recommended => {}
        SortMode::MostLiked => visible.sort_by(|a, b| b.like_count.cmp(&a.like_count)),
        SortMode::Latest => visible.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    visible
}

fn matches_query(post: &Post, needle: &str) -> bool {
    post.title.to_lowercase().contains(needle) || post.intro.to_lowercase().contains(needle)
}

/// Home feed: every post, plus people the user may know
pub struct FeedController {
    api_client: ApiClient,
    scope: ViewScope,
    posts: Vec<Post>,
    users: Vec<User>,
    sort_mode: SortMode,
    query: String,
    visible: Vec<Post>,
    pub loading: bool,
    pub error: Option<String>,
}

impl FeedController {
    pub fn new(api_client: ApiClient) -> Self {
        Self {
            api_client,
            scope: ViewScope::new(),
            posts: Vec::new(),
            users: Vec::new(),
            sort_mode: SortMode::default(),
            query: String::new(),
            visible: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn scope(&self) -> ViewScope {
        self.scope.clone()
    }

    /// Fetch posts, then users when someone is logged in
    pub async fn load(&mut self) -> ClientResult<()> {
        self.loading = true;
        self.error = None;

        let result = self.api_client.get_posts().await;
        self.scope.ensure_open()?;

        match result {
            Ok(posts) => self.set_posts(posts),
            Err(e) => {
                let err = ClientError::from(e);
                self.error = Some(err.to_string());
                self.loading = false;
                return Err(err);
            }
        }

        // The users endpoint needs a token; without one the list stays empty
        if self.api_client.session().is_authenticated() {
            let result = self.api_client.get_users().await;
            self.scope.ensure_open()?;
            self.users = match result {
                Ok(users) => users,
                Err(e) => {
                    log::warn!("Failed to load users: {}", e);
                    Vec::new()
                }
            };
        } else {
            self.users.clear();
        }

        self.loading = false;
        Ok(())
    }

    pub fn set_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        self.recompute();
    }

    pub fn set_sort_mode(&mut self, sort_mode: SortMode) {
        self.sort_mode = sort_mode;
        self.recompute();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.visible = compute_visible_feed(&self.posts, self.sort_mode, &self.query);
        crate::log_feed!(
            "Feed recomputed: sort={} query={:?} visible={}/{}",
            self.sort_mode,
            self.query,
            self.visible.len(),
            self.posts.len()
        );
    }

    pub fn visible(&self) -> &[Post] {
        &self.visible
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}
