//! Controllers behind each screen of the client.
//!
//! Each controller owns its view state and talks to the API through a shared
//! [`ApiClient`](crate::api::ApiClient). Failures come back as
//! [`ClientError`](crate::error::ClientError) and are also kept in the
//! controller's `error` field for display.

mod compose;
mod detail;
mod feed;
mod profile;

pub use compose::{PostComposer, PostCreated, PostDraft};
pub use detail::{related_posts, DetailState, LikeStatus, PostDetailController};
pub use feed::{compute_visible_feed, FeedController};
pub use profile::{filter_owned_posts, ProfileController};
