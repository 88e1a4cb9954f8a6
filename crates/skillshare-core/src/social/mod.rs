//! User profiles and the follow graph.

pub mod follow;

pub use follow::{FollowService, MAX_WRITE_ATTEMPTS, UserSummary};
