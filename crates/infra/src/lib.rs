//! Storage layer: in-memory stores behind the domain's trait boundaries.

pub mod comment_store;
pub mod poll_store;
pub mod user_store;

pub use comment_store::{CommentRecord, CommentStore};
pub use poll_store::{PollOption, PollRecord, PollStore};
pub use user_store::UserStore;
