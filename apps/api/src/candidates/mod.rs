pub mod filter;
pub mod handlers;

pub use filter::{filter_and_sort, SortKey, SortOrder, APPLICATION_REVIEW_STAGE};
