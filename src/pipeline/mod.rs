//! Rate-limited action pipeline and debounced search input.

pub mod actions;
pub mod search;

pub use actions::{ActionQueue, DEFAULT_ACTION_INTERVAL, DEFAULT_QUEUE_CAPACITY};
pub use search::{SearchDebouncer, SearchInput, DEFAULT_DEBOUNCE};
