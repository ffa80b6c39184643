//! Forum API sources.

mod reddit;
mod reddit_helpers;

pub use reddit::RedditClient;
