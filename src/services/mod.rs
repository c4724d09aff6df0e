pub mod catalog;
pub mod posters;
pub mod ranker;
pub mod sessions;
pub mod similarity;
pub mod vectorizer;

pub use catalog::Catalog;
pub use posters::{PosterProvider, PosterResolver, TmdbPosterProvider};
pub use ranker::{ContentRanker, RandomRanker, Ranker, ScorePolicy};
pub use sessions::SessionStore;
