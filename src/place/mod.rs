mod types;

pub use types::{
    normalize_name, Anchor, CacheKey, CandidatePool, CuratedCandidateSet, PlaceRecord, SearchQuery,
};
