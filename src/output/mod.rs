mod candidates;
mod summary;

pub use candidates::{format_distance, render_candidates};
pub use summary::{build_summary, write_summary, SessionSummary};
