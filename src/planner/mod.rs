//! Planning pipeline: pick categories, collect places per category in
//! parallel, then reduce everything to a short, diverse candidate list.

pub mod categories;
pub mod collector;
pub mod reducer;
pub mod session;

pub use categories::select_categories;
pub use collector::{CollectSource, Collected, PlaceCollector};
pub use reducer::CandidateReducer;
pub use session::{CategoryOutcome, PlanRequest, PlanningSession, SessionReport};
