use crate::place::CuratedCandidateSet;

/// Numbered candidate list for the downstream ranking prompt.
///
/// Indices are 1-based and match `CuratedCandidateSet::get`, so a ranker can
/// answer with numbers that map straight back to records.
pub fn render_candidates(set: &CuratedCandidateSet) -> String {
    let mut content = String::new();
    for (index, place) in set.indexed() {
        content.push_str(&format!(
            "{}. {} [{}] ({})\n",
            index,
            place.name,
            place.category,
            format_distance(place.distance_from_anchor)
        ));
    }
    content
}

pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0}m", meters)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}
