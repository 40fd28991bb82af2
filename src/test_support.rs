use chrono::Utc;

use crate::constants::{PLACE, STATE};
use crate::domain::RawResult;

/// A raw row with the Chicago defaults filled in; unit tests only vary the
/// identity slugs, office text, and name.
pub fn raw_result(
    election_id: &str,
    contest_slug: &str,
    candidate_slug: &str,
    office: &str,
    full_name: &str,
) -> RawResult {
    RawResult {
        id: None,
        source: "chicago_board_of_elections".to_string(),
        election_id: election_id.to_string(),
        state: STATE.to_string(),
        place: PLACE.to_string(),
        county: None,
        contest_slug: contest_slug.to_string(),
        candidate_slug: candidate_slug.to_string(),
        office: office.to_string(),
        full_name: full_name.to_string(),
        reporting_level: "contest".to_string(),
        jurisdiction: "Chicago".to_string(),
        votes: 0,
        total_votes: None,
        vote_breakdowns: serde_json::Value::Null,
        start_date: None,
        end_date: None,
        election_type: None,
        primary_type: None,
        result_type: None,
        special: false,
        created_at: Utc::now(),
    }
}
