use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{COUNTY, PLACE, STATE};
use crate::domain::{CanonicalOffice, Office};

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit pattern"));

/// The first run of consecutive digits in the text, kept as a string so
/// leading zeros survive. "WARD 3 PRECINCT 12" yields "3": later runs are
/// ignored on purpose.
fn first_digit_run(text: &str) -> Option<String> {
    DIGIT_RUN.find(text).map(|m| m.as_str().to_string())
}

/// The full identity key needed to find or create an Office: canonical
/// name plus the state/place/county/district derived from the raw office
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OfficeQuery {
    pub name: CanonicalOffice,
    pub state: String,
    pub place: Option<String>,
    pub county: Option<String>,
    pub district: Option<String>,
}

impl OfficeQuery {
    /// Derive the office identity from a canonical name and the raw office
    /// text it was classified from. The steps apply in a fixed precedence;
    /// the ward rule deliberately overrides any district set before it.
    pub fn build(name: CanonicalOffice, raw_office: &str) -> Self {
        let mut query = OfficeQuery {
            name,
            state: STATE.to_string(),
            place: None,
            county: None,
            district: None,
        };

        if name == CanonicalOffice::President {
            query.state = "US".to_string();
        }

        if name.is_district_office() {
            query.district = first_digit_run(raw_office);
        }

        if name == CanonicalOffice::CircuitCourtJudge {
            query.district = first_digit_run(raw_office).map(|d| format!("Subcircuit {d}"));
        }

        if matches!(
            name,
            CanonicalOffice::Mayor | CanonicalOffice::Alderman | CanonicalOffice::WardCommitteeman
        ) {
            query.place = Some(PLACE.to_string());
        }

        if matches!(
            name,
            CanonicalOffice::Alderman | CanonicalOffice::WardCommitteeman
        ) {
            if let Some(digits) = first_digit_run(raw_office) {
                query.district = Some(format!("Ward {digits}"));
            }
        }

        if raw_office.to_lowercase().contains("county") && !name.is_judicial() {
            query.county = Some(COUNTY.to_string());
        }

        query
    }

    /// Construct the Office this query identifies, for the create half of
    /// find-or-create.
    pub fn to_office(&self) -> Office {
        Office {
            id: None,
            name: self.name,
            state: self.state.clone(),
            place: self.place.clone(),
            county: self.county.clone(),
            district: self.district.clone(),
            created_at: Utc::now(),
        }
    }

    /// Stable cache key over every identity field.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.name,
            self.state,
            self.place.as_deref().unwrap_or(""),
            self.county.as_deref().unwrap_or(""),
            self.district.as_deref().unwrap_or(""),
        )
    }
}
