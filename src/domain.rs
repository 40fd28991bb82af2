use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed vocabulary of normalized office identities. Every contest is
/// tied to exactly one of these; free-form office strings that map to none
/// of them are dropped from entity creation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalOffice {
    President,
    UsSenate,
    UsHouse,
    StateSenate,
    StateHouse,
    GovernorAndLieutenantGovernor,
    LieutenantGovernor,
    Governor,
    SecretaryOfState,
    AttorneyGeneral,
    StatesAttorney,
    Comptroller,
    CountyTreasurer,
    Treasurer,
    CountyBoardPresident,
    CountyCommissioner,
    CountySheriff,
    CountyAssessor,
    CountyRecorderOfDeeds,
    CountyCircuitCourtClerk,
    CountyClerk,
    SupremeCourtJudge,
    AppellateCourtJudge,
    CircuitCourtJudge,
    Mayor,
    Alderman,
    WardCommitteeman,
}

impl CanonicalOffice {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalOffice::President => "President",
            CanonicalOffice::UsSenate => "U.S. Senate",
            CanonicalOffice::UsHouse => "U.S. House",
            CanonicalOffice::StateSenate => "State Senate",
            CanonicalOffice::StateHouse => "State House",
            CanonicalOffice::GovernorAndLieutenantGovernor => "Governor & Lieutenant Governor",
            CanonicalOffice::LieutenantGovernor => "Lieutenant Governor",
            CanonicalOffice::Governor => "Governor",
            CanonicalOffice::SecretaryOfState => "Secretary of State",
            CanonicalOffice::AttorneyGeneral => "Attorney General",
            CanonicalOffice::StatesAttorney => "State's Attorney",
            CanonicalOffice::Comptroller => "Comptroller",
            CanonicalOffice::CountyTreasurer => "County Treasurer",
            CanonicalOffice::Treasurer => "Treasurer",
            CanonicalOffice::CountyBoardPresident => "County Board President",
            CanonicalOffice::CountyCommissioner => "County Commissioner",
            CanonicalOffice::CountySheriff => "County Sheriff",
            CanonicalOffice::CountyAssessor => "County Assessor",
            CanonicalOffice::CountyRecorderOfDeeds => "County Recorder of Deeds",
            CanonicalOffice::CountyCircuitCourtClerk => "County Circuit Court Clerk",
            CanonicalOffice::CountyClerk => "County Clerk",
            CanonicalOffice::SupremeCourtJudge => "Supreme Court Judge",
            CanonicalOffice::AppellateCourtJudge => "Appellate Court Judge",
            CanonicalOffice::CircuitCourtJudge => "Circuit Court Judge",
            CanonicalOffice::Mayor => "Mayor",
            CanonicalOffice::Alderman => "Alderman",
            CanonicalOffice::WardCommitteeman => "Ward Committeeman",
        }
    }

    /// Offices whose district number is parsed out of the raw office name.
    pub fn is_district_office(&self) -> bool {
        matches!(
            self,
            CanonicalOffice::UsSenate
                | CanonicalOffice::UsHouse
                | CanonicalOffice::StateSenate
                | CanonicalOffice::StateHouse
                | CanonicalOffice::CountyCommissioner
        )
    }

    /// Judge offices are exempt from county tagging even when the raw
    /// office text mentions a county.
    pub fn is_judicial(&self) -> bool {
        matches!(
            self,
            CanonicalOffice::SupremeCourtJudge
                | CanonicalOffice::AppellateCourtJudge
                | CanonicalOffice::CircuitCourtJudge
        )
    }
}

impl std::fmt::Display for CanonicalOffice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row as scraped from a Board of Elections source. Immutable input;
/// the ingestion side owns its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub source: String,
    pub election_id: String,
    pub state: String,
    pub place: String,
    #[serde(default)]
    pub county: Option<String>,
    pub contest_slug: String,
    pub candidate_slug: String,
    /// Free-form office string, e.g. "ALDERMAN - WARD 17".
    pub office: String,
    /// Free-form candidate name as printed on the ballot.
    pub full_name: String,
    pub reporting_level: String,
    pub jurisdiction: String,
    pub votes: i64,
    #[serde(default)]
    pub total_votes: Option<i64>,
    #[serde(default)]
    pub vote_breakdowns: serde_json::Value,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub election_type: Option<String>,
    #[serde(default)]
    pub primary_type: Option<String>,
    #[serde(default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub special: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A canonical office identity. Exactly one exists per distinct
/// (name, state, place, county, district) tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub id: Option<Uuid>,
    pub name: CanonicalOffice,
    pub state: String,
    pub place: Option<String>,
    pub county: Option<String>,
    /// Numeric district kept as a string ("5"), or a named region
    /// ("Ward 17", "Subcircuit 4").
    pub district: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One canonical contest per (election_id, contest_slug), tied to exactly
/// one Office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contest {
    pub id: Option<Uuid>,
    pub election_id: String,
    pub contest_slug: String,
    pub office_id: Uuid,
    pub source: String,
    pub state: String,
    pub place: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub election_type: Option<String>,
    pub primary_type: Option<String>,
    pub result_type: Option<String>,
    pub special: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// One canonical candidate per (election_id, contest_slug, candidate_slug).
/// Rows whose name resolves to no real candidate (judge retention,
/// "no candidate", "candidate withdrew") never produce one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Option<Uuid>,
    pub election_id: String,
    pub contest_slug: String,
    pub candidate_slug: String,
    pub contest_id: Uuid,
    pub source: String,
    pub state: String,
    pub place: String,
    pub full_name: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub suffix: Option<String>,
    pub additional_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One canonical vote tally row, referencing its contest, candidate, and
/// the raw row it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResult {
    pub id: Option<Uuid>,
    pub contest_id: Uuid,
    pub candidate_id: Uuid,
    pub raw_result_id: Option<Uuid>,
    pub source: String,
    pub election_id: String,
    pub state: String,
    pub place: String,
    pub reporting_level: String,
    pub jurisdiction: String,
    pub votes: i64,
    pub total_votes: Option<i64>,
    pub vote_breakdowns: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl VoteResult {
    pub fn new(raw: &RawResult, contest_id: Uuid, candidate_id: Uuid) -> Self {
        Self {
            id: None,
            contest_id,
            candidate_id,
            raw_result_id: raw.id,
            source: raw.source.clone(),
            election_id: raw.election_id.clone(),
            state: raw.state.clone(),
            place: raw.place.clone(),
            reporting_level: raw.reporting_level.clone(),
            jurisdiction: raw.jurisdiction.clone(),
            votes: raw.votes,
            total_votes: raw.total_votes,
            vote_breakdowns: raw.vote_breakdowns.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Outcome classes recorded for audit during a transform run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ChangeType {
    Created,
    Skipped,
    Ambiguous,
    NoChange,
    Error,
}

/// Which entity an audit record is about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EntityKind {
    Office,
    Contest,
    Candidate,
    Result,
    None,
}

/// A transform run record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRun {
    pub id: Option<Uuid>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TransformRun {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Mark the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// A record of one notable outcome during a transform run: a skipped row,
/// an ambiguous candidate match, an unclassifiable office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRecord {
    pub id: Option<Uuid>,
    pub run_id: Uuid,
    pub change_type: ChangeType,
    pub entity: EntityKind,
    pub note: String,
    pub raw_result_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TransformRecord {
    pub fn new(
        run_id: Uuid,
        change_type: ChangeType,
        entity: EntityKind,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            run_id,
            change_type,
            entity,
            note: note.into(),
            raw_result_id: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the raw row this record is about.
    pub fn with_raw_result(mut self, raw_result_id: Option<Uuid>) -> Self {
        self.raw_result_id = raw_result_id;
        self
    }
}
