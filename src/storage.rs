use crate::domain::*;
use crate::error::Result;
use crate::transform::office_query::OfficeQuery;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Outcome of an exact-fields lookup. Callers branch on the variant; a
/// `Multiple` must never be silently collapsed to its first element when
/// creating results.
#[derive(Debug, Clone)]
pub enum Lookup<T> {
    NotFound,
    One(T),
    Multiple(Vec<T>),
}

/// Field set used to find an existing contest. Mirrors the contest fields
/// minus source; a permissive store may return more than one match.
#[derive(Debug, Clone)]
pub struct ContestQuery {
    pub election_id: String,
    pub state: String,
    pub place: String,
    pub office_id: Uuid,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub election_type: Option<String>,
    pub primary_type: Option<String>,
    pub result_type: Option<String>,
    pub special: bool,
}

impl ContestQuery {
    pub fn from_raw(raw: &RawResult, office_id: Uuid) -> Self {
        Self {
            election_id: raw.election_id.clone(),
            state: raw.state.clone(),
            place: raw.place.clone(),
            office_id,
            start_date: raw.start_date,
            end_date: raw.end_date,
            election_type: raw.election_type.clone(),
            primary_type: raw.primary_type.clone(),
            result_type: raw.result_type.clone(),
            special: raw.special,
        }
    }
}

/// Identity key for a candidate lookup, constrained to its contest.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub election_id: String,
    pub contest_slug: String,
    pub candidate_slug: String,
    pub contest_id: Uuid,
}

/// Persistence collaborator for the transform pipeline. Lookups return
/// explicit found / not-found / multiple outcomes instead of raising;
/// anything else a backend throws is a fatal persistence error.
#[async_trait]
pub trait Storage: Send + Sync {
    // Raw result operations
    async fn create_raw_result(&self, raw: &mut RawResult) -> Result<()>;
    async fn raw_results(&self, state: &str, place: &str) -> Result<Vec<RawResult>>;
    async fn distinct_election_ids(&self) -> Result<Vec<String>>;

    // Office operations
    async fn find_office(&self, query: &OfficeQuery) -> Result<Option<Office>>;
    async fn create_office(&self, office: &mut Office) -> Result<()>;

    // Contest operations
    async fn find_contests(&self, query: &ContestQuery) -> Result<Vec<Contest>>;
    async fn insert_contests(&self, contests: Vec<Contest>) -> Result<()>;

    // Candidate operations
    async fn find_candidate(&self, query: &CandidateQuery) -> Result<Lookup<Candidate>>;
    async fn insert_candidates(&self, candidates: Vec<Candidate>) -> Result<()>;

    // Result operations
    async fn insert_results(&self, results: Vec<VoteResult>) -> Result<()>;

    // Reversal operations; each returns the number of rows removed
    async fn delete_offices_by_state(&self, state: &str) -> Result<usize>;
    async fn delete_contests_by_state(&self, state: &str) -> Result<usize>;
    async fn delete_candidates_by_state(&self, state: &str) -> Result<usize>;
    async fn delete_results_by_elections(&self, election_ids: &[String]) -> Result<usize>;

    // Transform run audit operations
    async fn create_run(&self, run: &mut TransformRun) -> Result<()>;
    async fn update_run(&self, run: &TransformRun) -> Result<()>;
    async fn create_record(&self, record: &mut TransformRecord) -> Result<()>;
}

/// In-memory storage implementation for development/testing. Entity lists
/// keep insertion order so scans and first-match semantics stay
/// deterministic.
pub struct InMemoryStorage {
    raw_results: Arc<Mutex<Vec<RawResult>>>,
    offices: Arc<Mutex<Vec<Office>>>,
    contests: Arc<Mutex<Vec<Contest>>>,
    candidates: Arc<Mutex<Vec<Candidate>>>,
    results: Arc<Mutex<Vec<VoteResult>>>,
    runs: Arc<Mutex<Vec<TransformRun>>>,
    records: Arc<Mutex<Vec<TransformRecord>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            raw_results: Arc::new(Mutex::new(Vec::new())),
            offices: Arc::new(Mutex::new(Vec::new())),
            contests: Arc::new(Mutex::new(Vec::new())),
            candidates: Arc::new(Mutex::new(Vec::new())),
            results: Arc::new(Mutex::new(Vec::new())),
            runs: Arc::new(Mutex::new(Vec::new())),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    // Inspection helpers used by tests and the CLI summary.

    pub fn office_count(&self) -> usize {
        self.offices.lock().unwrap().len()
    }

    pub fn contest_count(&self) -> usize {
        self.contests.lock().unwrap().len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.lock().unwrap().len()
    }

    pub fn result_count(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    pub fn all_offices(&self) -> Vec<Office> {
        self.offices.lock().unwrap().clone()
    }

    pub fn all_contests(&self) -> Vec<Contest> {
        self.contests.lock().unwrap().clone()
    }

    pub fn all_candidates(&self) -> Vec<Candidate> {
        self.candidates.lock().unwrap().clone()
    }

    pub fn all_results(&self) -> Vec<VoteResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn all_records(&self) -> Vec<TransformRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_raw_result(&self, raw: &mut RawResult) -> Result<()> {
        let id = Uuid::new_v4();
        raw.id = Some(id);

        let mut raw_results = self.raw_results.lock().unwrap();
        raw_results.push(raw.clone());

        debug!("Created raw result {} with id {}", raw.contest_slug, id);
        Ok(())
    }

    async fn raw_results(&self, state: &str, place: &str) -> Result<Vec<RawResult>> {
        let raw_results = self.raw_results.lock().unwrap();
        Ok(raw_results
            .iter()
            .filter(|r| r.state == state && r.place == place)
            .cloned()
            .collect())
    }

    async fn distinct_election_ids(&self) -> Result<Vec<String>> {
        let raw_results = self.raw_results.lock().unwrap();
        let mut ids: Vec<String> = Vec::new();
        for raw in raw_results.iter() {
            if !ids.contains(&raw.election_id) {
                ids.push(raw.election_id.clone());
            }
        }
        Ok(ids)
    }

    async fn find_office(&self, query: &OfficeQuery) -> Result<Option<Office>> {
        let offices = self.offices.lock().unwrap();
        let office = offices
            .iter()
            .find(|o| {
                o.name == query.name
                    && o.state == query.state
                    && o.place == query.place
                    && o.county == query.county
                    && o.district == query.district
            })
            .cloned();
        Ok(office)
    }

    async fn create_office(&self, office: &mut Office) -> Result<()> {
        let id = Uuid::new_v4();
        office.id = Some(id);

        let mut offices = self.offices.lock().unwrap();
        offices.push(office.clone());

        debug!("Created office: {} with id {}", office.name, id);
        Ok(())
    }

    async fn find_contests(&self, query: &ContestQuery) -> Result<Vec<Contest>> {
        let contests = self.contests.lock().unwrap();
        Ok(contests
            .iter()
            .filter(|c| {
                c.election_id == query.election_id
                    && c.state == query.state
                    && c.place == query.place
                    && c.office_id == query.office_id
                    && c.start_date == query.start_date
                    && c.end_date == query.end_date
                    && c.election_type == query.election_type
                    && c.primary_type == query.primary_type
                    && c.result_type == query.result_type
                    && c.special == query.special
            })
            .cloned()
            .collect())
    }

    async fn insert_contests(&self, mut batch: Vec<Contest>) -> Result<()> {
        let mut contests = self.contests.lock().unwrap();
        for contest in batch.iter_mut() {
            contest.id = Some(Uuid::new_v4());
        }
        let count = batch.len();
        contests.extend(batch);

        debug!("Inserted {} contests", count);
        Ok(())
    }

    async fn find_candidate(&self, query: &CandidateQuery) -> Result<Lookup<Candidate>> {
        let candidates = self.candidates.lock().unwrap();
        let matches: Vec<Candidate> = candidates
            .iter()
            .filter(|c| {
                c.election_id == query.election_id
                    && c.contest_slug == query.contest_slug
                    && c.candidate_slug == query.candidate_slug
                    && c.contest_id == query.contest_id
            })
            .cloned()
            .collect();

        Ok(match matches.len() {
            0 => Lookup::NotFound,
            1 => Lookup::One(matches.into_iter().next().unwrap()),
            _ => Lookup::Multiple(matches),
        })
    }

    async fn insert_candidates(&self, mut batch: Vec<Candidate>) -> Result<()> {
        let mut candidates = self.candidates.lock().unwrap();
        for candidate in batch.iter_mut() {
            candidate.id = Some(Uuid::new_v4());
        }
        let count = batch.len();
        candidates.extend(batch);

        debug!("Inserted {} candidates", count);
        Ok(())
    }

    async fn insert_results(&self, mut batch: Vec<VoteResult>) -> Result<()> {
        let mut results = self.results.lock().unwrap();
        for result in batch.iter_mut() {
            result.id = Some(Uuid::new_v4());
        }
        let count = batch.len();
        results.extend(batch);

        debug!("Inserted {} results", count);
        Ok(())
    }

    async fn delete_offices_by_state(&self, state: &str) -> Result<usize> {
        let mut offices = self.offices.lock().unwrap();
        let before = offices.len();
        offices.retain(|o| o.state != state);
        Ok(before - offices.len())
    }

    async fn delete_contests_by_state(&self, state: &str) -> Result<usize> {
        let mut contests = self.contests.lock().unwrap();
        let before = contests.len();
        contests.retain(|c| c.state != state);
        Ok(before - contests.len())
    }

    async fn delete_candidates_by_state(&self, state: &str) -> Result<usize> {
        let mut candidates = self.candidates.lock().unwrap();
        let before = candidates.len();
        candidates.retain(|c| c.state != state);
        Ok(before - candidates.len())
    }

    async fn delete_results_by_elections(&self, election_ids: &[String]) -> Result<usize> {
        let mut results = self.results.lock().unwrap();
        let before = results.len();
        results.retain(|r| !election_ids.contains(&r.election_id));
        Ok(before - results.len())
    }

    async fn create_run(&self, run: &mut TransformRun) -> Result<()> {
        let id = Uuid::new_v4();
        run.id = Some(id);

        let mut runs = self.runs.lock().unwrap();
        runs.push(run.clone());

        debug!("Created transform run: {} with id {}", run.name, id);
        Ok(())
    }

    async fn update_run(&self, run: &TransformRun) -> Result<()> {
        let mut runs = self.runs.lock().unwrap();
        if let Some(existing) = runs.iter_mut().find(|r| r.id == run.id) {
            *existing = run.clone();
        }
        Ok(())
    }

    async fn create_record(&self, record: &mut TransformRecord) -> Result<()> {
        let id = Uuid::new_v4();
        record.id = Some(id);

        let mut records = self.records.lock().unwrap();
        records.push(record.clone());

        debug!("Created transform record with id {}", id);
        Ok(())
    }
}
