use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::{Candidate, Contest, Office, RawResult};
use crate::error::Result;
use crate::names::{NameParser, NameTag};
use crate::storage::{CandidateQuery, ContestQuery, Lookup, Storage};
use crate::transform::classify::classify;
use crate::transform::office_query::OfficeQuery;

/// Candidate fields derived from a raw row's full name. `full_name` is
/// `None` for judge-retention (Yes/No) and placeholder rows; such rows
/// never become Candidates.
#[derive(Debug, Clone, Default)]
pub struct CandidateFields {
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub suffix: Option<String>,
    pub additional_name: Option<String>,
}

impl CandidateFields {
    /// Fields for a row with no real candidate behind it.
    fn unnamed() -> Self {
        Self::default()
    }

    /// Fields that keep the raw name verbatim, with no decomposition.
    fn verbatim(full_name: &str) -> Self {
        Self {
            full_name: Some(full_name.to_string()),
            ..Self::default()
        }
    }
}

/// Memoizing find-or-create resolution for offices, contests, and
/// candidates. One resolver is constructed per pipeline pass; its caches
/// live exactly as long as the run, so within a run no identity is created
/// twice and across runs the storage collaborator's find-before-create
/// contract takes over.
pub struct EntityResolver {
    storage: Arc<dyn Storage>,
    parser: Arc<dyn NameParser>,
    office_cache: HashMap<String, Office>,
    contest_cache: HashMap<(String, String), Option<Contest>>,
    candidate_cache: HashMap<(String, String, String), Candidate>,
}

impl EntityResolver {
    pub fn new(storage: Arc<dyn Storage>, parser: Arc<dyn NameParser>) -> Self {
        Self {
            storage,
            parser,
            office_cache: HashMap::new(),
            contest_cache: HashMap::new(),
            candidate_cache: HashMap::new(),
        }
    }

    /// Find or create the Office a raw office string identifies. Returns
    /// `None` when the string classifies to no canonical office, which
    /// drops the row from all downstream entity creation.
    pub async fn resolve_office(&mut self, raw_office: &str) -> Result<Option<Office>> {
        let Some(name) = classify(raw_office) else {
            return Ok(None);
        };

        let query = OfficeQuery::build(name, raw_office);
        let key = query.cache_key();
        if let Some(office) = self.office_cache.get(&key) {
            return Ok(Some(office.clone()));
        }

        let office = match self.storage.find_office(&query).await? {
            Some(existing) => existing,
            None => {
                let mut office = query.to_office();
                self.storage.create_office(&mut office).await?;
                debug!(office = %office.name, district = ?office.district, "created office");
                office
            }
        };

        self.office_cache.insert(key, office.clone());
        Ok(Some(office))
    }

    /// Build a fresh Contest for the Contests pass, with creation and
    /// update stamps set to now. `None` when the office fails to classify.
    pub async fn build_contest(&mut self, raw: &RawResult) -> Result<Option<Contest>> {
        let Some(office) = self.resolve_office(&raw.office).await? else {
            return Ok(None);
        };
        let office_id = office
            .id
            .ok_or_else(|| crate::error::TransformError::MissingField("office.id".to_string()))?;

        let now = Utc::now();
        Ok(Some(Contest {
            id: None,
            election_id: raw.election_id.clone(),
            contest_slug: raw.contest_slug.clone(),
            office_id,
            source: raw.source.clone(),
            state: raw.state.clone(),
            place: raw.place.clone(),
            start_date: raw.start_date,
            end_date: raw.end_date,
            election_type: raw.election_type.clone(),
            primary_type: raw.primary_type.clone(),
            result_type: raw.result_type.clone(),
            special: raw.special,
            created: now,
            updated: now,
        }))
    }

    /// Look up the persisted Contest for a raw row. Caches negative
    /// outcomes too: a contest whose office never classified stays
    /// unresolvable for the whole run without re-querying.
    pub async fn resolve_contest(&mut self, raw: &RawResult) -> Result<Option<Contest>> {
        let key = (raw.election_id.clone(), raw.contest_slug.clone());
        if let Some(cached) = self.contest_cache.get(&key) {
            return Ok(cached.clone());
        }

        let resolved = match self.resolve_office(&raw.office).await? {
            None => None,
            Some(office) => {
                let office_id = office.id.ok_or_else(|| {
                    crate::error::TransformError::MissingField("office.id".to_string())
                })?;
                let query = ContestQuery::from_raw(raw, office_id);
                let mut matches = self.storage.find_contests(&query).await?;
                if matches.len() > 1 {
                    // a permissive store can hold near-duplicate contests;
                    // take the first and leave a trace for audit
                    warn!(
                        election_id = %raw.election_id,
                        contest_slug = %raw.contest_slug,
                        matches = matches.len(),
                        "multiple contests matched; taking the first"
                    );
                }
                if matches.is_empty() {
                    None
                } else {
                    Some(matches.remove(0))
                }
            }
        };

        self.contest_cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Derive candidate fields from a raw row's full name. Judge-retention
    /// Yes/No rows and "no candidate"/"candidate withdrew" placeholders
    /// yield `full_name = None` with no decomposition attempted. Names the
    /// parser cannot tag as a person are stored verbatim, never failed.
    pub fn candidate_fields(&self, raw: &RawResult) -> CandidateFields {
        let full_name = raw.full_name.trim();
        let folded = full_name.to_lowercase();

        if folded == "yes" || folded == "no" {
            return CandidateFields::unnamed();
        }

        if folded == "no candidate" || folded == "candidate withdrew" {
            return CandidateFields::unnamed();
        }

        match self.parser.tag(full_name) {
            NameTag::Person(person) => CandidateFields {
                full_name: Some(full_name.to_string()),
                given_name: person.given,
                family_name: person.family,
                suffix: person.suffix,
                additional_name: person.nickname,
            },
            NameTag::NonPerson => {
                warn!(name = %full_name, "name tagged as non-person; storing verbatim");
                CandidateFields::verbatim(full_name)
            }
            NameTag::Unparseable => {
                warn!(name = %full_name, "unable to tag name; storing verbatim");
                CandidateFields::verbatim(full_name)
            }
        }
    }

    /// Look up the persisted Candidate for a raw row, constrained to the
    /// resolved Contest. `Multiple` and `NotFound` propagate so the caller
    /// can skip the row; neither aborts the run.
    pub async fn resolve_candidate(
        &mut self,
        raw: &RawResult,
        contest: &Contest,
    ) -> Result<Lookup<Candidate>> {
        let key = (
            raw.election_id.clone(),
            raw.contest_slug.clone(),
            raw.candidate_slug.clone(),
        );
        if let Some(cached) = self.candidate_cache.get(&key) {
            return Ok(Lookup::One(cached.clone()));
        }

        let contest_id = contest
            .id
            .ok_or_else(|| crate::error::TransformError::MissingField("contest.id".to_string()))?;
        let query = CandidateQuery {
            election_id: raw.election_id.clone(),
            contest_slug: raw.contest_slug.clone(),
            candidate_slug: raw.candidate_slug.clone(),
            contest_id,
        };

        match self.storage.find_candidate(&query).await? {
            Lookup::One(candidate) => {
                self.candidate_cache.insert(key, candidate.clone());
                Ok(Lookup::One(candidate))
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::HeuristicNameParser;
    use crate::storage::InMemoryStorage;
    use crate::test_support::raw_result;

    fn resolver(storage: Arc<InMemoryStorage>) -> EntityResolver {
        EntityResolver::new(storage, Arc::new(HeuristicNameParser::new()))
    }

    #[tokio::test]
    async fn test_resolve_office_creates_once_per_identity() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut resolver = resolver(storage.clone());

        let first = resolver.resolve_office("ALDERMAN - WARD 17").await.unwrap();
        let second = resolver.resolve_office("ALDERMAN WARD 17").await.unwrap();

        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(storage.office_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_office_distinguishes_wards() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut resolver = resolver(storage.clone());

        resolver.resolve_office("ALDERMAN - WARD 17").await.unwrap();
        resolver.resolve_office("ALDERMAN - WARD 3").await.unwrap();

        assert_eq!(storage.office_count(), 2);
    }

    #[tokio::test]
    async fn test_resolve_office_unclassified_is_none() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut resolver = resolver(storage.clone());

        let office = resolver.resolve_office("DOG CATCHER").await.unwrap();
        assert!(office.is_none());
        assert_eq!(storage.office_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_office_reuses_persisted_office() {
        let storage = Arc::new(InMemoryStorage::new());

        // first run creates the office
        let mut first_run = resolver(storage.clone());
        let created = first_run.resolve_office("MAYOR").await.unwrap().unwrap();

        // a later run with a fresh cache must find it instead of creating
        let mut second_run = resolver(storage.clone());
        let found = second_run.resolve_office("MAYOR").await.unwrap().unwrap();

        assert_eq!(created.id, found.id);
        assert_eq!(storage.office_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_contest_caches_negative_outcome() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut resolver = resolver(storage.clone());
        let raw = raw_result("il-2011", "weird-office", "someone", "SOME UNKNOWN OFFICE", "A Person");

        assert!(resolver.resolve_contest(&raw).await.unwrap().is_none());
        // second call answers from cache; still none
        assert!(resolver.resolve_contest(&raw).await.unwrap().is_none());
    }

    #[test]
    fn test_candidate_fields_judge_retention() {
        let storage = Arc::new(InMemoryStorage::new());
        let resolver = resolver(storage);

        for name in ["Yes", "NO", "  yes  ", "no"] {
            let raw = raw_result("il-2010", "judge", "retention", "CIRCUIT COURT JUDGE", name);
            let fields = resolver.candidate_fields(&raw);
            assert!(fields.full_name.is_none(), "{name:?} should have no full name");
            assert!(fields.given_name.is_none());
        }
    }

    #[test]
    fn test_candidate_fields_placeholder_rows() {
        let storage = Arc::new(InMemoryStorage::new());
        let resolver = resolver(storage);

        for name in ["No Candidate", "CANDIDATE WITHDREW", "candidate withdrew"] {
            let raw = raw_result("il-2010", "mayor", "placeholder", "MAYOR", name);
            let fields = resolver.candidate_fields(&raw);
            assert!(fields.full_name.is_none(), "{name:?} should have no full name");
        }
    }

    #[test]
    fn test_candidate_fields_person_decomposed() {
        let storage = Arc::new(InMemoryStorage::new());
        let resolver = resolver(storage);

        let raw = raw_result("il-2011", "mayor", "rahm-emanuel", "MAYOR", "Rahm Emanuel");
        let fields = resolver.candidate_fields(&raw);
        assert_eq!(fields.full_name.as_deref(), Some("Rahm Emanuel"));
        assert_eq!(fields.given_name.as_deref(), Some("Rahm"));
        assert_eq!(fields.family_name.as_deref(), Some("Emanuel"));
    }

    #[test]
    fn test_candidate_fields_non_person_kept_verbatim() {
        let storage = Arc::new(InMemoryStorage::new());
        let resolver = resolver(storage);

        let raw = raw_result(
            "il-1987",
            "mayor",
            "hw-party",
            "MAYOR",
            "Harold Washington Party",
        );
        let fields = resolver.candidate_fields(&raw);
        assert_eq!(fields.full_name.as_deref(), Some("Harold Washington Party"));
        assert!(fields.given_name.is_none());
        assert!(fields.family_name.is_none());
    }
}
