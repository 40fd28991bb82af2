pub mod classify;
pub mod office_query;
pub mod resolver;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::constants::RESULT_BATCH_SIZE;
use crate::domain::{
    Candidate, ChangeType, Contest, EntityKind, RawResult, TransformRecord, TransformRun,
    VoteResult,
};
use crate::error::{Result, TransformError};
use crate::names::NameParser;
use crate::storage::{ContestQuery, Lookup, Storage};
use resolver::EntityResolver;

/// Full names that mark a contest as having no real candidates: judge
/// retention questions (Yes/No) and placeholder rows.
const NON_CANDIDATE_NAMES: [&str; 4] = ["yes", "no", "no candidate", "candidate withdrew"];

/// Counts reported by one pass over the raw input.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PassSummary {
    pub scanned: usize,
    pub created: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub ambiguous: usize,
}

/// Counts of entities removed by a reversal.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReverseSummary {
    pub offices: usize,
    pub contests: usize,
    pub candidates: usize,
    pub results: usize,
}

/// The transform pipeline: three ordered passes over the raw input that
/// build canonical Contests, then Candidates, then Results. Each pass owns
/// a fresh resolver, so runs are isolated; dedup across runs relies on the
/// storage collaborator's find-before-create contract.
pub struct Transformer {
    storage: Arc<dyn Storage>,
    parser: Arc<dyn NameParser>,
}

impl Transformer {
    pub fn new(storage: Arc<dyn Storage>, parser: Arc<dyn NameParser>) -> Self {
        Self { storage, parser }
    }

    fn resolver(&self) -> EntityResolver {
        EntityResolver::new(self.storage.clone(), self.parser.clone())
    }

    async fn open_run(&self, name: &str) -> Result<(TransformRun, Uuid)> {
        let mut run = TransformRun::new(name);
        self.storage.create_run(&mut run).await?;
        let run_id = run
            .id
            .ok_or_else(|| TransformError::MissingField("run.id".to_string()))?;
        info!(run = name, run_id = %run_id, "starting transform run");
        Ok((run, run_id))
    }

    async fn close_run(&self, mut run: TransformRun, summary: &PassSummary) -> Result<()> {
        run.finish();
        self.storage.update_run(&run).await?;
        info!(
            run = %run.name,
            scanned = summary.scanned,
            created = summary.created,
            skipped = summary.skipped,
            ambiguous = summary.ambiguous,
            "finished transform run"
        );
        Ok(())
    }

    /// Audit-record helper; a failure to write the record is logged but
    /// never fails the row it was about.
    async fn record(
        &self,
        run_id: Uuid,
        change_type: ChangeType,
        entity: EntityKind,
        note: String,
        raw: &RawResult,
    ) {
        let mut record =
            TransformRecord::new(run_id, change_type, entity, note).with_raw_result(raw.id);
        if let Err(e) = self.storage.create_record(&mut record).await {
            warn!("Failed to save transform record: {}", e);
        }
    }

    /// Contests pass: one Contest per unique (election_id, contest_slug)
    /// whose office classifies; everything else is recorded as a skip and
    /// produces no downstream entities.
    #[instrument(skip(self))]
    pub async fn create_contests(&self, state: &str, place: &str) -> Result<PassSummary> {
        let (run, run_id) = self.open_run("create_unique_contests").await?;
        let mut resolver = self.resolver();
        let mut summary = PassSummary::default();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut contests: Vec<Contest> = Vec::new();

        for raw in self.storage.raw_results(state, place).await? {
            summary.scanned += 1;
            let key = (raw.election_id.clone(), raw.contest_slug.clone());
            if !seen.insert(key) {
                continue;
            }

            match resolver.build_contest(&raw).await? {
                Some(contest) => {
                    // get-before-create: a store already holding this
                    // contest (an earlier run) must not receive a duplicate
                    let query = ContestQuery::from_raw(&raw, contest.office_id);
                    if !self.storage.find_contests(&query).await?.is_empty() {
                        summary.unchanged += 1;
                        continue;
                    }
                    debug!(contest = %contest.contest_slug, election = %contest.election_id, "built contest");
                    contests.push(contest);
                    summary.created += 1;
                }
                None => {
                    summary.skipped += 1;
                    self.record(
                        run_id,
                        ChangeType::Skipped,
                        EntityKind::Contest,
                        format!("office not classified: {}", raw.office),
                        &raw,
                    )
                    .await;
                }
            }
        }

        self.storage.insert_contests(contests).await?;
        self.close_run(run, &summary).await?;
        Ok(summary)
    }

    /// Candidates pass: one Candidate per unique (election_id,
    /// contest_slug, candidate_slug) with a real name and a resolvable
    /// contest. Judge-retention and placeholder rows are consumed but
    /// create nothing.
    #[instrument(skip(self))]
    pub async fn create_candidates(&self, state: &str, place: &str) -> Result<PassSummary> {
        let (run, run_id) = self.open_run("create_unique_candidates").await?;
        let mut resolver = self.resolver();
        let mut summary = PassSummary::default();
        let mut seen: HashSet<(String, String, String)> = HashSet::new();
        let mut candidates: Vec<Candidate> = Vec::new();

        for raw in self.storage.raw_results(state, place).await? {
            summary.scanned += 1;
            let key = (
                raw.election_id.clone(),
                raw.contest_slug.clone(),
                raw.candidate_slug.clone(),
            );
            if !seen.insert(key) {
                continue;
            }

            let fields = resolver.candidate_fields(&raw);
            let Some(full_name) = fields.full_name.clone() else {
                // retention questions and withdrawn/no-candidate rows
                summary.skipped += 1;
                continue;
            };

            match resolver.resolve_contest(&raw).await? {
                Some(contest) => {
                    let contest_id = contest
                        .id
                        .ok_or_else(|| TransformError::MissingField("contest.id".to_string()))?;
                    candidates.push(Candidate {
                        id: None,
                        election_id: raw.election_id.clone(),
                        contest_slug: raw.contest_slug.clone(),
                        candidate_slug: raw.candidate_slug.clone(),
                        contest_id,
                        source: raw.source.clone(),
                        state: raw.state.clone(),
                        place: raw.place.clone(),
                        full_name,
                        given_name: fields.given_name,
                        family_name: fields.family_name,
                        suffix: fields.suffix,
                        additional_name: fields.additional_name,
                        created_at: chrono::Utc::now(),
                    });
                    summary.created += 1;
                }
                None => {
                    summary.skipped += 1;
                    self.record(
                        run_id,
                        ChangeType::Skipped,
                        EntityKind::Candidate,
                        format!("no contest resolved for office: {}", raw.office),
                        &raw,
                    )
                    .await;
                }
            }
        }

        self.storage.insert_candidates(candidates).await?;
        self.close_run(run, &summary).await?;
        Ok(summary)
    }

    /// Results pass: one VoteResult per raw row with a resolvable contest
    /// and exactly one matching candidate. A Yes/No/no-candidate/withdrew
    /// row marks its (election_id, office) pair and suppresses results for
    /// the contiguous run of rows carrying that marker. Results flush in
    /// batches of 1000 plus a final flush.
    #[instrument(skip(self))]
    pub async fn create_results(&self, state: &str, place: &str) -> Result<PassSummary> {
        let (run, run_id) = self.open_run("create_unique_results").await?;
        let mut resolver = self.resolver();
        let mut summary = PassSummary::default();
        let mut batch: Vec<VoteResult> = Vec::new();
        let mut office_to_skip: Option<(String, String)> = None;

        for raw in self.storage.raw_results(state, place).await? {
            summary.scanned += 1;
            let this_office = (raw.election_id.clone(), raw.office.clone());

            if office_to_skip.as_ref() == Some(&this_office) {
                summary.skipped += 1;
                continue;
            }

            let folded = raw.full_name.trim().to_lowercase();
            if NON_CANDIDATE_NAMES.contains(&folded.as_str()) {
                office_to_skip = Some(this_office);
                summary.skipped += 1;
                continue;
            }

            let Some(contest) = resolver.resolve_contest(&raw).await? else {
                summary.skipped += 1;
                continue;
            };
            let contest_id = contest
                .id
                .ok_or_else(|| TransformError::MissingField("contest.id".to_string()))?;

            match resolver.resolve_candidate(&raw, &contest).await? {
                Lookup::One(candidate) => {
                    let candidate_id = candidate
                        .id
                        .ok_or_else(|| TransformError::MissingField("candidate.id".to_string()))?;
                    batch.push(VoteResult::new(&raw, contest_id, candidate_id));
                    summary.created += 1;
                }
                Lookup::Multiple(matches) => {
                    warn!(
                        election_id = %raw.election_id,
                        candidate_slug = %raw.candidate_slug,
                        matches = matches.len(),
                        "multiple candidates matched; skipping result"
                    );
                    summary.ambiguous += 1;
                    self.record(
                        run_id,
                        ChangeType::Ambiguous,
                        EntityKind::Result,
                        format!(
                            "{} candidates matched {}",
                            matches.len(),
                            raw.candidate_slug
                        ),
                        &raw,
                    )
                    .await;
                }
                Lookup::NotFound => {
                    warn!(
                        election_id = %raw.election_id,
                        candidate_slug = %raw.candidate_slug,
                        "no candidate matched; skipping result"
                    );
                    summary.skipped += 1;
                    self.record(
                        run_id,
                        ChangeType::Skipped,
                        EntityKind::Result,
                        format!("no candidate matched {}", raw.candidate_slug),
                        &raw,
                    )
                    .await;
                }
            }

            // keep the pending working set bounded
            if batch.len() >= RESULT_BATCH_SIZE {
                let chunk = std::mem::take(&mut batch);
                info!(count = chunk.len(), "flushing result batch");
                self.storage.insert_results(chunk).await?;
            }
        }

        info!(count = batch.len(), "flushing final result batch");
        self.storage.insert_results(batch).await?;
        self.close_run(run, &summary).await?;
        Ok(summary)
    }

    /// Run the three passes in order. Later passes read entities created by
    /// earlier ones, so the ordering is a hard requirement.
    pub async fn run_all(&self, state: &str, place: &str) -> Result<[PassSummary; 3]> {
        let contests = self.create_contests(state, place).await?;
        let candidates = self.create_candidates(state, place).await?;
        let results = self.create_results(state, place).await?;
        Ok([contests, candidates, results])
    }

    /// Delete the offices and contests previously created for a state.
    pub async fn reverse_contests(&self, state: &str) -> Result<ReverseSummary> {
        let offices = self.storage.delete_offices_by_state(state).await?;
        info!(count = offices, "deleted previously created offices");
        let contests = self.storage.delete_contests_by_state(state).await?;
        info!(count = contests, "deleted previously created contests");
        Ok(ReverseSummary {
            offices,
            contests,
            ..ReverseSummary::default()
        })
    }

    /// Delete the candidates previously created for a state.
    pub async fn reverse_candidates(&self, state: &str) -> Result<ReverseSummary> {
        let candidates = self.storage.delete_candidates_by_state(state).await?;
        info!(count = candidates, "deleted previously created candidates");
        Ok(ReverseSummary {
            candidates,
            ..ReverseSummary::default()
        })
    }

    /// Delete the results previously loaded for every election present in
    /// the raw input set.
    pub async fn reverse_results(&self) -> Result<ReverseSummary> {
        let election_ids = self.storage.distinct_election_ids().await?;
        let results = self
            .storage
            .delete_results_by_elections(&election_ids)
            .await?;
        info!(count = results, "deleted previously loaded results");
        Ok(ReverseSummary {
            results,
            ..ReverseSummary::default()
        })
    }

    /// Reverse all three passes, newest entities first.
    pub async fn reverse_all(&self, state: &str) -> Result<ReverseSummary> {
        let results = self.reverse_results().await?;
        let candidates = self.reverse_candidates(state).await?;
        let contests = self.reverse_contests(state).await?;
        Ok(ReverseSummary {
            offices: contests.offices,
            contests: contests.contests,
            candidates: candidates.candidates,
            results: results.results,
        })
    }
}
