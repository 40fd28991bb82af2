use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use elex_transform::constants::{PLACE, STATE};
use elex_transform::domain::{CanonicalOffice, RawResult};
use elex_transform::names::HeuristicNameParser;
use elex_transform::storage::{InMemoryStorage, Storage};
use elex_transform::transform::Transformer;

fn raw_row(
    election_id: &str,
    contest_slug: &str,
    candidate_slug: &str,
    office: &str,
    full_name: &str,
    votes: i64,
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
        votes,
        total_votes: Some(100_000),
        vote_breakdowns: serde_json::Value::Null,
        start_date: NaiveDate::from_ymd_opt(2011, 2, 22),
        end_date: NaiveDate::from_ymd_opt(2011, 2, 22),
        election_type: Some("general".to_string()),
        primary_type: None,
        result_type: Some("certified".to_string()),
        special: false,
        created_at: Utc::now(),
    }
}

async fn seed(storage: &InMemoryStorage, rows: Vec<RawResult>) -> Result<()> {
    for mut row in rows {
        storage.create_raw_result(&mut row).await?;
    }
    Ok(())
}

fn municipal_election_rows() -> Vec<RawResult> {
    vec![
        // mayoral contest, two candidates, two reporting rows each
        raw_row("il-2011-02-22", "mayor", "rahm-emanuel", "MAYOR", "Rahm Emanuel", 55_000),
        raw_row("il-2011-02-22", "mayor", "gery-chico", "MAYOR", "Gery Chico", 24_000),
        // aldermanic ward race
        raw_row(
            "il-2011-02-22",
            "alderman-17",
            "latasha-thomas",
            "ALDERMAN - WARD 17",
            "Latasha Thomas",
            6_000,
        ),
        // subcircuit judge race with the historical misspelling
        raw_row(
            "il-2011-02-22",
            "judge-4th-sub",
            "william-oneal",
            "JUDGE OF THE CIRCUT COURT 4TH SUBCIRCUIT",
            "William O'Neal",
            9_000,
        ),
        // county race
        raw_row(
            "il-2011-02-22",
            "county-comm-5",
            "jane-doe",
            "COUNTY COMMISSIONER DISTRICT 5",
            "Jane Doe",
            12_000,
        ),
        // retention question: produces no candidate and no results
        raw_row(
            "il-2011-02-22",
            "retain-smith",
            "yes",
            "RETAIN JOHN SMITH JUDGE CIRCUIT COURT 8TH SUBCIRCUIT",
            "Yes",
            40_000,
        ),
        raw_row(
            "il-2011-02-22",
            "retain-smith",
            "no",
            "RETAIN JOHN SMITH JUDGE CIRCUIT COURT 8TH SUBCIRCUIT",
            "No",
            10_000,
        ),
        // office string no rule knows about: dropped everywhere
        raw_row(
            "il-2011-02-22",
            "mystery",
            "somebody",
            "KEEPER OF THE SEAL",
            "Some Body",
            123,
        ),
    ]
}

#[tokio::test]
async fn test_full_pipeline_over_municipal_election() -> Result<()> {
    let storage = Arc::new(InMemoryStorage::new());
    seed(&storage, municipal_election_rows()).await?;

    let transformer = Transformer::new(storage.clone(), Arc::new(HeuristicNameParser::new()));
    let [contests, candidates, results] = transformer.run_all(STATE, PLACE).await?;

    // 5 classifiable contests (mayor, alderman, judge, commissioner,
    // retention); the unknown office is dropped
    assert_eq!(contests.created, 5);
    assert_eq!(contests.skipped, 1);
    assert_eq!(storage.contest_count(), 5);

    // Yes/No rows never become candidates
    assert_eq!(candidates.created, 5);
    assert_eq!(storage.candidate_count(), 5);

    // one result per real candidate row; retention rows and the unknown
    // office produce none
    assert_eq!(results.created, 5);
    assert_eq!(storage.result_count(), 5);

    Ok(())
}

#[tokio::test]
async fn test_office_identities_are_derived_and_deduplicated() -> Result<()> {
    let storage = Arc::new(InMemoryStorage::new());
    seed(&storage, municipal_election_rows()).await?;

    let transformer = Transformer::new(storage.clone(), Arc::new(HeuristicNameParser::new()));
    transformer.create_contests(STATE, PLACE).await?;

    let offices = storage.all_offices();

    let alderman = offices
        .iter()
        .find(|o| o.name == CanonicalOffice::Alderman)
        .expect("alderman office");
    assert_eq!(alderman.place.as_deref(), Some("Chicago"));
    assert_eq!(alderman.district.as_deref(), Some("Ward 17"));
    assert_eq!(alderman.county, None);

    let judge = offices
        .iter()
        .find(|o| o.name == CanonicalOffice::CircuitCourtJudge && o.district.as_deref() == Some("Subcircuit 4"))
        .expect("subcircuit judge office");
    assert_eq!(judge.county, None);
    assert_eq!(judge.state, "IL");

    let commissioner = offices
        .iter()
        .find(|o| o.name == CanonicalOffice::CountyCommissioner)
        .expect("county commissioner office");
    assert_eq!(commissioner.district.as_deref(), Some("5"));
    assert_eq!(commissioner.county.as_deref(), Some("Cook"));

    Ok(())
}

#[tokio::test]
async fn test_rerun_against_populated_store_creates_no_duplicate_contests() -> Result<()> {
    let storage = Arc::new(InMemoryStorage::new());
    seed(&storage, municipal_election_rows()).await?;

    let transformer = Transformer::new(storage.clone(), Arc::new(HeuristicNameParser::new()));
    transformer.create_contests(STATE, PLACE).await?;
    let first_count = storage.contest_count();

    let second = transformer.create_contests(STATE, PLACE).await?;
    assert_eq!(second.created, 0);
    assert_eq!(second.unchanged, 5);
    assert_eq!(storage.contest_count(), first_count);
    assert_eq!(storage.office_count(), 5);

    Ok(())
}

#[tokio::test]
async fn test_results_reference_their_contest_and_candidate() -> Result<()> {
    let storage = Arc::new(InMemoryStorage::new());
    seed(
        &storage,
        vec![raw_row(
            "il-2011-02-22",
            "mayor",
            "rahm-emanuel",
            "MAYOR",
            "Rahm Emanuel",
            55_000,
        )],
    )
    .await?;

    let transformer = Transformer::new(storage.clone(), Arc::new(HeuristicNameParser::new()));
    transformer.run_all(STATE, PLACE).await?;

    let contest = &storage.all_contests()[0];
    let candidate = &storage.all_candidates()[0];
    let result = &storage.all_results()[0];

    assert_eq!(result.contest_id, contest.id.unwrap());
    assert_eq!(result.candidate_id, candidate.id.unwrap());
    assert!(result.raw_result_id.is_some());
    assert_eq!(result.votes, 55_000);
    assert_eq!(candidate.contest_id, contest.id.unwrap());
    assert_eq!(candidate.given_name.as_deref(), Some("Rahm"));
    assert_eq!(candidate.family_name.as_deref(), Some("Emanuel"));

    Ok(())
}

#[tokio::test]
async fn test_reverse_removes_everything_a_run_created() -> Result<()> {
    let storage = Arc::new(InMemoryStorage::new());
    seed(&storage, municipal_election_rows()).await?;

    let transformer = Transformer::new(storage.clone(), Arc::new(HeuristicNameParser::new()));
    transformer.run_all(STATE, PLACE).await?;
    assert!(storage.contest_count() > 0);

    let reversed = transformer.reverse_all(STATE).await?;
    assert_eq!(reversed.contests, 5);
    assert_eq!(reversed.candidates, 5);
    assert_eq!(reversed.results, 5);
    assert_eq!(storage.office_count(), 0);
    assert_eq!(storage.contest_count(), 0);
    assert_eq!(storage.candidate_count(), 0);
    assert_eq!(storage.result_count(), 0);

    Ok(())
}
