//! The two stages wired to their files.
//!
//! `fetch` writes the consolidated submissions file; `transform` reads it and
//! writes the activities file. Either can run alone, so a transform can be
//! replayed on an old snapshot without touching the network.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::data_sources::KoboClient;
use crate::normalize::normalize_batch;
use crate::storage::{read_json, write_json_atomic};

/// Outcome of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    /// Records actually received.
    pub records: usize,
    /// Total reported by the server (or `records` when not reported).
    pub reported_count: u64,
    pub output: PathBuf,
}

/// Outcome of a successful transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSummary {
    pub activities: usize,
    /// Input rows dropped because they were not records.
    pub skipped: usize,
    pub overdue: usize,
    /// Distinct status/priority texts kept verbatim for review.
    pub unrecognized: usize,
    pub output: PathBuf,
}

/// Fetch every submission of `asset_uid` and store them at `output`.
///
/// Nothing is written unless every page was fetched.
#[instrument(skip_all, fields(asset_uid = %asset_uid, output = %output.display()))]
pub async fn run_fetch(
    client: &KoboClient,
    asset_uid: &str,
    output: &Path,
) -> anyhow::Result<FetchSummary> {
    let submissions = client
        .fetch_asset(asset_uid)
        .await
        .with_context(|| format!("fetching submissions for asset {asset_uid}"))?;

    write_json_atomic(output, &submissions).context("writing submissions")?;

    if submissions.count != submissions.results.len() as u64 {
        warn!(
            reported = submissions.count,
            received = submissions.results.len(),
            "Server count differs from records received"
        );
    }

    let summary = FetchSummary {
        records: submissions.results.len(),
        reported_count: submissions.count,
        output: output.to_path_buf(),
    };
    info!(records = summary.records, "Submissions saved");
    Ok(summary)
}

/// Normalize the submissions at `input` into activities at `output`.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn run_transform(input: &Path, output: &Path, today: NaiveDate) -> anyhow::Result<TransformSummary> {
    let raw = read_json(input).context("reading submissions")?;
    let batch = normalize_batch(&raw, today).context("normalizing submissions")?;

    write_json_atomic(output, &batch.activities).context("writing activities")?;

    let summary = TransformSummary {
        activities: batch.activities.len(),
        skipped: batch.skipped,
        overdue: batch.activities.iter().filter(|a| a.overdue == 1).count(),
        unrecognized: batch.unrecognized.len(),
        output: output.to_path_buf(),
    };
    info!(
        activities = summary.activities,
        skipped = summary.skipped,
        overdue = summary.overdue,
        unrecognized = summary.unrecognized,
        "Activities saved"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use serde_json::json;
    use std::fs;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_transform_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_transform(
            &dir.path().join("submissions.json"),
            &dir.path().join("activities.json"),
            today(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::InputNotFound(_))
        ));
        assert!(!dir.path().join("activities.json").exists());
    }

    #[test]
    fn test_transform_writes_sorted_activities() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("submissions.json");
        let output = dir.path().join("activities.json");
        fs::write(
            &input,
            json!({
                "count": 3,
                "next": null,
                "previous": null,
                "results": [
                    {"_id": 1, "code_activite": "B", "date_debut": "2024-03-01", "date_fin": "2024-04-01"},
                    {"_id": 2, "code_activite": "A", "date_debut": "2024-03-01", "statut_suivi": "done"},
                    null
                ]
            })
            .to_string(),
        )
        .unwrap();

        let summary = run_transform(&input, &output, today()).unwrap();
        assert_eq!(summary.activities, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.overdue, 1);

        let written = read_json(&output).unwrap();
        assert_eq!(written[0]["code_activite"], "A");
        assert_eq!(written[0]["statut_suivi"], "Finalisée");
        assert_eq!(written[1]["overdue"], 1);
    }

    #[test]
    fn test_transform_rejects_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("submissions.json");
        fs::write(&input, "42").unwrap();

        let err = run_transform(&input, &dir.path().join("out.json"), today()).unwrap_err();
        assert!(err.downcast_ref::<crate::error::NormalizeError>().is_some());
    }
}
