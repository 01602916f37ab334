//! Data models for submissions and normalized activities.
//!
//! Raw submissions are kept as untyped JSON maps: their shape changed every
//! time the survey form was revised, so no fixed struct can describe them.
//! [`Activity`] is the opposite: a fixed schema that the dashboard reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single survey submission exactly as the API returned it.
///
/// Keys may contain slashes for grouped questions (e.g. `"grp_planif/titre"`).
pub type RawSubmission = Map<String, Value>;

/// One page of the KoboToolbox `data` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPage {
    /// Total number of submissions reported by the server (all pages).
    #[serde(default)]
    pub count: Option<u64>,

    /// Absolute URL of the following page, `None` on the last page.
    #[serde(default)]
    pub next: Option<String>,

    /// Absolute URL of the preceding page.
    #[serde(default)]
    pub previous: Option<String>,

    /// Records on this page. Kept as raw values; rows that are not objects are
    /// dropped later by the normalizer, not here.
    #[serde(default)]
    pub results: Vec<Value>,
}

/// All pages concatenated into one page-shaped document.
///
/// `next` and `previous` are always `null` so the file reads like a single
/// terminal page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedSubmissions {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Value>,
}

impl ConsolidatedSubmissions {
    /// Consolidate accumulated results, preferring the server-reported total.
    pub fn new(reported_count: Option<u64>, results: Vec<Value>) -> Self {
        let count = reported_count.unwrap_or(results.len() as u64);
        Self {
            count,
            next: None,
            previous: None,
            results,
        }
    }
}

/// A normalized activity record, one per well-formed submission.
///
/// Optional text fields are always strings (empty when absent); only `id` and
/// the two percentages may be `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Server-assigned identifier, number or string as received.
    pub id: Value,
    pub uuid: String,
    pub instance_id: String,

    pub start: String,
    pub end: String,
    pub submission_time: String,
    pub date_mise_a_jour: String,

    pub code_activite: String,
    pub titre: String,
    pub objectif: String,
    pub livrable_attendu: String,
    pub type_activite: String,
    pub pilier: String,
    pub bureau: String,
    pub responsable: String,

    /// Canonical priority label, or the original text when unrecognized.
    pub risque_priorite: String,
    /// Units involved, de-duplicated in first-seen order.
    pub unites_impliquees: Vec<String>,

    pub statut_planificateur: String,
    pub statut_suivi: String,

    /// Progress reported by the field team, clamped to [0, 100].
    pub avancement_pct: Option<f64>,
    /// Progress computed by the form; preferred by the dashboard when present.
    pub taux_avancement_calc: Option<f64>,

    /// `YYYY-MM-DD` or empty.
    pub date_debut: String,
    /// `YYYY-MM-DD` or empty.
    pub date_fin: String,

    pub commentaire_suivi: String,
    pub commentaire_validation: String,
    pub validation: String,

    /// 1 when `date_fin` has passed and no closing status is set, else 0.
    pub overdue: u8,
}

impl Activity {
    /// Status shown when a single status is needed: tracking before planning.
    pub fn display_status(&self) -> &str {
        preferred_status(&self.statut_suivi, &self.statut_planificateur)
    }
}

/// Tracking status when set, else the planning status.
pub fn preferred_status<'a>(statut_suivi: &'a str, statut_planificateur: &'a str) -> &'a str {
    if statut_suivi.is_empty() {
        statut_planificateur
    } else {
        statut_suivi
    }
}
