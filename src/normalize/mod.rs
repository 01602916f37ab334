//! Turns raw survey submissions into [`Activity`] records.
//!
//! The transform is pure: no I/O, no clock. "Today" is passed in so the
//! overdue flag is reproducible.
//!
//! # Pipeline
//!
//! 1. Accept a bare list of records or a page-shaped object with `results`.
//! 2. Skip rows that are not JSON objects.
//! 3. Resolve each field through the [`aliases`] table and normalize its value.
//! 4. Derive `unites_impliquees` and `overdue`.
//! 5. Stable-sort by start date (empty last), then activity code.

pub mod aliases;
pub mod values;
pub mod vocabulary;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::NormalizeError;
use crate::model::{Activity, RawSubmission, preferred_status};

use aliases::{Field, UNIT_FLAGS, first_present, resolve};
use values::{
    FallbackReason, Outcome, flag_value, normalize_date, normalize_datetime, normalize_text,
    parse_percentage, text_of,
};
use vocabulary::{is_closed_status, normalize_priority, normalize_status};

/// A status or priority text that matched nothing in the vocabulary.
///
/// These are kept verbatim in the output and reported so someone can decide
/// whether the vocabulary needs a new keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedValue {
    pub field: Field,
    pub text: String,
}

/// Result of normalizing a whole input document.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    /// Sorted activities, one per well-formed input row.
    pub activities: Vec<Activity>,
    /// Rows skipped because they were not JSON objects.
    pub skipped: usize,
    /// Distinct unrecognized status/priority texts, in first-seen order.
    pub unrecognized: Vec<UnrecognizedValue>,
}

/// Normalize an input document into sorted activities.
pub fn normalize(input: &Value, today: NaiveDate) -> Result<Vec<Activity>, NormalizeError> {
    normalize_batch(input, today).map(|batch| batch.activities)
}

/// Normalize an input document, also reporting skipped rows and vocabulary
/// misses.
pub fn normalize_batch(input: &Value, today: NaiveDate) -> Result<NormalizedBatch, NormalizeError> {
    let rows = input_rows(input)?;

    let mut activities = Vec::with_capacity(rows.len());
    let mut unrecognized: Vec<UnrecognizedValue> = Vec::new();
    let mut skipped = 0;

    for (index, row) in rows.iter().enumerate() {
        let Value::Object(record) = row else {
            debug!(index, "Skipping row that is not a JSON object");
            skipped += 1;
            continue;
        };

        let mut builder = RecordNormalizer::new(record, today);
        activities.push(builder.build());

        for miss in builder.unrecognized {
            if !unrecognized.contains(&miss) {
                warn!(field = ?miss.field, text = %miss.text, "Unrecognized value kept as-is");
                unrecognized.push(miss);
            }
        }
    }

    sort_activities(&mut activities);

    Ok(NormalizedBatch {
        activities,
        skipped,
        unrecognized,
    })
}

/// Normalize a single record.
pub fn normalize_record(record: &RawSubmission, today: NaiveDate) -> Activity {
    RecordNormalizer::new(record, today).build()
}

fn input_rows(input: &Value) -> Result<&[Value], NormalizeError> {
    match input {
        Value::Array(rows) => Ok(rows.as_slice()),
        Value::Object(page) => match page.get("results") {
            Some(Value::Array(rows)) => Ok(rows.as_slice()),
            Some(_) => Err(NormalizeError::InvalidInput {
                found: "an object whose \"results\" is not an array",
            }),
            None => Err(NormalizeError::InvalidInput {
                found: "an object without \"results\"",
            }),
        },
        Value::Null => Err(NormalizeError::InvalidInput { found: "null" }),
        Value::Bool(_) => Err(NormalizeError::InvalidInput { found: "a boolean" }),
        Value::Number(_) => Err(NormalizeError::InvalidInput { found: "a number" }),
        Value::String(_) => Err(NormalizeError::InvalidInput { found: "a string" }),
    }
}

/// Builds one activity and remembers which texts fell outside the vocabulary.
struct RecordNormalizer<'a> {
    record: &'a RawSubmission,
    today: NaiveDate,
    unrecognized: Vec<UnrecognizedValue>,
}

impl<'a> RecordNormalizer<'a> {
    fn new(record: &'a RawSubmission, today: NaiveDate) -> Self {
        Self {
            record,
            today,
            unrecognized: Vec::new(),
        }
    }

    fn get(&self, field: Field) -> Option<&'a Value> {
        resolve(self.record, field)
    }

    fn text(&self, field: Field) -> String {
        normalize_text(self.get(field))
    }

    fn date(&self, field: Field) -> String {
        normalize_date(self.get(field)).into_value()
    }

    fn datetime(&self, field: Field) -> String {
        normalize_datetime(self.get(field)).into_value()
    }

    fn percentage(&self, field: Field) -> Option<f64> {
        parse_percentage(self.get(field)).into_value()
    }

    /// Map through a vocabulary, noting texts it does not know.
    fn vocabulary(&mut self, field: Field, normalize: fn(&str) -> Outcome<String>) -> String {
        let outcome = normalize(&self.text(field));
        if outcome.reason() == Some(FallbackReason::Unrecognized) {
            self.unrecognized.push(UnrecognizedValue {
                field,
                text: outcome.value().clone(),
            });
        }
        outcome.into_value()
    }

    fn build(&mut self) -> Activity {
        let statut_planificateur = self.vocabulary(Field::StatutPlanificateur, normalize_status);
        let statut_suivi = self.vocabulary(Field::StatutSuivi, normalize_status);
        let risque_priorite = self.vocabulary(Field::RisquePriorite, normalize_priority);
        let date_fin = self.date(Field::DateFin);
        let overdue = compute_overdue(
            &date_fin,
            preferred_status(&statut_suivi, &statut_planificateur),
            self.today,
        );

        Activity {
            id: self.get(Field::Id).cloned().unwrap_or(Value::Null),
            uuid: self.text(Field::Uuid),
            instance_id: self.text(Field::InstanceId),
            start: self.datetime(Field::Start),
            end: self.datetime(Field::End),
            submission_time: self.datetime(Field::SubmissionTime),
            date_mise_a_jour: self.datetime(Field::DateMiseAJour),
            code_activite: self.text(Field::CodeActivite),
            titre: self.text(Field::Titre),
            objectif: self.text(Field::Objectif),
            livrable_attendu: self.text(Field::LivrableAttendu),
            type_activite: self.text(Field::TypeActivite),
            pilier: self.text(Field::Pilier),
            bureau: self.text(Field::Bureau),
            responsable: self.text(Field::Responsable),
            risque_priorite,
            unites_impliquees: self.units(),
            statut_planificateur,
            statut_suivi,
            avancement_pct: self.percentage(Field::AvancementPct),
            taux_avancement_calc: self.percentage(Field::TauxAvancementCalc),
            date_debut: self.date(Field::DateDebut),
            date_fin,
            commentaire_suivi: self.text(Field::CommentaireSuivi),
            commentaire_validation: self.text(Field::CommentaireValidation),
            validation: self.validation(),
            overdue,
        }
    }

    /// Free-text "other units" first, then every flagged named unit.
    fn units(&self) -> Vec<String> {
        let mut units: Vec<String> = Vec::new();

        let other = self.text(Field::UnitesAutres);
        if !other.is_empty() {
            units.push(other);
        }

        for unit in UNIT_FLAGS {
            if flag_value(first_present(self.record, unit.aliases)) == 1 {
                units.push(unit.label.to_string());
            }
        }

        let mut seen = Vec::with_capacity(units.len());
        units.retain(|unit| {
            if seen.contains(unit) {
                false
            } else {
                seen.push(unit.clone());
                true
            }
        });
        units
    }

    /// Direct validation field, else the label (or uid) of the validation
    /// status object.
    fn validation(&self) -> String {
        let direct = self.text(Field::Validation);
        if !direct.is_empty() {
            return direct;
        }

        let Some(Value::Object(status)) = self.get(Field::ValidationStatus) else {
            return String::new();
        };
        first_present(status, &["label", "uid"])
            .and_then(text_of)
            .unwrap_or_default()
    }
}

/// 1 when `date_fin` is a real date before `today` and `status` is not closed.
///
/// An empty or unparseable end date never counts as overdue.
pub fn compute_overdue(date_fin: &str, status: &str, today: NaiveDate) -> u8 {
    let Ok(end) = NaiveDate::parse_from_str(date_fin, "%Y-%m-%d") else {
        return 0;
    };
    if is_closed_status(status) {
        return 0;
    }
    u8::from(end < today)
}

/// Stable sort by `date_debut` (empty last), then `code_activite`.
pub fn sort_activities(activities: &mut [Activity]) {
    activities.sort_by(|a, b| {
        (a.date_debut.is_empty(), &a.date_debut, &a.code_activite).cmp(&(
            b.date_debut.is_empty(),
            &b.date_debut,
            &b.code_activite,
        ))
    });
}
