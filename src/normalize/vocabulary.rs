//! Canonical status and priority vocabularies.
//!
//! Historical submissions spell statuses many ways (`"en_cours"`,
//! `"Finalisee"`, `"Done"`...). Each table below is matched in order on the
//! lower-cased text and the first hit wins, so more specific groups come first.

use super::values::{FallbackReason, Outcome};

/// Canonical activity status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Cancelled,
    Planned,
    Finished,
    InProgress,
    Late,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Cancelled => "Annulée",
            Status::Planned => "Planifiée",
            Status::Finished => "Finalisée",
            Status::InProgress => "En cours",
            Status::Late => "Retard",
        }
    }
}

/// Status keywords in match order.
const STATUS_KEYWORDS: &[(Status, &[&str])] = &[
    (Status::Cancelled, &["annul", "cancel", "abandon"]),
    (
        Status::Planned,
        &[
            "planif",
            "planned",
            "prévu",
            "prevu",
            "à venir",
            "a venir",
            "not started",
            "non démarr",
            "non demarr",
            "pas démarr",
            "pas demarr",
        ],
    ),
    (
        Status::Finished,
        &[
            "final", "clôt", "clot", "termin", "achev", "réalis", "realis", "done", "completed",
            "closed",
        ],
    ),
    (
        Status::InProgress,
        &["cours", "progress", "ongoing", "démarr", "demarr", "started"],
    ),
    (Status::Late, &["retard", "late", "delay"]),
];

/// Canonical priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Critical => "Critique",
            Priority::High => "Élevée",
            Priority::Medium => "Moyenne",
            Priority::Low => "Faible",
        }
    }
}

const PRIORITY_KEYWORDS: &[(Priority, &[&str])] = &[
    (
        Priority::Critical,
        &["critique", "critical", "urgent", "très élev", "tres elev", "très haut", "tres haut"],
    ),
    (Priority::High, &["élev", "elev", "haut", "high"]),
    (Priority::Medium, &["moyen", "medium", "modér", "moder"]),
    (Priority::Low, &["faible", "bas", "low", "mineur"]),
];

/// Statuses that close an activity for the purpose of the overdue flag.
const CLOSED_KEYWORDS: &[&str] = &[
    "final", "clôt", "clot", "termin", "achev", "done", "completed", "annul",
];

fn classify<T: Copy>(text: &str, table: &[(T, &[&str])]) -> Option<T> {
    let lowered = text.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(canonical, _)| *canonical)
}

fn normalize_with<T: Copy>(
    text: &str,
    table: &[(T, &[&str])],
    label: fn(T) -> &'static str,
) -> Outcome<String> {
    let text = text.trim();
    if text.is_empty() {
        return Outcome::Fallback {
            value: String::new(),
            reason: FallbackReason::Missing,
        };
    }
    match classify(text, table) {
        Some(canonical) => Outcome::Parsed(label(canonical).to_string()),
        None => Outcome::Fallback {
            value: text.to_string(),
            reason: FallbackReason::Unrecognized,
        },
    }
}

/// Collapse a status spelling into the canonical vocabulary.
pub fn normalize_status(text: &str) -> Outcome<String> {
    normalize_with(text, STATUS_KEYWORDS, Status::label)
}

/// Collapse a priority spelling into the canonical vocabulary.
pub fn normalize_priority(text: &str) -> Outcome<String> {
    normalize_with(text, PRIORITY_KEYWORDS, Priority::label)
}

/// True when the status text marks the activity as finished or cancelled.
pub fn is_closed_status(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CLOSED_KEYWORDS.iter().any(|k| lowered.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(text: &str) -> String {
        normalize_status(text).into_value()
    }

    #[test]
    fn test_status_spellings() {
        assert_eq!(status("planifiee"), "Planifiée");
        assert_eq!(status("Planifiée"), "Planifiée");
        assert_eq!(status("en_cours"), "En cours");
        assert_eq!(status("In progress"), "En cours");
        assert_eq!(status("Finalisée"), "Finalisée");
        assert_eq!(status("Terminé"), "Finalisée");
        assert_eq!(status("DONE"), "Finalisée");
        assert_eq!(status("annulee"), "Annulée");
        assert_eq!(status("En retard"), "Retard");
    }

    #[test]
    fn test_status_match_order() {
        // Cancellation beats everything else.
        assert_eq!(status("Planifiée puis annulée"), "Annulée");
        // "not started" is planned even though it contains "started".
        assert_eq!(status("Not started"), "Planifiée");
        // Finished is checked before in progress.
        assert_eq!(status("terminé (en cours de rapport)"), "Finalisée");
    }

    #[test]
    fn test_status_unrecognized_passes_through() {
        let outcome = normalize_status("  Suspendue ");
        assert_eq!(outcome.value(), "Suspendue");
        assert_eq!(outcome.reason(), Some(FallbackReason::Unrecognized));
    }

    #[test]
    fn test_status_empty() {
        let outcome = normalize_status("");
        assert_eq!(outcome.value(), "");
        assert_eq!(outcome.reason(), Some(FallbackReason::Missing));
    }

    #[test]
    fn test_priority_spellings() {
        let priority = |t: &str| normalize_priority(t).into_value();
        assert_eq!(priority("critique"), "Critique");
        assert_eq!(priority("Très élevée"), "Critique");
        assert_eq!(priority("elevee"), "Élevée");
        assert_eq!(priority("High"), "Élevée");
        assert_eq!(priority("moyenne"), "Moyenne");
        assert_eq!(priority("Faible"), "Faible");
        assert_eq!(priority("low"), "Faible");
        assert_eq!(priority("P2"), "P2");
    }

    #[test]
    fn test_closed_status() {
        assert!(is_closed_status("Finalisée"));
        assert!(is_closed_status("Annulée"));
        assert!(is_closed_status("Clôturée"));
        assert!(is_closed_status("completed"));
        assert!(!is_closed_status("En cours"));
        assert!(!is_closed_status("Retard"));
        assert!(!is_closed_status(""));
    }
}
