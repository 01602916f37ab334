//! The alias table: every raw field name that may carry each activity field.
//!
//! The survey form was revised several times and old submissions keep the
//! field names of their revision. Aliases are listed newest first: grouped
//! names (`grp_*/...`), then legacy flat names, then legacy display labels.
//! Adding a new form revision means adding its names here and nowhere else.

use serde_json::Value;

use super::values::is_present;
use crate::model::RawSubmission;

/// A logical source field of an [`crate::model::Activity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Uuid,
    InstanceId,
    Start,
    End,
    SubmissionTime,
    DateMiseAJour,
    CodeActivite,
    Titre,
    Objectif,
    LivrableAttendu,
    TypeActivite,
    Pilier,
    Bureau,
    Responsable,
    RisquePriorite,
    UnitesAutres,
    StatutPlanificateur,
    StatutSuivi,
    AvancementPct,
    TauxAvancementCalc,
    DateDebut,
    DateFin,
    CommentaireSuivi,
    CommentaireValidation,
    Validation,
    ValidationStatus,
}

impl Field {
    /// Raw field names probed for this field, in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Id => &["record_id", "_id", "id"],
            Field::Uuid => &["_uuid", "uuid", "meta/rootUuid"],
            Field::InstanceId => &["meta/instanceID", "instanceID", "_instance_id"],
            Field::Start => &["start", "_start"],
            Field::End => &["end", "_end"],
            Field::SubmissionTime => &["_submission_time", "submission_time"],
            Field::DateMiseAJour => &[
                "grp_suivi/date_mise_a_jour",
                "date_mise_a_jour",
                "Date de mise à jour",
            ],
            Field::CodeActivite => &[
                "grp_planif/code_activite",
                "code_activite",
                "Code activité",
                "Code activite",
            ],
            Field::Titre => &[
                "grp_planif/titre",
                "grp_planif/titre_activite",
                "titre",
                "titre_activite",
                "Activités",
                "Activite",
                "activity",
            ],
            Field::Objectif => &["grp_planif/objectif", "objectif", "Objectif"],
            Field::LivrableAttendu => &[
                "grp_planif/livrable_attendu",
                "livrable_attendu",
                "Livrable attendu",
            ],
            Field::TypeActivite => &[
                "grp_planif/type_activite",
                "type_activite",
                "Type d'activité",
                "Type",
                "type",
            ],
            Field::Pilier => &["grp_planif/pilier", "pilier", "Piliers", "Pilier", "pillar"],
            Field::Bureau => &["grp_planif/bureau", "bureau", "Bureau"],
            Field::Responsable => &[
                "grp_planif/responsable",
                "responsable",
                "Responsable",
                "owner",
            ],
            Field::RisquePriorite => &[
                "grp_planif/risque_priorite",
                "risque_priorite",
                "Risque / Priorité",
                "Priorité",
                "priorite",
            ],
            Field::UnitesAutres => &[
                "grp_planif/unites_autres",
                "unites_autres",
                "Autres unités",
            ],
            Field::StatutPlanificateur => &[
                "grp_planif/statut_planificateur",
                "statut_planificateur",
                "Statut planificateur",
                "Statut",
                "status",
            ],
            Field::StatutSuivi => &["grp_suivi/statut_suivi", "statut_suivi", "Statut suivi"],
            Field::AvancementPct => &[
                "grp_suivi/avancement_pct",
                "grp_suivi/niveau_avancement",
                "avancement_pct",
                "Niveau d'avancement (%)",
            ],
            Field::TauxAvancementCalc => &["grp_suivi/taux_avancement_calc", "taux_avancement_calc"],
            Field::DateDebut => &[
                "grp_planif/date_debut",
                "date_debut",
                "Date de début",
                "start_date",
            ],
            Field::DateFin => &[
                "grp_planif/date_fin",
                "date_fin",
                "Date de fin",
                "Date d’échéance",
                "Date d'échéance",
                "date_echeance",
                "end_date",
            ],
            Field::CommentaireSuivi => &[
                "grp_suivi/commentaire_suivi",
                "commentaire_suivi",
                "Suivi/Commentaires",
                "Suivi",
                "Commentaires",
                "notes",
            ],
            Field::CommentaireValidation => &[
                "grp_validation/commentaire_validation",
                "commentaire_validation",
                "Commentaire validation",
            ],
            Field::Validation => &["grp_validation/validation", "validation", "Validation"],
            Field::ValidationStatus => &["_validation_status", "validation_status"],
        }
    }
}

/// An organizational unit that has its own yes/no column on the form.
#[derive(Debug, Clone, Copy)]
pub struct UnitFlag {
    /// Label emitted in `unites_impliquees`.
    pub label: &'static str,
    /// Flag columns for this unit, newest first.
    pub aliases: &'static [&'static str],
}

/// Named units, in the order they are appended to `unites_impliquees`.
pub const UNIT_FLAGS: &[UnitFlag] = &[
    UnitFlag {
        label: "Direction générale",
        aliases: &[
            "grp_planif/unite_direction",
            "unite_direction",
            "Unités impliquées/Direction générale",
        ],
    },
    UnitFlag {
        label: "Programmes",
        aliases: &[
            "grp_planif/unite_programmes",
            "unite_programmes",
            "Unités impliquées/Programmes",
        ],
    },
    UnitFlag {
        label: "Finances",
        aliases: &[
            "grp_planif/unite_finances",
            "unite_finances",
            "Unités impliquées/Finances",
        ],
    },
    UnitFlag {
        label: "Logistique",
        aliases: &[
            "grp_planif/unite_logistique",
            "unite_logistique",
            "Unités impliquées/Logistique",
        ],
    },
    UnitFlag {
        label: "Ressources humaines",
        aliases: &[
            "grp_planif/unite_rh",
            "unite_rh",
            "Unités impliquées/Ressources humaines",
        ],
    },
    UnitFlag {
        label: "Suivi-évaluation",
        aliases: &[
            "grp_planif/unite_suivi_evaluation",
            "unite_suivi_evaluation",
            "Unités impliquées/Suivi-évaluation",
        ],
    },
    UnitFlag {
        label: "Communication",
        aliases: &[
            "grp_planif/unite_communication",
            "unite_communication",
            "Unités impliquées/Communication",
        ],
    },
];

/// First alias present in the record with a non-empty value.
pub fn first_present<'a>(record: &'a RawSubmission, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find(|value| is_present(value))
}

/// Resolve a logical field against a raw record.
pub fn resolve(record: &RawSubmission, field: Field) -> Option<&Value> {
    first_present(record, field.aliases())
}
