use crate::model::{Assignment, LocationId, WorkerId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Options de résolution
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    /// Budget de temps par résolution.
    pub time_limit: Duration,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
        }
    }
}

/// Coefficients des six termes de l'objectif (minimisé).
///
/// Les termes de récompense portent un coefficient négatif.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub pay_variance: f64,
    pub preference: f64,
    pub nomination: f64,
    pub affinity: f64,
    pub avoid: f64,
    pub count_variance: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            pay_variance: 5.0,
            preference: -2.0,
            nomination: -2.0,
            affinity: -2.0,
            avoid: 3.0,
            count_variance: 5.0,
        }
    }
}

/// Profil de pondération nommé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Balanced,
    Preference,
    Affinity,
}

impl Mode {
    /// Ordre fixe de génération des plans.
    pub const ALL: [Mode; 3] = [Mode::Balanced, Mode::Preference, Mode::Affinity];

    pub fn weights(self) -> Weights {
        match self {
            Mode::Balanced => Weights {
                pay_variance: 10.0,
                preference: -1.0,
                nomination: -2.0,
                affinity: -1.0,
                avoid: 3.0,
                count_variance: 5.0,
            },
            Mode::Preference => Weights {
                pay_variance: 2.0,
                preference: -5.0,
                nomination: -3.0,
                affinity: -2.0,
                avoid: 3.0,
                count_variance: 3.0,
            },
            Mode::Affinity => Weights {
                pay_variance: 2.0,
                preference: -2.0,
                nomination: -2.0,
                affinity: -5.0,
                avoid: 3.0,
                count_variance: 3.0,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Balanced => "Plan A: pay balance",
            Mode::Preference => "Plan B: preferences",
            Mode::Affinity => "Plan C: affinity",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Balanced => "balanced",
            Mode::Preference => "preference",
            Mode::Affinity => "affinity",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Mode::Balanced),
            "preference" => Ok(Mode::Preference),
            "affinity" => Ok(Mode::Affinity),
            other => Err(PlanError::UnknownMode(other.to_string())),
        }
    }
}

/// Libellé de statut d'une résolution aboutie.
pub const STATUS_OPTIMAL: &str = "Optimal";
/// Budget de temps épuisé : meilleure solution admissible trouvée.
pub const STATUS_TIME_LIMIT: &str = "TimeLimit";
/// Arrêt sur l'écart d'optimalité toléré par le solveur.
pub const STATUS_GAP_LIMIT: &str = "GapLimit";
/// Libellé d'un planning recalculé hors solveur (édition manuelle).
pub const STATUS_MANUAL: &str = "Manual";

/// Planning résolu et ses statistiques.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub assignments: Vec<Assignment>,
    /// Gains de la période (hors report).
    pub earnings: BTreeMap<WorkerId, u64>,
    pub counts: BTreeMap<WorkerId, u32>,
    /// Écart-type (population) des gains de la période.
    pub pay_std_dev: f64,
    pub satisfaction: f64,
    pub status: String,
}

/// Planning étiqueté par son profil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub mode: Mode,
    #[serde(flatten)]
    pub schedule: Schedule,
}

/// Issue d'une résolution. Aucune n'est une erreur.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(Schedule),
    /// Aucun créneau à pourvoir : le solveur n'est pas invoqué.
    NoSlots,
    /// Contraintes dures incompatibles.
    Infeasible,
    /// Budget de temps épuisé sans aucune solution admissible.
    TimedOut,
}

impl SolveOutcome {
    pub fn into_schedule(self) -> Option<Schedule> {
        match self {
            SolveOutcome::Solved(schedule) => Some(schedule),
            _ => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Understaffed,
    Overstaffed,
    OutsideSlot,
    DoubleDuty,
    NgDate,
    NeverLocation,
    MustUnmet,
    UnknownWorker,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::Understaffed => "understaffed",
            ViolationKind::Overstaffed => "overstaffed",
            ViolationKind::OutsideSlot => "outside_slot",
            ViolationKind::DoubleDuty => "double_duty",
            ViolationKind::NgDate => "ng_date",
            ViolationKind::NeverLocation => "never_location",
            ViolationKind::MustUnmet => "must_unmet",
            ViolationKind::UnknownWorker => "unknown_worker",
        }
    }
}

/// Contrainte dure enfreinte par un planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub worker: Option<WorkerId>,
    pub location: Option<LocationId>,
    pub date: Option<NaiveDate>,
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("duplicate worker id: {0}")]
    DuplicateWorker(String),
    #[error("duplicate location id: {0}")]
    DuplicateLocation(String),
    #[error("more than one preference for worker: {0}")]
    DuplicatePreference(String),
    #[error("unknown mode: {0}")]
    UnknownMode(String),
}
