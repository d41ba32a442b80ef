use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifiant fort pour Worker
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant fort pour Location
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(String);

impl LocationId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_true() -> bool {
    true
}

/// Membre du roster susceptible de prendre une garde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Worker {
    pub fn new<I: AsRef<str>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: WorkerId::new(id),
            name: name.into(),
            active: true,
        }
    }
}

/// Cadence de récurrence d'un lieu de garde.
///
/// Une valeur inconnue à la désérialisation retombe sur `Unknown`, traité
/// comme hebdomadaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    Weekly,
    /// 1er, 3e, 5e... samedi éligible.
    BiweeklyOdd,
    /// 2e, 4e... samedi éligible.
    BiweeklyEven,
    FirstOnly,
    LastOnly,
    #[serde(other)]
    Unknown,
}

/// Lieu de garde externe (clinique, antenne...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    /// Indemnité par garde, en unités monétaires entières.
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub recurrence: Recurrence,
    /// Membres explicitement demandés par le lieu.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub nominated: BTreeSet<WorkerId>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Location {
    pub fn new<I: AsRef<str>, N: Into<String>>(id: I, name: N, fee: u64) -> Self {
        Self {
            id: LocationId::new(id),
            name: name.into(),
            fee,
            recurrence: Recurrence::Weekly,
            nominated: BTreeSet::new(),
            active: true,
        }
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_nominated<I, S>(mut self, workers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.nominated.extend(workers.into_iter().map(WorkerId::new));
        self
    }
}

/// Niveau canonique d'affinité membre/lieu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AffinityLevel {
    /// Au moins une garde sur la période.
    Must,
    Possible,
    /// Jamais affecté à ce lieu.
    Never,
    /// Poids libre, sans contrainte dure.
    Weighted(f64),
}

/// Relation pondérée (membre, lieu).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affinity {
    pub worker: WorkerId,
    pub location: LocationId,
    pub weight: f64,
}

impl Affinity {
    pub const MUST: f64 = 2.0;
    pub const POSSIBLE: f64 = 1.0;
    pub const NEVER: f64 = 0.0;

    pub fn new<W: AsRef<str>, L: AsRef<str>>(worker: W, location: L, weight: f64) -> Self {
        Self {
            worker: WorkerId::new(worker),
            location: LocationId::new(location),
            weight,
        }
    }

    pub fn level(&self) -> AffinityLevel {
        AffinityLevel::of(self.weight)
    }
}

impl AffinityLevel {
    /// Seules les trois valeurs canoniques portent une contrainte.
    #[allow(clippy::float_cmp)]
    pub fn of(weight: f64) -> Self {
        if weight == Affinity::MUST {
            AffinityLevel::Must
        } else if weight == Affinity::POSSIBLE {
            AffinityLevel::Possible
        } else if weight == Affinity::NEVER {
            AffinityLevel::Never
        } else {
            AffinityLevel::Weighted(weight)
        }
    }
}

/// Souhaits d'un membre pour la période cible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub worker: WorkerId,
    /// Dates d'indisponibilité stricte (NG).
    #[serde(default)]
    pub ng_dates: BTreeSet<NaiveDate>,
    /// Dates à éviter si possible.
    #[serde(default)]
    pub avoid_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub preferred_locations: BTreeSet<LocationId>,
}

impl Preference {
    /// Préférence vide : pleinement disponible, aucun lieu souhaité.
    pub fn new<W: AsRef<str>>(worker: W) -> Self {
        Self {
            worker: WorkerId::new(worker),
            ng_dates: BTreeSet::new(),
            avoid_dates: BTreeSet::new(),
            preferred_locations: BTreeSet::new(),
        }
    }

    pub fn with_ng(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.ng_dates.extend(dates);
        self
    }

    pub fn with_avoid(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.avoid_dates.extend(dates);
        self
    }

    pub fn with_preferred<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.preferred_locations
            .extend(locations.into_iter().map(LocationId::new));
        self
    }
}

/// Effectif requis pour un (lieu, date). 0 = fermé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOverride {
    pub location: LocationId,
    pub date: NaiveDate,
    pub required: u32,
}

impl DateOverride {
    pub fn new<L: AsRef<str>>(location: L, date: NaiveDate, required: u32) -> Self {
        Self {
            location: LocationId::new(location),
            date,
            required,
        }
    }
}

/// Créneau à pourvoir : `required` membres distincts au lieu et à la date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub location: LocationId,
    pub date: NaiveDate,
    pub required: u32,
}

/// Affectation atomique (date, lieu, membre).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assignment {
    pub date: NaiveDate,
    pub location: LocationId,
    pub worker: WorkerId,
}

impl Assignment {
    pub fn new<L: AsRef<str>, W: AsRef<str>>(date: NaiveDate, location: L, worker: W) -> Self {
        Self {
            date,
            location: LocationId::new(location),
            worker: WorkerId::new(worker),
        }
    }
}

/// Instantané complet des entrées d'une période.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub workers: Vec<Worker>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub preferences: Vec<Preference>,
    #[serde(default)]
    pub affinities: Vec<Affinity>,
    /// Gains cumulés des périodes confirmées précédentes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub previous_earnings: BTreeMap<WorkerId, u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<DateOverride>,
}

impl Snapshot {
    pub fn find_worker<'a>(&'a self, id: &WorkerId) -> Option<&'a Worker> {
        self.workers.iter().find(|w| &w.id == id)
    }
    pub fn find_location<'a>(&'a self, id: &LocationId) -> Option<&'a Location> {
        self.locations.iter().find(|l| &l.id == id)
    }
    pub fn active_workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.iter().filter(|w| w.active)
    }
    pub fn active_locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter().filter(|l| l.active)
    }

    /// Indemnité par lieu (tous lieux, actifs ou non).
    pub fn fees(&self) -> BTreeMap<LocationId, u64> {
        self.locations
            .iter()
            .map(|l| (l.id.clone(), l.fee))
            .collect()
    }
}
