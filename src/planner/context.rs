use super::slots::{IndexedSlot, Staffing};
use super::types::PlanError;
use crate::model::{
    AffinityLevel, Location, LocationId, Preference, Snapshot, Worker, WorkerId,
};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Tables de correspondance construites une fois par instantané.
///
/// Les membres et lieux inactifs sont écartés ; les positions (`usize`)
/// indexent `workers` et `locations`.
#[derive(Debug)]
pub(crate) struct Context<'a> {
    pub workers: Vec<&'a Worker>,
    pub locations: Vec<&'a Location>,
    worker_pos: HashMap<&'a WorkerId, usize>,
    location_pos: HashMap<&'a LocationId, usize>,
    preferences: Vec<Option<&'a Preference>>,
    affinity: HashMap<(usize, usize), f64>,
    previous: Vec<u64>,
    staffing: Staffing<'a>,
}

impl<'a> Context<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Result<Self, PlanError> {
        let mut seen = HashSet::new();
        for w in &snapshot.workers {
            if !seen.insert(&w.id) {
                return Err(PlanError::DuplicateWorker(w.id.as_str().to_string()));
            }
        }
        let mut seen = HashSet::new();
        for l in &snapshot.locations {
            if !seen.insert(&l.id) {
                return Err(PlanError::DuplicateLocation(l.id.as_str().to_string()));
            }
        }

        let workers: Vec<&'a Worker> = snapshot.active_workers().collect();
        let locations: Vec<&'a Location> = snapshot.active_locations().collect();
        let worker_pos: HashMap<&'a WorkerId, usize> = workers
            .iter()
            .copied()
            .enumerate()
            .map(|(i, w)| (&w.id, i))
            .collect();
        let location_pos: HashMap<&'a LocationId, usize> = locations
            .iter()
            .copied()
            .enumerate()
            .map(|(i, l)| (&l.id, i))
            .collect();

        let mut preferences: Vec<Option<&'a Preference>> = vec![None; workers.len()];
        for p in &snapshot.preferences {
            let Some(&w) = worker_pos.get(&p.worker) else {
                debug!(worker = %p.worker, "ignoring preference of unknown or inactive worker");
                continue;
            };
            if preferences[w].replace(p).is_some() {
                return Err(PlanError::DuplicatePreference(p.worker.as_str().to_string()));
            }
        }

        let mut affinity = HashMap::new();
        for a in &snapshot.affinities {
            match (worker_pos.get(&a.worker), location_pos.get(&a.location)) {
                (Some(&w), Some(&l)) => {
                    affinity.insert((w, l), a.weight);
                }
                _ => debug!(
                    worker = %a.worker,
                    location = %a.location,
                    "ignoring affinity outside the active roster"
                ),
            }
        }

        let previous = workers
            .iter()
            .map(|w| snapshot.previous_earnings.get(&w.id).copied().unwrap_or(0))
            .collect();

        Ok(Self {
            workers,
            locations,
            worker_pos,
            location_pos,
            preferences,
            affinity,
            previous,
            staffing: Staffing::new(&snapshot.overrides),
        })
    }

    pub fn worker_index(&self, id: &WorkerId) -> Option<usize> {
        self.worker_pos.get(id).copied()
    }

    pub fn location_index(&self, id: &LocationId) -> Option<usize> {
        self.location_pos.get(id).copied()
    }

    pub fn is_ng(&self, worker: usize, date: NaiveDate) -> bool {
        self.preferences[worker].is_some_and(|p| p.ng_dates.contains(&date))
    }

    pub fn is_avoid(&self, worker: usize, date: NaiveDate) -> bool {
        self.preferences[worker].is_some_and(|p| p.avoid_dates.contains(&date))
    }

    /// Le membre a demandé ce lieu.
    pub fn prefers(&self, worker: usize, location: usize) -> bool {
        let id = &self.locations[location].id;
        self.preferences[worker].is_some_and(|p| p.preferred_locations.contains(id))
    }

    /// Le lieu a demandé ce membre.
    pub fn nominated(&self, worker: usize, location: usize) -> bool {
        self.locations[location]
            .nominated
            .contains(&self.workers[worker].id)
    }

    pub fn affinity(&self, worker: usize, location: usize) -> Option<f64> {
        self.affinity.get(&(worker, location)).copied()
    }

    pub fn level(&self, worker: usize, location: usize) -> Option<AffinityLevel> {
        self.affinity(worker, location).map(AffinityLevel::of)
    }

    /// Paires (membre, lieu) d'affinité MUST, triées.
    pub fn must_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = self
            .affinity
            .iter()
            .filter(|(_, w)| AffinityLevel::of(**w) == AffinityLevel::Must)
            .map(|(pair, _)| *pair)
            .collect();
        pairs.sort_unstable();
        pairs
    }

    pub fn fee(&self, location: usize) -> u64 {
        self.locations[location].fee
    }

    pub fn all_fees_zero(&self) -> bool {
        self.locations.iter().all(|l| l.fee == 0)
    }

    pub fn previous(&self, worker: usize) -> u64 {
        self.previous[worker]
    }

    pub fn slots(&self, dates: &[NaiveDate]) -> Vec<IndexedSlot> {
        self.locations
            .iter()
            .enumerate()
            .flat_map(|(l, loc)| {
                self.staffing
                    .slots_for(loc, dates)
                    .into_iter()
                    .map(move |slot| IndexedSlot { slot, location: l })
            })
            .collect()
    }
}
