//! Registre des plannings générés et confirmés, mois par mois.

use crate::calendar::YearMonth;
use crate::model::{Assignment, LocationId, WorkerId};
use crate::planner::{Mode, Plan, Schedule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BookError {
    #[error("unknown schedule: {0}")]
    UnknownSchedule(String),
    #[error("schedule is confirmed: {0}")]
    Confirmed(String),
    #[error("duplicate schedule id: {0}")]
    DuplicateId(String),
    #[error("several confirmed schedules for {0}")]
    SeveralConfirmed(YearMonth),
}

/// Planning enregistré pour un mois.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSchedule {
    pub id: String,
    pub month: YearMonth,
    pub name: String,
    #[serde(default)]
    pub mode: Option<Mode>,
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub pay_std_dev: f64,
    #[serde(default)]
    pub satisfaction: f64,
    #[serde(default)]
    pub confirmed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Ensemble des plannings connus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleBook {
    #[serde(default)]
    pub schedules: Vec<SavedSchedule>,
}

impl ScheduleBook {
    pub fn find(&self, id: &str) -> Option<&SavedSchedule> {
        self.schedules.iter().find(|s| s.id == id)
    }

    fn position(&self, id: &str) -> Result<usize, BookError> {
        self.schedules
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| BookError::UnknownSchedule(id.to_string()))
    }

    /// Identifiants uniques, au plus un planning confirmé par mois.
    pub fn integrity(&self) -> Result<(), BookError> {
        let mut ids = BTreeSet::new();
        let mut confirmed = BTreeSet::new();
        for s in &self.schedules {
            if !ids.insert(s.id.as_str()) {
                return Err(BookError::DuplicateId(s.id.clone()));
            }
            if s.confirmed && !confirmed.insert(s.month) {
                return Err(BookError::SeveralConfirmed(s.month));
            }
        }
        Ok(())
    }

    /// Plannings d'un mois, dans l'ordre d'enregistrement.
    pub fn month(&self, month: YearMonth) -> Vec<&SavedSchedule> {
        self.schedules.iter().filter(|s| s.month == month).collect()
    }

    /// Enregistre un plan ; un plan du même nom pour le même mois est
    /// remplacé (et redevient non confirmé). Renvoie l'identifiant.
    pub fn save_plan(&mut self, month: YearMonth, plan: &Plan, now: DateTime<Utc>) -> String {
        let existing = self
            .schedules
            .iter_mut()
            .find(|s| s.month == month && s.name == plan.name);
        match existing {
            Some(saved) => {
                saved.mode = Some(plan.mode);
                fill(saved, &plan.schedule, now);
                saved.confirmed = false;
                saved.id.clone()
            }
            None => {
                let id = Uuid::new_v4().to_string();
                let mut saved = SavedSchedule {
                    id: id.clone(),
                    month,
                    name: plan.name.clone(),
                    mode: Some(plan.mode),
                    assignments: Vec::new(),
                    pay_std_dev: 0.0,
                    satisfaction: 0.0,
                    confirmed: false,
                    updated_at: now,
                };
                fill(&mut saved, &plan.schedule, now);
                self.schedules.push(saved);
                id
            }
        }
    }

    /// Confirme un planning ; les autres plannings du mois sont déconfirmés.
    pub fn confirm(&mut self, id: &str) -> Result<(), BookError> {
        let pos = self.position(id)?;
        let month = self.schedules[pos].month;
        for s in self.schedules.iter_mut().filter(|s| s.month == month) {
            s.confirmed = false;
        }
        self.schedules[pos].confirmed = true;
        Ok(())
    }

    /// Supprime un planning non confirmé.
    pub fn delete(&mut self, id: &str) -> Result<SavedSchedule, BookError> {
        let pos = self.position(id)?;
        if self.schedules[pos].confirmed {
            return Err(BookError::Confirmed(id.to_string()));
        }
        Ok(self.schedules.remove(pos))
    }

    /// Remplace les affectations après retouche manuelle.
    pub fn update(&mut self, id: &str, schedule: &Schedule, now: DateTime<Utc>) -> Result<(), BookError> {
        let pos = self.position(id)?;
        fill(&mut self.schedules[pos], schedule, now);
        Ok(())
    }

    /// Gains cumulés par membre sur les plannings confirmés des mois
    /// strictement antérieurs à `before`, avec la liste des mois pris en compte.
    pub fn previous_earnings(
        &self,
        fees: &BTreeMap<LocationId, u64>,
        before: YearMonth,
    ) -> (BTreeMap<WorkerId, u64>, Vec<YearMonth>) {
        let mut earnings: BTreeMap<WorkerId, u64> = BTreeMap::new();
        let mut months = BTreeSet::new();
        for s in self
            .schedules
            .iter()
            .filter(|s| s.confirmed && s.month < before)
        {
            months.insert(s.month);
            for a in &s.assignments {
                let fee = fees.get(&a.location).copied().unwrap_or(0);
                *earnings.entry(a.worker.clone()).or_default() += fee;
            }
        }
        (earnings, months.into_iter().collect())
    }
}

fn fill(saved: &mut SavedSchedule, schedule: &Schedule, now: DateTime<Utc>) {
    saved.assignments = schedule.assignments.clone();
    saved.pay_std_dev = schedule.pay_std_dev;
    saved.satisfaction = schedule.satisfaction;
    saved.updated_at = now;
}
