mod constraints;
mod context;
mod objective;
mod plans;
mod slots;
mod solve;
mod types;
mod violations;

pub use slots::build_slots;
pub use types::{
    Mode, Plan, PlanError, PlanOptions, Schedule, SolveOutcome, Violation, ViolationKind,
    Weights, STATUS_GAP_LIMIT, STATUS_MANUAL, STATUS_OPTIMAL, STATUS_TIME_LIMIT,
};

use crate::calendar::{self, YearMonth};
use crate::holidays::HolidayCalendar;
use crate::model::{Assignment, Slot, Snapshot};
use chrono::NaiveDate;
use context::Context;

/// Planner : encapsule l'instantané d'une période et ses dates de garde.
///
/// Chaque résolution reconstruit son propre modèle à partir de l'instantané,
/// qui n'est jamais modifié.
#[derive(Debug, Clone)]
pub struct Planner {
    snapshot: Snapshot,
    dates: Vec<NaiveDate>,
    options: PlanOptions,
}

impl Planner {
    pub fn new(snapshot: Snapshot, dates: Vec<NaiveDate>) -> Self {
        Self {
            snapshot,
            dates,
            options: PlanOptions::default(),
        }
    }

    /// Planner sur les samedis non fériés de `period`.
    pub fn for_month(snapshot: Snapshot, period: YearMonth, holidays: &dyn HolidayCalendar) -> Self {
        Self::new(snapshot, calendar::saturdays(period, holidays))
    }

    pub fn with_options(mut self, options: PlanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }
    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Créneaux à pourvoir (lieux actifs uniquement).
    pub fn slots(&self) -> Result<Vec<Slot>, PlanError> {
        let ctx = Context::new(&self.snapshot)?;
        Ok(ctx.slots(&self.dates).into_iter().map(|s| s.slot).collect())
    }

    pub fn solve(&self, mode: Mode) -> Result<SolveOutcome, PlanError> {
        self.solve_weighted(&mode.weights())
    }

    /// Résolution avec des coefficients arbitraires.
    pub fn solve_weighted(&self, weights: &Weights) -> Result<SolveOutcome, PlanError> {
        let ctx = Context::new(&self.snapshot)?;
        let slots = ctx.slots(&self.dates);
        solve::run(&ctx, &slots, weights, self.options.time_limit)
    }

    pub fn generate_plans(&self) -> Result<Vec<Plan>, PlanError> {
        plans::generate(self)
    }

    /// Vérifie un planning (par exemple retouché à la main).
    pub fn check(&self, assignments: &[Assignment]) -> Result<Vec<Violation>, PlanError> {
        let ctx = Context::new(&self.snapshot)?;
        let slots = ctx.slots(&self.dates);
        Ok(violations::detect(&ctx, &slots, assignments))
    }

    /// Recalcule les statistiques d'un planning retouché.
    pub fn summarize(&self, assignments: Vec<Assignment>) -> Result<Schedule, PlanError> {
        let ctx = Context::new(&self.snapshot)?;
        Ok(solve::summarize(&ctx, assignments, STATUS_MANUAL))
    }
}
