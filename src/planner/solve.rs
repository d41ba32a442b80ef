use super::constraints::{self, DecisionModel};
use super::context::Context;
use super::objective;
use super::slots::IndexedSlot;
use super::types::{
    PlanError, Schedule, SolveOutcome, Weights, STATUS_GAP_LIMIT, STATUS_OPTIMAL,
    STATUS_TIME_LIMIT,
};
use super::violations;
use crate::model::Assignment;
use good_lp::solvers::highs::highs;
use good_lp::solvers::{SolutionStatus, WithTimeLimit};
use good_lp::{ResolutionError, Solution, SolverModel, Variable};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Seuil d'arrondi des variables binaires.
const ON: f64 = 0.5;

pub(super) fn run(
    ctx: &Context<'_>,
    slots: &[IndexedSlot],
    weights: &Weights,
    time_limit: Duration,
) -> Result<SolveOutcome, PlanError> {
    if slots.is_empty() {
        debug!("no slot to staff, solver skipped");
        return Ok(SolveOutcome::NoSlots);
    }
    if ctx.workers.is_empty() {
        warn!(slots = slots.len(), "no active worker for a non-empty slot set");
        return Ok(SolveOutcome::Infeasible);
    }
    if let Some((w, l)) = constraints::unreachable_must(ctx, slots) {
        warn!(
            worker = %ctx.workers[w].id,
            location = %ctx.locations[l].id,
            "MUST location has no slot in the period"
        );
        return Ok(SolveOutcome::Infeasible);
    }

    let mut model = constraints::build(ctx, slots);
    let goal = objective::compose(ctx, &mut model, slots, weights);
    debug!(
        workers = ctx.workers.len(),
        slots = slots.len(),
        constraints = model.constraints.len(),
        "model built"
    );

    let DecisionModel {
        vars,
        x,
        constraints,
    } = model;
    let decisions: Vec<Variable> = x.into_iter().flatten().collect();

    let started = Instant::now();
    let problem = constraints
        .into_iter()
        .fold(vars.minimise(goal).using(highs), |p, c| p.with(c))
        .with_time_limit(time_limit.as_secs_f64());

    let solution = match problem.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => {
            warn!("hard constraints cannot be satisfied together");
            return Ok(SolveOutcome::Infeasible);
        }
        Err(err) if started.elapsed() >= time_limit => {
            warn!(error = %err, ?time_limit, "solver stopped at the time limit without a solution");
            return Ok(SolveOutcome::TimedOut);
        }
        Err(err) => {
            warn!(error = %err, "solver returned no usable solution");
            return Ok(SolveOutcome::Infeasible);
        }
    };
    let status = status_label(solution.status());
    let values: Vec<f64> = decisions.iter().map(|v| solution.value(*v)).collect();
    let assignments = extract(ctx, slots, &values);

    // à l'expiration, HiGHS peut rendre un point sans incumbent
    if status == STATUS_TIME_LIMIT {
        let broken = violations::detect(ctx, slots, &assignments);
        if !broken.is_empty() {
            warn!(
                ?time_limit,
                violations = broken.len(),
                "solver time limit reached without a feasible incumbent"
            );
            return Ok(SolveOutcome::TimedOut);
        }
    }

    let schedule = summarize(ctx, assignments, status);
    info!(
        status,
        elapsed = ?started.elapsed(),
        assignments = schedule.assignments.len(),
        pay_std_dev = schedule.pay_std_dev,
        satisfaction = schedule.satisfaction,
        "schedule solved"
    );
    Ok(SolveOutcome::Solved(schedule))
}

/// Libellé de statut d'une solution rendue par le solveur.
fn status_label(status: SolutionStatus) -> &'static str {
    match status {
        SolutionStatus::Optimal => STATUS_OPTIMAL,
        SolutionStatus::TimeLimit => STATUS_TIME_LIMIT,
        SolutionStatus::GapLimit => STATUS_GAP_LIMIT,
    }
}

/// Affectations créneau par créneau, membres dans l'ordre du roster.
fn extract(ctx: &Context<'_>, slots: &[IndexedSlot], values: &[f64]) -> Vec<Assignment> {
    let n_slots = slots.len();
    let mut out = Vec::new();
    for (s, slot) in slots.iter().enumerate() {
        for (w, worker) in ctx.workers.iter().enumerate() {
            if values.get(w * n_slots + s).is_some_and(|v| *v > ON) {
                out.push(Assignment {
                    date: slot.slot.date,
                    location: slot.slot.location.clone(),
                    worker: worker.id.clone(),
                });
            }
        }
    }
    out
}

/// Statistiques d'un ensemble d'affectations.
///
/// Les affectations à un membre hors roster actif n'alimentent ni les gains
/// ni les compteurs ; un lieu inconnu compte pour une indemnité nulle.
pub(super) fn summarize(ctx: &Context<'_>, assignments: Vec<Assignment>, status: &str) -> Schedule {
    let mut earnings: BTreeMap<_, u64> =
        ctx.workers.iter().map(|w| (w.id.clone(), 0)).collect();
    let mut counts: BTreeMap<_, u32> = ctx.workers.iter().map(|w| (w.id.clone(), 0)).collect();
    let mut satisfaction = 0.0;

    for a in &assignments {
        let location = ctx.location_index(&a.location);
        let fee = location.map_or(0, |l| ctx.fee(l));
        if let Some(total) = earnings.get_mut(&a.worker) {
            *total += fee;
        }
        if let Some(count) = counts.get_mut(&a.worker) {
            *count += 1;
        }
        if let (Some(w), Some(l)) = (ctx.worker_index(&a.worker), location) {
            if ctx.prefers(w, l) {
                satisfaction += 1.0;
            }
            if ctx.nominated(w, l) {
                satisfaction += 1.0;
            }
            satisfaction += ctx.affinity(w, l).unwrap_or(0.0);
        }
    }

    let pay_std_dev = std_dev(earnings.values().map(|v| *v as f64));
    Schedule {
        assignments,
        earnings,
        counts,
        pay_std_dev,
        satisfaction,
        status: status.to_string(),
    }
}

/// Écart-type de population ; 0 pour une série vide.
fn std_dev(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count();
    if n == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    var.sqrt()
}
