use super::context::Context;
use super::slots::IndexedSlot;
use crate::model::AffinityLevel;
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use std::collections::BTreeSet;

/// Variables binaires `x[membre][créneau]` et contraintes dures.
pub(super) struct DecisionModel {
    pub vars: ProblemVariables,
    pub x: Vec<Vec<Variable>>,
    pub constraints: Vec<Constraint>,
}

impl DecisionModel {
    /// Somme des variables d'un membre sur les créneaux retenus par `keep`.
    pub fn worker_sum<F>(&self, worker: usize, slots: &[IndexedSlot], keep: F) -> Expression
    where
        F: Fn(&IndexedSlot) -> bool,
    {
        slots
            .iter()
            .zip(&self.x[worker])
            .filter(|(s, _)| keep(s))
            .fold(Expression::from(0.0), |acc, (_, v)| acc + *v)
    }
}

/// Construit le modèle. Ne peut pas échouer : l'infaisabilité n'apparaît
/// qu'à la résolution.
pub(super) fn build(ctx: &Context<'_>, slots: &[IndexedSlot]) -> DecisionModel {
    let mut vars = ProblemVariables::new();
    let x: Vec<Vec<Variable>> = ctx
        .workers
        .iter()
        .map(|_| slots.iter().map(|_| vars.add(variable().binary())).collect())
        .collect();

    let mut model = DecisionModel {
        vars,
        x,
        constraints: Vec::new(),
    };

    coverage(&mut model, slots);
    one_duty_per_day(&mut model, slots);
    exclusions(ctx, &mut model, slots);
    inclusions(ctx, &mut model, slots);

    model
}

/// Effectif exact par créneau.
fn coverage(model: &mut DecisionModel, slots: &[IndexedSlot]) {
    for (s, slot) in slots.iter().enumerate() {
        let staffed = model
            .x
            .iter()
            .fold(Expression::from(0.0), |acc, row| acc + row[s]);
        let required = f64::from(slot.slot.required);
        model.constraints.push(constraint!(staffed == required));
    }
}

/// Au plus une garde par membre et par date.
fn one_duty_per_day(model: &mut DecisionModel, slots: &[IndexedSlot]) {
    let dates: BTreeSet<_> = slots.iter().map(|s| s.slot.date).collect();
    for worker in 0..model.x.len() {
        for date in &dates {
            let same_day = model.worker_sum(worker, slots, |s| s.slot.date == *date);
            model.constraints.push(constraint!(same_day <= 1.0));
        }
    }
}

/// Dates NG et lieux NEVER : variable fixée à 0.
fn exclusions(ctx: &Context<'_>, model: &mut DecisionModel, slots: &[IndexedSlot]) {
    for (worker, row) in model.x.iter().enumerate() {
        for (slot, var) in slots.iter().zip(row) {
            let never = ctx.level(worker, slot.location) == Some(AffinityLevel::Never);
            if never || ctx.is_ng(worker, slot.slot.date) {
                model.constraints.push(constraint!(*var == 0.0));
            }
        }
    }
}

/// Lieux MUST : au moins une garde sur la période.
///
/// Un lieu MUST sans créneau est écarté en amont par [`unreachable_must`].
fn inclusions(ctx: &Context<'_>, model: &mut DecisionModel, slots: &[IndexedSlot]) {
    for (worker, location) in ctx.must_pairs() {
        let visits = model.worker_sum(worker, slots, |s| s.location == location);
        model.constraints.push(constraint!(visits >= 1.0));
    }
}

/// Première paire MUST dont le lieu n'a aucun créneau : le modèle est alors
/// infaisable sans appel au solveur.
pub(super) fn unreachable_must(ctx: &Context<'_>, slots: &[IndexedSlot]) -> Option<(usize, usize)> {
    ctx.must_pairs()
        .into_iter()
        .find(|(_, location)| !slots.iter().any(|s| s.location == *location))
}
