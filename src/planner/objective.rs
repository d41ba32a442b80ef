use super::constraints::DecisionModel;
use super::context::Context;
use super::slots::IndexedSlot;
use super::types::Weights;
use good_lp::{constraint, variable, Expression};

/// Compose l'objectif pondéré (minimisé) et ajoute au modèle les variables
/// d'écart des deux termes de dispersion.
pub(super) fn compose(
    ctx: &Context<'_>,
    model: &mut DecisionModel,
    slots: &[IndexedSlot],
    weights: &Weights,
) -> Expression {
    let pay_weight = if ctx.all_fees_zero() {
        0.0
    } else {
        weights.pay_variance
    };

    let earnings: Vec<Expression> = (0..ctx.workers.len())
        .map(|w| {
            let period = slots
                .iter()
                .zip(&model.x[w])
                .fold(Expression::from(0.0), |acc, (s, v)| {
                    acc + (ctx.fee(s.location) as f64) * *v
                });
            period + ctx.previous(w) as f64
        })
        .collect();
    let pay_variance = l1_deviation(model, earnings);

    let counts: Vec<Expression> = (0..ctx.workers.len())
        .map(|w| model.worker_sum(w, slots, |_| true))
        .collect();
    let count_variance = l1_deviation(model, counts);

    let mut preference = Expression::from(0.0);
    let mut nomination = Expression::from(0.0);
    let mut affinity = Expression::from(0.0);
    let mut avoid = Expression::from(0.0);
    for (w, row) in model.x.iter().enumerate() {
        for (slot, var) in slots.iter().zip(row) {
            if ctx.prefers(w, slot.location) {
                preference += *var;
            }
            if ctx.nominated(w, slot.location) {
                nomination += *var;
            }
            if let Some(weight) = ctx.affinity(w, slot.location) {
                affinity += weight * *var;
            }
            if ctx.is_avoid(w, slot.slot.date) {
                avoid += *var;
            }
        }
    }

    pay_weight * pay_variance
        + weights.preference * preference
        + weights.nomination * nomination
        + weights.affinity * affinity
        + weights.avoid * avoid
        + weights.count_variance * count_variance
}

/// Somme des écarts absolus à la moyenne, linéarisée par une paire
/// d'écarts positifs par membre : `valeur - moyenne = plus - moins`.
fn l1_deviation(model: &mut DecisionModel, values: Vec<Expression>) -> Expression {
    if values.is_empty() {
        return Expression::from(0.0);
    }
    let n = values.len() as f64;
    let mean = values
        .iter()
        .fold(Expression::from(0.0), |acc, v| acc + v.clone())
        * (1.0 / n);

    let mut total = Expression::from(0.0);
    for value in values {
        let plus = model.vars.add(variable().min(0.0));
        let minus = model.vars.add(variable().min(0.0));
        model
            .constraints
            .push(constraint!(value - mean.clone() == plus - minus));
        total += plus + minus;
    }
    total
}
