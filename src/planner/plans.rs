use super::context::Context;
use super::solve;
use super::types::{Mode, Plan, PlanError, SolveOutcome};
use super::Planner;
use tracing::{debug, info};

/// Un plan par profil, dans l'ordre de `Mode::ALL`.
///
/// Les profils sans solution sont ignorés ; une liste vide signifie
/// qu'aucun profil n'a abouti.
pub(super) fn generate(planner: &Planner) -> Result<Vec<Plan>, PlanError> {
    let ctx = Context::new(planner.snapshot())?;
    let slots = ctx.slots(planner.dates());
    let mut plans = Vec::new();

    for mode in Mode::ALL {
        debug!(%mode, "running profile");
        match solve::run(&ctx, &slots, &mode.weights(), planner.options().time_limit)? {
            SolveOutcome::Solved(schedule) => plans.push(Plan {
                name: mode.label().to_string(),
                mode,
                schedule,
            }),
            other => debug!(%mode, outcome = ?other, "profile dropped"),
        }
    }

    info!(plans = plans.len(), "plan generation finished");
    Ok(plans)
}
