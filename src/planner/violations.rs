use super::context::Context;
use super::slots::IndexedSlot;
use super::types::{Violation, ViolationKind};
use crate::model::{AffinityLevel, Assignment, LocationId, WorkerId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

/// Relève toutes les contraintes dures enfreintes par `assignments`.
pub(super) fn detect(
    ctx: &Context<'_>,
    slots: &[IndexedSlot],
    assignments: &[Assignment],
) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut staffed: BTreeMap<(&LocationId, NaiveDate), u32> = BTreeMap::new();
    let mut per_day: BTreeMap<(&WorkerId, NaiveDate), u32> = BTreeMap::new();
    let mut visited: HashSet<(usize, usize)> = HashSet::new();
    let known: HashSet<(&LocationId, NaiveDate)> = slots
        .iter()
        .map(|s| (&s.slot.location, s.slot.date))
        .collect();

    for a in assignments {
        *per_day.entry((&a.worker, a.date)).or_default() += 1;
        if known.contains(&(&a.location, a.date)) {
            *staffed.entry((&a.location, a.date)).or_default() += 1;
        } else {
            out.push(violation(ViolationKind::OutsideSlot, a));
        }

        let Some(w) = ctx.worker_index(&a.worker) else {
            out.push(violation(ViolationKind::UnknownWorker, a));
            continue;
        };
        if ctx.is_ng(w, a.date) {
            out.push(violation(ViolationKind::NgDate, a));
        }
        if let Some(l) = ctx.location_index(&a.location) {
            if ctx.level(w, l) == Some(AffinityLevel::Never) {
                out.push(violation(ViolationKind::NeverLocation, a));
            }
            visited.insert((w, l));
        }
    }

    for ((worker, date), n) in &per_day {
        if *n > 1 {
            out.push(Violation {
                kind: ViolationKind::DoubleDuty,
                worker: Some((*worker).clone()),
                location: None,
                date: Some(*date),
            });
        }
    }

    for s in slots {
        let got = staffed
            .get(&(&s.slot.location, s.slot.date))
            .copied()
            .unwrap_or(0);
        let kind = if got < s.slot.required {
            ViolationKind::Understaffed
        } else if got > s.slot.required {
            ViolationKind::Overstaffed
        } else {
            continue;
        };
        out.push(Violation {
            kind,
            worker: None,
            location: Some(s.slot.location.clone()),
            date: Some(s.slot.date),
        });
    }

    for (w, l) in ctx.must_pairs() {
        if !visited.contains(&(w, l)) {
            out.push(Violation {
                kind: ViolationKind::MustUnmet,
                worker: Some(ctx.workers[w].id.clone()),
                location: Some(ctx.locations[l].id.clone()),
                date: None,
            });
        }
    }

    out
}

fn violation(kind: ViolationKind, a: &Assignment) -> Violation {
    Violation {
        kind,
        worker: Some(a.worker.clone()),
        location: Some(a.location.clone()),
        date: Some(a.date),
    }
}
