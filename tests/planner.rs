#![forbid(unsafe_code)]
use chrono::NaiveDate;
use garde::{
    Affinity, Assignment, DateOverride, Location, Mode, PlanError, PlanOptions, Planner,
    Preference, Recurrence, Snapshot, SolveOutcome, ViolationKind, Worker, WorkerId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

fn two_saturdays() -> Vec<NaiveDate> {
    vec![d(1), d(8)]
}

fn base_snapshot() -> Snapshot {
    Snapshot {
        workers: vec![Worker::new("w1", "Aiko"), Worker::new("w2", "Ren")],
        locations: vec![Location::new("a", "Clinic A", 1000)],
        ..Snapshot::default()
    }
}

fn solved(planner: &Planner, mode: Mode) -> garde::Schedule {
    match planner.solve(mode).unwrap() {
        SolveOutcome::Solved(schedule) => schedule,
        other => panic!("expected a schedule, got {other:?}"),
    }
}

#[test]
fn balanced_spreads_duties_over_workers() {
    let planner = Planner::new(base_snapshot(), two_saturdays());
    let schedule = solved(&planner, Mode::Balanced);

    assert_eq!(schedule.status, "Optimal");
    assert_eq!(schedule.assignments.len(), 2);
    let dates: BTreeSet<_> = schedule.assignments.iter().map(|a| a.date).collect();
    assert_eq!(dates.len(), 2);
    assert_eq!(schedule.earnings.get(&WorkerId::new("w1")), Some(&1000));
    assert_eq!(schedule.earnings.get(&WorkerId::new("w2")), Some(&1000));
    assert!(schedule.pay_std_dev.abs() < 1e-9);
}

#[test]
fn sole_worker_blocked_on_every_date_is_infeasible() {
    let snapshot = Snapshot {
        workers: vec![Worker::new("w1", "Aiko")],
        locations: vec![Location::new("a", "Clinic A", 1000)],
        preferences: vec![Preference::new("w1").with_ng([d(1), d(8)])],
        ..Snapshot::default()
    };
    let planner = Planner::new(snapshot, two_saturdays());
    assert_eq!(planner.solve(Mode::Balanced).unwrap(), SolveOutcome::Infeasible);
    assert!(planner.generate_plans().unwrap().is_empty());
}

#[test]
fn multi_staff_override_uses_both_workers() {
    let mut snapshot = base_snapshot();
    snapshot.overrides = vec![DateOverride::new("a", d(1), 2)];
    let planner = Planner::new(snapshot, vec![d(1)]);
    let schedule = solved(&planner, Mode::Balanced);

    let workers: BTreeSet<_> = schedule
        .assignments
        .iter()
        .map(|a| a.worker.as_str().to_string())
        .collect();
    assert_eq!(schedule.assignments.len(), 2);
    assert_eq!(workers, ["w1", "w2"].map(String::from).into());
}

#[test]
fn closed_date_gets_no_assignment() {
    let mut snapshot = base_snapshot();
    snapshot.overrides = vec![DateOverride::new("a", d(1), 0)];
    let planner = Planner::new(snapshot, two_saturdays());
    assert_eq!(planner.slots().unwrap().len(), 1);

    let schedule = solved(&planner, Mode::Balanced);
    assert_eq!(schedule.assignments.len(), 1);
    assert_eq!(schedule.assignments[0].date, d(8));
}

#[test]
fn never_and_ng_are_respected() {
    let mut snapshot = base_snapshot();
    snapshot.workers.push(Worker::new("w3", "Sora"));
    snapshot.affinities = vec![Affinity::new("w1", "a", Affinity::NEVER)];
    snapshot.preferences = vec![Preference::new("w2").with_ng([d(1)])];
    let planner = Planner::new(snapshot, two_saturdays());

    for mode in Mode::ALL {
        let schedule = solved(&planner, mode);
        assert_eq!(schedule.assignments.len(), 2);
        for a in &schedule.assignments {
            assert_ne!(a.worker.as_str(), "w1", "{mode}: NEVER location staffed");
            assert!(!(a.worker.as_str() == "w2" && a.date == d(1)), "{mode}: NG date staffed");
        }
        assert!(planner.check(&schedule.assignments).unwrap().is_empty());
    }
}

#[test]
fn must_affinity_forces_a_visit() {
    let snapshot = Snapshot {
        workers: vec![Worker::new("w1", "Aiko"), Worker::new("w2", "Ren")],
        locations: vec![
            Location::new("a", "Clinic A", 1000),
            Location::new("b", "Clinic B", 1000),
        ],
        affinities: vec![Affinity::new("w1", "b", Affinity::MUST)],
        preferences: vec![Preference::new("w1").with_preferred(["a"])],
        ..Snapshot::default()
    };
    let planner = Planner::new(snapshot, vec![d(1)]);

    for mode in Mode::ALL {
        let schedule = solved(&planner, mode);
        assert!(
            schedule
                .assignments
                .contains(&Assignment::new(d(1), "b", "w1")),
            "{mode}: MUST location not visited"
        );
    }
}

#[test]
fn carried_earnings_shift_the_duty() {
    let mut snapshot = base_snapshot();
    snapshot.previous_earnings = [(WorkerId::new("w1"), 1000)].into();
    let planner = Planner::new(snapshot, vec![d(1)]);
    let schedule = solved(&planner, Mode::Balanced);

    assert_eq!(schedule.assignments, vec![Assignment::new(d(1), "a", "w2")]);
    // statistiques : gains de la période seulement
    assert_eq!(schedule.earnings.get(&WorkerId::new("w1")), Some(&0));
    assert!((schedule.pay_std_dev - 500.0).abs() < 1e-9);
}

#[test]
fn preference_mode_follows_wishes() {
    let snapshot = Snapshot {
        workers: vec![Worker::new("w1", "Aiko"), Worker::new("w2", "Ren")],
        locations: vec![
            Location::new("a", "Clinic A", 1000),
            Location::new("b", "Clinic B", 1000),
        ],
        preferences: vec![
            Preference::new("w1").with_preferred(["b"]),
            Preference::new("w2").with_preferred(["a"]),
        ],
        ..Snapshot::default()
    };
    let planner = Planner::new(snapshot, vec![d(1)]);
    let schedule = solved(&planner, Mode::Preference);

    let mut got = schedule.assignments.clone();
    got.sort();
    assert_eq!(
        got,
        vec![Assignment::new(d(1), "a", "w2"), Assignment::new(d(1), "b", "w1")]
    );
    assert!((schedule.satisfaction - 2.0).abs() < 1e-9);
}

#[test]
fn generated_plans_keep_profile_order() {
    let planner = Planner::new(base_snapshot(), two_saturdays());
    let plans = planner.generate_plans().unwrap();

    let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Plan A: pay balance", "Plan B: preferences", "Plan C: affinity"]
    );
    let modes: Vec<_> = plans.iter().map(|p| p.mode).collect();
    assert_eq!(modes, Mode::ALL.to_vec());
}

#[test]
fn nothing_to_staff_skips_the_solver() {
    let snapshot = Snapshot {
        workers: vec![Worker::new("w1", "Aiko")],
        ..Snapshot::default()
    };
    let planner = Planner::new(snapshot, two_saturdays());
    assert_eq!(planner.solve(Mode::Balanced).unwrap(), SolveOutcome::NoSlots);
    assert!(planner.generate_plans().unwrap().is_empty());

    let no_dates = Planner::new(base_snapshot(), Vec::new());
    assert_eq!(no_dates.solve(Mode::Affinity).unwrap(), SolveOutcome::NoSlots);
}

#[test]
fn slots_without_workers_are_infeasible() {
    let snapshot = Snapshot {
        locations: vec![Location::new("a", "Clinic A", 1000)],
        ..Snapshot::default()
    };
    let planner = Planner::new(snapshot, two_saturdays());
    assert_eq!(planner.solve(Mode::Balanced).unwrap(), SolveOutcome::Infeasible);
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut snapshot = base_snapshot();
    snapshot.locations.push(Location::new("a", "Clinic A bis", 0));
    let planner = Planner::new(snapshot, two_saturdays());
    assert!(matches!(
        planner.solve(Mode::Balanced),
        Err(PlanError::DuplicateLocation(id)) if id == "a"
    ));
}

#[test]
fn check_reports_broken_constraints() {
    let mut snapshot = base_snapshot();
    snapshot.preferences = vec![Preference::new("w1").with_ng([d(1)])];
    let planner = Planner::new(snapshot, two_saturdays());

    let edited = vec![
        Assignment::new(d(1), "a", "w1"),
        Assignment::new(d(1), "a", "w2"),
        Assignment::new(d(15), "a", "w2"),
        Assignment::new(d(1), "a", "ghost"),
    ];
    let kinds: Vec<_> = planner
        .check(&edited)
        .unwrap()
        .into_iter()
        .map(|v| v.kind)
        .collect();
    assert!(kinds.contains(&ViolationKind::NgDate));
    assert!(kinds.contains(&ViolationKind::OutsideSlot));
    assert!(kinds.contains(&ViolationKind::UnknownWorker));
    assert!(kinds.contains(&ViolationKind::Overstaffed));
    assert!(kinds.contains(&ViolationKind::Understaffed));
}

#[test]
fn summarize_recomputes_statistics() {
    let planner = Planner::new(base_snapshot(), two_saturdays());
    let schedule = planner
        .summarize(vec![
            Assignment::new(d(1), "a", "w1"),
            Assignment::new(d(8), "a", "w1"),
        ])
        .unwrap();

    assert_eq!(schedule.status, "Manual");
    assert_eq!(schedule.counts.get(&WorkerId::new("w1")), Some(&2));
    assert_eq!(schedule.counts.get(&WorkerId::new("w2")), Some(&0));
    assert!((schedule.pay_std_dev - 1000.0).abs() < 1e-9);
}

#[test]
fn mode_names_parse() {
    assert_eq!("Balanced".parse::<Mode>().unwrap(), Mode::Balanced);
    assert!(matches!("speed".parse::<Mode>(), Err(PlanError::UnknownMode(_))));
}

#[test]
fn must_location_without_slot_is_infeasible() {
    let snapshot = Snapshot {
        workers: vec![Worker::new("w1", "Aiko"), Worker::new("w2", "Ren")],
        locations: vec![
            Location::new("a", "Clinic A", 1000),
            Location::new("b", "Clinic B", 1000),
        ],
        affinities: vec![Affinity::new("w2", "b", Affinity::MUST)],
        overrides: vec![DateOverride::new("b", d(1), 0)],
        ..Snapshot::default()
    };
    let planner = Planner::new(snapshot, vec![d(1)]);
    assert_eq!(planner.solve(Mode::Balanced).unwrap(), SolveOutcome::Infeasible);

    let kinds: Vec<_> = planner
        .check(&[Assignment::new(d(1), "a", "w1")])
        .unwrap()
        .into_iter()
        .map(|v| v.kind)
        .collect();
    assert_eq!(kinds, vec![ViolationKind::MustUnmet]);
}

#[test]
fn avoided_date_goes_to_the_other_worker() {
    let mut snapshot = base_snapshot();
    snapshot.preferences = vec![Preference::new("w1").with_avoid([d(1)])];
    let planner = Planner::new(snapshot, vec![d(1)]);

    for mode in Mode::ALL {
        let schedule = solved(&planner, mode);
        assert_eq!(
            schedule.assignments,
            vec![Assignment::new(d(1), "a", "w2")],
            "{mode}"
        );
    }
}

#[test]
fn nominated_worker_is_rewarded() {
    let mut snapshot = base_snapshot();
    snapshot.locations = vec![Location::new("a", "Clinic A", 1000).with_nominated(["w2"])];
    let planner = Planner::new(snapshot, vec![d(1)]);

    for mode in Mode::ALL {
        let schedule = solved(&planner, mode);
        assert_eq!(
            schedule.assignments,
            vec![Assignment::new(d(1), "a", "w2")],
            "{mode}"
        );
        assert!((schedule.satisfaction - 1.0).abs() < 1e-9);
    }
}

#[test]
fn zero_fees_still_balance_duty_counts() {
    let mut snapshot = base_snapshot();
    snapshot.locations = vec![Location::new("a", "Clinic A", 0)];
    snapshot.previous_earnings = [(WorkerId::new("w1"), 50_000)].into();
    let planner = Planner::new(snapshot, vec![d(1), d(8), d(15), d(22)]);

    for mode in Mode::ALL {
        let schedule = solved(&planner, mode);
        assert_eq!(schedule.counts.get(&WorkerId::new("w1")), Some(&2), "{mode}");
        assert_eq!(schedule.counts.get(&WorkerId::new("w2")), Some(&2), "{mode}");
        assert_eq!(schedule.pay_std_dev, 0.0);
    }
}

#[test]
fn affinity_mode_picks_the_stronger_pair() {
    let mut snapshot = base_snapshot();
    snapshot.affinities = vec![
        Affinity::new("w1", "a", 4.5),
        Affinity::new("w2", "a", 1.5),
    ];
    let planner = Planner::new(snapshot, vec![d(1)]);
    let schedule = solved(&planner, Mode::Affinity);

    assert_eq!(schedule.assignments, vec![Assignment::new(d(1), "a", "w1")]);
    assert!((schedule.satisfaction - 4.5).abs() < 1e-9);
}

/// Taille d'un service réel : 20 membres, 10 lieux, un mois de 5 samedis.
fn department() -> Snapshot {
    let workers = (0..20)
        .map(|i| Worker::new(format!("w{i:02}"), format!("Doctor {i}")))
        .collect();
    let locations = [
        ("a", 80_000, Recurrence::Weekly),
        ("b", 60_000, Recurrence::Weekly),
        ("c", 50_000, Recurrence::Weekly),
        ("d", 70_000, Recurrence::BiweeklyOdd),
        ("e", 45_000, Recurrence::BiweeklyEven),
        ("f", 90_000, Recurrence::Weekly),
        ("g", 55_000, Recurrence::BiweeklyOdd),
        ("h", 65_000, Recurrence::Weekly),
        ("i", 75_000, Recurrence::BiweeklyEven),
        ("j", 40_000, Recurrence::FirstOnly),
    ]
    .into_iter()
    .enumerate()
    .map(|(n, (id, fee, recurrence))| {
        Location::new(id, format!("Clinic {id}"), fee)
            .with_recurrence(recurrence)
            .with_nominated([format!("w{:02}", (n * 3) % 20), format!("w{:02}", (n * 7 + 1) % 20)])
    })
    .collect();
    let saturdays = [d(1), d(8), d(15), d(22), d(29)];
    let preferences = (0..10)
        .map(|i| {
            Preference::new(format!("w{i:02}"))
                .with_ng([saturdays[i % 5]])
                .with_avoid([saturdays[(i + 1) % 5]])
                .with_preferred([["a", "f", "h"][i % 3]])
        })
        .collect();
    let affinities = vec![
        Affinity::new("w03", "j", Affinity::MUST),
        Affinity::new("w07", "d", Affinity::MUST),
        Affinity::new("w00", "a", Affinity::NEVER),
        Affinity::new("w11", "f", Affinity::NEVER),
        Affinity::new("w12", "b", 4.2),
        Affinity::new("w15", "c", 3.5),
        Affinity::new("w18", "i", Affinity::POSSIBLE),
    ];
    Snapshot {
        workers,
        locations,
        preferences,
        affinities,
        ..Snapshot::default()
    }
}

#[test]
fn department_sized_month_yields_every_plan() {
    let planner = Planner::new(department(), vec![d(1), d(8), d(15), d(22), d(29)]);
    let slots = planner.slots().unwrap();
    assert_eq!(slots.len(), 36);

    let plans = planner.generate_plans().unwrap();
    assert_eq!(plans.len(), 3);
    for plan in &plans {
        let schedule = &plan.schedule;
        assert!(
            ["Optimal", "TimeLimit", "GapLimit"].contains(&schedule.status.as_str()),
            "{}: {}",
            plan.name,
            schedule.status
        );
        assert!(planner.check(&schedule.assignments).unwrap().is_empty(), "{}", plan.name);

        let mut staffed: BTreeMap<(&str, NaiveDate), u32> = BTreeMap::new();
        let mut per_day: BTreeMap<(&str, NaiveDate), u32> = BTreeMap::new();
        for a in &schedule.assignments {
            *staffed.entry((a.location.as_str(), a.date)).or_default() += 1;
            *per_day.entry((a.worker.as_str(), a.date)).or_default() += 1;
        }
        for slot in &slots {
            assert_eq!(staffed.get(&(slot.location.as_str(), slot.date)), Some(&slot.required));
        }
        assert!(per_day.values().all(|n| *n == 1));
        assert!(schedule.assignments.iter().any(|a| a.worker.as_str() == "w03" && a.location.as_str() == "j"));
        assert!(schedule.assignments.iter().any(|a| a.worker.as_str() == "w07" && a.location.as_str() == "d"));
    }
}

#[test]
fn exhausted_time_limit_keeps_a_feasible_incumbent_or_nothing() {
    let planner = Planner::new(department(), vec![d(1), d(8), d(15), d(22), d(29)])
        .with_options(PlanOptions {
            time_limit: Duration::from_millis(1),
        });

    let started = Instant::now();
    match planner.solve(Mode::Balanced).unwrap() {
        SolveOutcome::Solved(schedule) => {
            assert!(planner.check(&schedule.assignments).unwrap().is_empty());
            assert_ne!(schedule.status, "Manual");
        }
        SolveOutcome::TimedOut => {}
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(10));
}
