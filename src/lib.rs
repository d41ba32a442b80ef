#![forbid(unsafe_code)]
//! Garde : bibliothèque de répartition des gardes externes (sans BD).
//!
//! - Calendrier : samedis non fériés du mois, cadence par lieu, fermetures.
//! - Modèle linéaire en nombres entiers (couverture exacte, une garde par jour,
//!   indisponibilités, affinités MUST/NEVER).
//! - Objectif pondéré : équité des gains et du nombre de gardes, souhaits,
//!   demandes des lieux, affinités, dates à éviter.
//! - Plusieurs plans alternatifs, un par profil de pondération.
//! - Le cœur ne persiste rien ; le registre JSON et la CLI sont en dehors.

pub mod book;
pub mod calendar;
pub mod holidays;
pub mod io;
pub mod model;
pub mod planner;
pub mod storage;

pub use book::{BookError, SavedSchedule, ScheduleBook};
pub use calendar::{dates_for_location, duty_dates, saturdays, YearMonth};
pub use holidays::{
    HolidayCalendar, HolidayList, JapaneseHolidays, NoHolidays, JP_SUPPORTED_YEARS,
};
pub use model::{
    Affinity, AffinityLevel, Assignment, DateOverride, Location, LocationId, Preference,
    Recurrence, Slot, Snapshot, Worker, WorkerId,
};
pub use planner::{
    build_slots, Mode, Plan, PlanError, PlanOptions, Planner, Schedule, SolveOutcome, Violation,
    ViolationKind, Weights,
};
pub use storage::{JsonStorage, Storage};
