#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use garde::{
    calendar::{self, YearMonth},
    holidays::{HolidayCalendar, JapaneseHolidays, NoHolidays},
    io,
    planner::{PlanOptions, Planner},
    storage::{JsonStorage, Storage},
};
use std::time::Duration;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de répartition des gardes externes
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Registre JSON des plannings
    #[arg(long, global = true, default_value = "schedules.json")]
    book: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum HolidaySource {
    /// Jours fériés japonais
    Jp,
    /// Aucun jour férié
    None,
}

impl HolidaySource {
    fn calendar(self) -> Box<dyn HolidayCalendar> {
        match self {
            HolidaySource::Jp => Box::new(JapaneseHolidays),
            HolidaySource::None => Box::new(NoHolidays),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lister les samedis de garde d'un mois
    Dates {
        /// YYYY-MM
        #[arg(long)]
        month: YearMonth,
        #[arg(long, value_enum, default_value_t = HolidaySource::Jp)]
        holidays: HolidaySource,
    },

    /// Générer les plans alternatifs et les enregistrer
    Generate {
        #[arg(long)]
        snapshot: String,
        #[arg(long)]
        month: YearMonth,
        #[arg(long, value_enum, default_value_t = HolidaySource::Jp)]
        holidays: HolidaySource,
        #[arg(long, default_value_t = 30)]
        time_limit_secs: u64,
        /// Export JSON des plans (optionnel)
        #[arg(long)]
        out: Option<String>,
        /// Ignorer les gains des mois confirmés précédents
        #[arg(long)]
        no_carry: bool,
    },

    /// Lister les plannings enregistrés
    List {
        #[arg(long)]
        month: Option<YearMonth>,
    },

    /// Afficher un planning sous forme de tableau
    Show {
        #[arg(long)]
        snapshot: String,
        #[arg(long)]
        id: String,
    },

    /// Confirmer un planning (les autres plans du mois sont déconfirmés)
    Confirm {
        #[arg(long)]
        id: String,
    },

    /// Supprimer un planning non confirmé
    Delete {
        #[arg(long)]
        id: String,
    },

    /// Exporter un planning en CSV
    Export {
        #[arg(long)]
        snapshot: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        csv: String,
        /// Statistiques par membre (optionnel)
        #[arg(long)]
        stats: Option<String>,
    },

    /// Vérifier un planning CSV contre les contraintes dures
    Check {
        #[arg(long)]
        snapshot: String,
        #[arg(long)]
        month: YearMonth,
        #[arg(long, value_enum, default_value_t = HolidaySource::Jp)]
        holidays: HolidaySource,
        #[arg(long)]
        csv: String,
        /// Export CSV des violations (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Remplacer les affectations d'un planning par un CSV retouché
    Edit {
        #[arg(long)]
        snapshot: String,
        #[arg(long)]
        month: YearMonth,
        #[arg(long, value_enum, default_value_t = HolidaySource::Jp)]
        holidays: HolidaySource,
        #[arg(long)]
        id: String,
        #[arg(long)]
        csv: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.book)?;

    let code = match cli.cmd {
        Commands::Dates { month, holidays } => {
            for d in calendar::saturdays(month, holidays.calendar().as_ref()) {
                println!("{d}");
            }
            0
        }
        Commands::Generate {
            snapshot,
            month,
            holidays,
            time_limit_secs,
            out,
            no_carry,
        } => {
            let mut snapshot = io::load_snapshot_json(snapshot)?;
            let mut book = storage.load_or_default()?;
            if !no_carry && snapshot.previous_earnings.is_empty() {
                let (earnings, months) = book.previous_earnings(&snapshot.fees(), month);
                if !months.is_empty() {
                    let used: Vec<String> = months.iter().map(ToString::to_string).collect();
                    println!(
                        "carrying earnings of {} confirmed month(s): {}",
                        months.len(),
                        used.join(", ")
                    );
                }
                snapshot.previous_earnings = earnings;
            }

            let planner = Planner::for_month(snapshot, month, holidays.calendar().as_ref())
                .with_options(PlanOptions {
                    time_limit: Duration::from_secs(time_limit_secs),
                });
            if planner.dates().is_empty() {
                eprintln!("no eligible duty date in {month}");
                std::process::exit(2);
            }

            let plans = planner.generate_plans()?;
            if plans.is_empty() {
                eprintln!("no schedule satisfies the hard constraints; review overrides and preferences");
                // Code 2 = WARNING/INCOMPLETE
                2
            } else {
                let now = Utc::now();
                for plan in &plans {
                    let id = book.save_plan(month, plan, now);
                    println!(
                        "{} | {} | pay sd {:.0} | satisfaction {:.1}",
                        id, plan.name, plan.schedule.pay_std_dev, plan.schedule.satisfaction
                    );
                }
                storage.save(&book)?;
                if let Some(path) = out {
                    io::export_plans_json(path, &plans)?;
                }
                0
            }
        }
        Commands::List { month } => {
            let book = storage.load_or_default()?;
            for s in book
                .schedules
                .iter()
                .filter(|s| month.map_or(true, |m| s.month == m))
            {
                println!(
                    "{} | {} | {}{} | pay sd {:.0} | satisfaction {:.1}",
                    s.id,
                    s.month,
                    s.name,
                    if s.confirmed { " [confirmed]" } else { "" },
                    s.pay_std_dev,
                    s.satisfaction
                );
            }
            0
        }
        Commands::Show { snapshot, id } => {
            let snapshot = io::load_snapshot_json(snapshot)?;
            let book = storage.load()?;
            let saved = book
                .find(&id)
                .with_context(|| format!("unknown schedule: {id}"))?;
            print!("{}", io::render_grid(&snapshot, &saved.assignments));
            let planner = Planner::new(snapshot, Vec::new());
            let schedule = planner.summarize(saved.assignments.clone())?;
            for (worker, count) in &schedule.counts {
                let earned = schedule.earnings.get(worker).copied().unwrap_or(0);
                let name = planner
                    .snapshot()
                    .find_worker(worker)
                    .map(|w| w.name.as_str())
                    .unwrap_or("?");
                println!("{name}: {count} duty(ies), {earned}");
            }
            0
        }
        Commands::Confirm { id } => {
            let mut book = storage.load()?;
            book.confirm(&id)?;
            storage.save(&book)?;
            0
        }
        Commands::Delete { id } => {
            let mut book = storage.load()?;
            book.delete(&id)?;
            storage.save(&book)?;
            0
        }
        Commands::Export {
            snapshot,
            id,
            csv,
            stats,
        } => {
            let book = storage.load()?;
            let saved = book
                .find(&id)
                .with_context(|| format!("unknown schedule: {id}"))?;
            io::export_assignments_csv(csv, &saved.assignments)?;
            if let Some(path) = stats {
                let snapshot = io::load_snapshot_json(snapshot)?;
                let planner = Planner::new(snapshot, Vec::new());
                let schedule = planner.summarize(saved.assignments.clone())?;
                io::export_stats_csv(path, planner.snapshot(), &schedule)?;
            }
            0
        }
        Commands::Check {
            snapshot,
            month,
            holidays,
            csv,
            report,
        } => {
            let snapshot = io::load_snapshot_json(snapshot)?;
            let assignments = io::import_assignments_csv(csv)?;
            let planner = Planner::for_month(snapshot, month, holidays.calendar().as_ref());
            let violations = planner.check(&assignments)?;
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                for v in &violations {
                    eprintln!(
                        "{} {} {} {}",
                        v.kind.as_str(),
                        v.worker.as_ref().map(|w| w.as_str()).unwrap_or("-"),
                        v.location.as_ref().map(|l| l.as_str()).unwrap_or("-"),
                        v.date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
                    );
                }
                if let Some(path) = report {
                    io::export_violations_csv(path, &violations)?;
                }
                2
            }
        }
        Commands::Edit {
            snapshot,
            month,
            holidays,
            id,
            csv,
        } => {
            let snapshot = io::load_snapshot_json(snapshot)?;
            let assignments = io::import_assignments_csv(csv)?;
            let planner = Planner::for_month(snapshot, month, holidays.calendar().as_ref());
            let violations = planner.check(&assignments)?;
            if !violations.is_empty() {
                eprintln!("warning: edited schedule breaks {} hard constraint(s)", violations.len());
            }
            let schedule = planner.summarize(assignments)?;
            let mut book = storage.load()?;
            book.update(&id, &schedule, Utc::now())?;
            storage.save(&book)?;
            0
        }
    };

    std::process::exit(code);
}
