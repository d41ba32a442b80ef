use crate::model::{Assignment, Snapshot};
use crate::planner::{Plan, Schedule, Violation};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Charge l'instantané d'une période (JSON).
pub fn load_snapshot_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Snapshot> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_slice(&data)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok(snapshot)
}

/// Export JSON des plans (jolie mise en forme)
pub fn export_plans_json<P: AsRef<Path>>(path: P, plans: &[Plan]) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(plans)?;
    fs::write(path, s)?;
    Ok(())
}

/// Import d'affectations: header `date,location_id,worker_id` (date ISO)
pub fn import_assignments_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Assignment>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let date = rec.get(0).context("missing date")?.trim();
        let location = rec.get(1).context("missing location_id")?.trim();
        let worker = rec.get(2).context("missing worker_id")?.trim();
        if location.is_empty() || worker.is_empty() {
            bail!("invalid assignment row (empty)");
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("invalid date: {date}"))?;
        out.push(Assignment::new(date, location, worker));
    }
    Ok(out)
}

/// Export CSV des affectations: header `date,location_id,worker_id`
pub fn export_assignments_csv<P: AsRef<Path>>(path: P, assignments: &[Assignment]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["date", "location_id", "worker_id"])?;
    for a in assignments {
        let date = a.date.format("%Y-%m-%d").to_string();
        w.write_record([date.as_str(), a.location.as_str(), a.worker.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des statistiques par membre: header `worker_id,name,count,earnings`
pub fn export_stats_csv<P: AsRef<Path>>(
    path: P,
    snapshot: &Snapshot,
    schedule: &Schedule,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["worker_id", "name", "count", "earnings"])?;
    let mut count_buf = itoa::Buffer::new();
    let mut earn_buf = itoa::Buffer::new();
    for (id, earnings) in &schedule.earnings {
        let name = snapshot
            .find_worker(id)
            .map(|p| p.name.as_str())
            .unwrap_or("");
        let count = schedule.counts.get(id).copied().unwrap_or(0);
        w.write_record([
            id.as_str(),
            name,
            count_buf.format(count),
            earn_buf.format(*earnings),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des violations: header `kind,worker_id,location_id,date`
pub fn export_violations_csv<P: AsRef<Path>>(path: P, violations: &[Violation]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["kind", "worker_id", "location_id", "date"])?;
    for v in violations {
        let date = v.date.map(|d| d.to_string()).unwrap_or_default();
        w.write_record([
            v.kind.as_str(),
            v.worker.as_ref().map(|x| x.as_str()).unwrap_or(""),
            v.location.as_ref().map(|x| x.as_str()).unwrap_or(""),
            date.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Tableau texte lieux × dates, noms d'affichage, `-` pour une case vide.
pub fn render_grid(snapshot: &Snapshot, assignments: &[Assignment]) -> String {
    let dates: BTreeSet<NaiveDate> = assignments.iter().map(|a| a.date).collect();
    let mut cells: BTreeMap<(String, NaiveDate), Vec<String>> = BTreeMap::new();
    for a in assignments {
        let location = snapshot
            .find_location(&a.location)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| a.location.as_str().to_string());
        let worker = snapshot
            .find_worker(&a.worker)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| a.worker.as_str().to_string());
        cells.entry((location, a.date)).or_default().push(worker);
    }
    let locations: BTreeSet<&String> = cells.keys().map(|(l, _)| l).collect();

    let mut out = String::from("location");
    for d in &dates {
        let _ = write!(out, " | {}", d.format("%m/%d"));
    }
    out.push('\n');
    for loc in locations {
        out.push_str(loc);
        for d in &dates {
            let cell = cells
                .get(&((*loc).clone(), *d))
                .map(|names| names.join("/"))
                .unwrap_or_else(|| "-".to_string());
            let _ = write!(out, " | {cell}");
        }
        out.push('\n');
    }
    out
}
