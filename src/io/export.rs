//! Delimited-text export of an [`AllocationReport`].
//!
//! Written into the output directory:
//!
//! - `export_people.csv`: one row per person with the resolved vehicle.
//! - `export_vehicles.csv`: one row per vehicle, with `team_1..team_n`
//!   columns sized to the busiest vehicle.
//! - `vehicle_{id}.csv`: numbered passenger list with blank check-in
//!   columns for departure and return.
//!
//! A run replaces the whole set. Manifests left by an earlier run for
//! vehicles that are no longer in the fleet are deleted.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::report::{AllocationReport, Manifest};

pub const PEOPLE_FILE: &str = "export_people.csv";
pub const VEHICLES_FILE: &str = "export_vehicles.csv";

/// File name of a vehicle's manifest.
pub fn manifest_file_name(vehicle_id: u32) -> String {
    format!("vehicle_{vehicle_id}.csv")
}

fn writer<W: Write>(out: W, delimiter: u8) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out)
}

pub fn write_people<W: Write>(report: &AllocationReport, out: W, delimiter: u8) -> Result<()> {
    let mut wtr = writer(out, delimiter);
    for row in &report.people {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_vehicles<W: Write>(report: &AllocationReport, out: W, delimiter: u8) -> Result<()> {
    let width = report.max_teams_per_vehicle();
    let mut wtr = writer(out, delimiter);

    let mut header: Vec<String> = ["id", "capacity", "manual_occupants", "occupied_seats"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend((1..=width).map(|i| format!("team_{i}")));
    wtr.write_record(&header)?;

    for vehicle in &report.vehicles {
        let mut record = vec![
            vehicle.id.to_string(),
            vehicle.capacity.to_string(),
            vehicle.manual_occupants.to_string(),
            vehicle.occupied_seats.to_string(),
        ];
        record.extend(vehicle.team_ids.iter().map(|t| t.to_string()));
        record.resize(header.len(), String::new());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_manifest<W: Write>(manifest: &Manifest, out: W, delimiter: u8) -> Result<()> {
    let mut wtr = writer(out, delimiter);
    wtr.write_record([
        "seq",
        "first_name",
        "last_name",
        "team",
        "phone",
        "check_in_departure",
        "check_in_return",
    ])?;
    for row in &manifest.rows {
        let seq = row.seq.to_string();
        wtr.write_record([
            seq.as_str(),
            row.first_name.as_str(),
            row.last_name.as_str(),
            row.team.as_str(),
            row.phone.as_str(),
            "",
            "",
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn is_manifest_name(name: &str) -> bool {
    name.strip_prefix("vehicle_")
        .and_then(|rest| rest.strip_suffix(".csv"))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

fn remove_stale_manifests(dir: &Path, keep: &[String]) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if is_manifest_name(name) && !keep.iter().any(|k| k == name) && entry.file_type()?.is_file()
        {
            fs::remove_file(entry.path())?;
            debug!(file = name, "stale manifest removed");
        }
    }
    Ok(())
}

/// Writes every export file into `dir`, creating it if needed.
///
/// Files are written into a staging directory under `dir` first and
/// moved into place only once all of them are complete; a failed write
/// leaves the previous export as it was. Files in `dir` that are not
/// exports are never touched.
///
/// Returns the written paths in order: people, vehicles, then one
/// manifest per vehicle.
pub fn write_report(report: &AllocationReport, dir: &Path, delimiter: u8) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let staging = tempfile::Builder::new()
        .prefix(".export-")
        .tempdir_in(dir)?;
    let mut names = Vec::with_capacity(report.manifests.len() + 2);

    write_people(report, File::create(staging.path().join(PEOPLE_FILE))?, delimiter)?;
    names.push(PEOPLE_FILE.to_string());

    write_vehicles(report, File::create(staging.path().join(VEHICLES_FILE))?, delimiter)?;
    names.push(VEHICLES_FILE.to_string());

    for manifest in &report.manifests {
        let name = manifest_file_name(manifest.vehicle_id);
        write_manifest(manifest, File::create(staging.path().join(&name))?, delimiter)?;
        names.push(name);
    }

    remove_stale_manifests(dir, &names)?;
    let mut written = Vec::with_capacity(names.len());
    for name in &names {
        let path = dir.join(name);
        fs::rename(staging.path().join(name), &path)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "export written");
    Ok(written)
}
