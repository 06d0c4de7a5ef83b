//! Pairwise proximity screening over propagated ephemeris rows.
//!
//! Input rows come from an SGP4 propagation export; rows with a nonzero
//! propagator error code are skipped. Every unordered pair sharing a time step
//! is compared, so cost is quadratic in satellites per step.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_THRESHOLD_KM: f64 = 5.0;

#[derive(Debug, Deserialize)]
struct PropagationRow {
    sat: String,
    minutes: i64,
    x_km: f64,
    y_km: f64,
    z_km: f64,
    err: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conjunction {
    pub minutes: i64,
    pub sat_a: String,
    pub sat_b: String,
    pub distance_km: f64,
}

type Position = [f64; 3];

fn distance(a: &Position, b: &Position) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| (p - q).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Flag pairs within `threshold_km`, ordered by minute then input order.
pub fn screen_rows<R: std::io::Read>(input: R, threshold_km: f64) -> Result<Vec<Conjunction>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut by_minute: BTreeMap<i64, Vec<(String, Position)>> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: PropagationRow = row.context("parse propagation row")?;
        if row.err != 0 {
            continue;
        }
        by_minute
            .entry(row.minutes)
            .or_default()
            .push((row.sat, [row.x_km, row.y_km, row.z_km]));
    }

    let mut flags = Vec::new();
    for (minutes, entries) in &by_minute {
        for (i, (sat_a, pos_a)) in entries.iter().enumerate() {
            for (sat_b, pos_b) in &entries[i + 1..] {
                let distance_km = distance(pos_a, pos_b);
                if distance_km <= threshold_km {
                    flags.push(Conjunction {
                        minutes: *minutes,
                        sat_a: sat_a.clone(),
                        sat_b: sat_b.clone(),
                        distance_km,
                    });
                }
            }
        }
    }
    Ok(flags)
}

pub fn write_flags(path: &Path, flags: &[Conjunction]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("open {}", path.display()))?;
    wtr.write_record(["minutes", "sat_a", "sat_b", "distance_km"])?;
    for flag in flags {
        wtr.write_record(&[
            flag.minutes.to_string(),
            flag.sat_a.clone(),
            flag.sat_b.clone(),
            format!("{:.6}", flag.distance_km),
        ])?;
    }
    wtr.flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Screen `input` and write the flag table to `output`.
pub fn screen_file(input: &Path, output: &Path, threshold_km: f64) -> Result<usize> {
    let file = fs::File::open(input).with_context(|| format!("open {}", input.display()))?;
    let flags = screen_rows(file, threshold_km)?;
    write_flags(output, &flags)?;
    tracing::info!(flags = flags.len(), threshold_km, "screening complete");
    Ok(flags.len())
}
