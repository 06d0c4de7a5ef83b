//! SGP4 propagation of cached two-line element sets.
//!
//! Produces the ephemeris table consumed by `screen`: one row per satellite
//! per time step, measured in minutes since each satellite's own epoch.
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const MAX_SATELLITES: usize = 25;
pub const DEFAULT_HOURS: u32 = 24;
pub const DEFAULT_STEP_MIN: u32 = 10;
pub const OUTPUT_FILE_NAME: &str = "sgp4_propagation.csv";

/// Error code written for steps the propagator rejects.
const PROPAGATION_FAILED: i32 = 1;

pub struct Satellite {
    pub name: String,
    constants: sgp4::Constants,
}

#[derive(Debug, Serialize)]
struct PropagationRow<'a> {
    sat: &'a str,
    minutes: u32,
    x_km: f64,
    y_km: f64,
    z_km: f64,
    vx_kms: f64,
    vy_kms: f64,
    vz_kms: f64,
    err: i32,
}

/// Parse name/line-1/line-2 triples, keeping at most `max` satellites.
///
/// Blank lines are ignored; a line that does not start a valid triple is
/// skipped on its own so the parser can realign.
pub fn parse_tles(text: &str, max: usize) -> Result<Vec<Satellite>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let mut satellites = Vec::new();
    let mut i = 0;
    while i + 2 < lines.len() && satellites.len() < max {
        let (name, line1, line2) = (lines[i], lines[i + 1], lines[i + 2]);
        if !(line1.starts_with("1 ") && line2.starts_with("2 ")) {
            i += 1;
            continue;
        }
        let elements =
            sgp4::Elements::from_tle(Some(name.to_string()), line1.as_bytes(), line2.as_bytes())
                .with_context(|| format!("parse TLE for {name}"))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .with_context(|| format!("initialize SGP4 for {name}"))?;
        satellites.push(Satellite {
            name: name.to_string(),
            constants,
        });
        i += 3;
    }
    Ok(satellites)
}

/// Write one row per satellite for `0..=hours*60` minutes every `step_min`.
pub fn write_propagation<W: std::io::Write>(
    out: W,
    satellites: &[Satellite],
    hours: u32,
    step_min: u32,
) -> Result<()> {
    if step_min == 0 {
        return Err(anyhow!("step must be at least one minute"));
    }
    let mut wtr = csv::Writer::from_writer(out);
    let max_minutes = hours * 60;
    for sat in satellites {
        for minutes in (0..=max_minutes).step_by(step_min as usize) {
            let row = match sat
                .constants
                .propagate(sgp4::MinutesSinceEpoch(f64::from(minutes)))
            {
                Ok(prediction) => PropagationRow {
                    sat: &sat.name,
                    minutes,
                    x_km: prediction.position[0],
                    y_km: prediction.position[1],
                    z_km: prediction.position[2],
                    vx_kms: prediction.velocity[0],
                    vy_kms: prediction.velocity[1],
                    vz_kms: prediction.velocity[2],
                    err: 0,
                },
                Err(err) => {
                    tracing::debug!(sat = %sat.name, minutes, error = %err, "propagation failed");
                    PropagationRow {
                        sat: &sat.name,
                        minutes,
                        x_km: f64::NAN,
                        y_km: f64::NAN,
                        z_km: f64::NAN,
                        vx_kms: f64::NAN,
                        vy_kms: f64::NAN,
                        vz_kms: f64::NAN,
                        err: PROPAGATION_FAILED,
                    }
                }
            };
            wtr.serialize(row).context("write propagation row")?;
        }
    }
    wtr.flush().context("flush propagation table")?;
    Ok(())
}

/// Propagate the TLE file at `input` into `output`; returns the satellite count.
pub fn propagate_file(input: &Path, output: &Path, hours: u32, step_min: u32) -> Result<usize> {
    let text = fs::read_to_string(input).with_context(|| format!("read {}", input.display()))?;
    let satellites = parse_tles(&text, MAX_SATELLITES)?;
    if satellites.is_empty() {
        return Err(anyhow!("No satellites parsed from TLE file {}", input.display()));
    }
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = fs::File::create(output).with_context(|| format!("create {}", output.display()))?;
    write_propagation(file, &satellites, hours, step_min)?;
    tracing::info!(satellites = satellites.len(), hours, step_min, "propagation complete");
    Ok(satellites.len())
}
