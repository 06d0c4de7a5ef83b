//! Normalized baseline export from an archived run.
//!
//! Pulls the final numeric report rows of a few reference cases out of a run
//! snapshot and writes them as one JSON document for cross-tool comparison.
use crate::paths::LabPaths;
use crate::staging::write_json;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASELINE_PATH: &str = "docs/interop/humeris_compare_baseline.json";

const BASIC_LEO: &str = "basic_leo_two_body";
const J2_RAAN_DRIFT: &str = "advanced_j2_raan_drift";
const OUMUAMUA: &str = "advanced_oumuamua_hyperbolic";
const OEM_CASE: &str = "headless_oem_ephemeris_propagation";
const OEM_FILE: &str = "KeplerianElements.txt";

#[derive(Debug, Serialize)]
pub struct Baseline {
    pub run_id: String,
    pub cases: BaselineCases,
    pub oem_summary: OemSummary,
}

#[derive(Debug, Serialize)]
pub struct BaselineCases {
    pub basic_leo_two_body: TwoBodyRow,
    pub advanced_j2_raan_drift: RaanDriftRow,
    pub advanced_oumuamua_hyperbolic: HyperbolicRow,
}

#[derive(Debug, Serialize)]
pub struct TwoBodyRow {
    #[serde(rename = "startSMA")]
    pub start_sma: f64,
    #[serde(rename = "startECC")]
    pub start_ecc: f64,
    #[serde(rename = "startRMAG")]
    pub start_rmag: f64,
    #[serde(rename = "endSMA")]
    pub end_sma: f64,
    #[serde(rename = "endECC")]
    pub end_ecc: f64,
    #[serde(rename = "endRMAG")]
    pub end_rmag: f64,
    #[serde(rename = "elapsedSecs")]
    pub elapsed_secs: f64,
}

#[derive(Debug, Serialize)]
pub struct RaanDriftRow {
    #[serde(rename = "startRAAN")]
    pub start_raan: f64,
    #[serde(rename = "startINC")]
    pub start_inc: f64,
    #[serde(rename = "startECC")]
    pub start_ecc: f64,
    #[serde(rename = "endRAAN")]
    pub end_raan: f64,
    #[serde(rename = "endINC")]
    pub end_inc: f64,
    #[serde(rename = "endECC")]
    pub end_ecc: f64,
    #[serde(rename = "elapsedDays")]
    pub elapsed_days: f64,
}

#[derive(Debug, Serialize)]
pub struct HyperbolicRow {
    #[serde(rename = "startECC")]
    pub start_ecc: f64,
    #[serde(rename = "startINC")]
    pub start_inc: f64,
    #[serde(rename = "startRMAG")]
    pub start_rmag: f64,
    #[serde(rename = "endECC")]
    pub end_ecc: f64,
    #[serde(rename = "endINC")]
    pub end_inc: f64,
    #[serde(rename = "endRMAG")]
    pub end_rmag: f64,
    #[serde(rename = "elapsedDays")]
    pub elapsed_days: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OemSummary {
    pub rows: usize,
    pub first: String,
    pub last: String,
}

/// Last non-empty line made of exactly `N` numeric tokens.
fn read_last_numeric_row<const N: usize>(path: &Path) -> Result<[f64; N]> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    text.lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find_map(|line| {
            let values: Vec<f64> = line
                .split_whitespace()
                .map(str::parse)
                .collect::<Result<_, _>>()
                .ok()?;
            values.try_into().ok()
        })
        .ok_or_else(|| anyhow!("No numeric row with {N} values in {}", path.display()))
}

fn report_path(run_dir: &Path, case_id: &str) -> PathBuf {
    run_dir
        .join("cases")
        .join(case_id)
        .join(format!("{case_id}_results.txt"))
}

/// Header line excluded from the row count; first and last are data rows.
fn oem_summary(path: &Path) -> Result<OemSummary> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let data = lines.get(1..).unwrap_or_default();
    Ok(OemSummary {
        rows: data.len(),
        first: data.first().map(|line| line.to_string()).unwrap_or_default(),
        last: data.last().map(|line| line.to_string()).unwrap_or_default(),
    })
}

pub fn build_baseline(run_dir: &Path) -> Result<Baseline> {
    let run_id = run_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("run directory has no name: {}", run_dir.display()))?;

    let [start_sma, start_ecc, start_rmag, end_sma, end_ecc, end_rmag, elapsed_secs] =
        read_last_numeric_row(&report_path(run_dir, BASIC_LEO))?;
    let [start_raan, start_inc, j2_start_ecc, end_raan, end_inc, j2_end_ecc, j2_elapsed] =
        read_last_numeric_row(&report_path(run_dir, J2_RAAN_DRIFT))?;
    let [hyp_start_ecc, hyp_start_inc, hyp_start_rmag, hyp_end_ecc, hyp_end_inc, hyp_end_rmag, hyp_elapsed] =
        read_last_numeric_row(&report_path(run_dir, OUMUAMUA))?;

    Ok(Baseline {
        run_id,
        cases: BaselineCases {
            basic_leo_two_body: TwoBodyRow {
                start_sma,
                start_ecc,
                start_rmag,
                end_sma,
                end_ecc,
                end_rmag,
                elapsed_secs,
            },
            advanced_j2_raan_drift: RaanDriftRow {
                start_raan,
                start_inc,
                start_ecc: j2_start_ecc,
                end_raan,
                end_inc,
                end_ecc: j2_end_ecc,
                elapsed_days: j2_elapsed,
            },
            advanced_oumuamua_hyperbolic: HyperbolicRow {
                start_ecc: hyp_start_ecc,
                start_inc: hyp_start_inc,
                start_rmag: hyp_start_rmag,
                end_ecc: hyp_end_ecc,
                end_inc: hyp_end_inc,
                end_rmag: hyp_end_rmag,
                elapsed_days: hyp_elapsed,
            },
        },
        oem_summary: oem_summary(&run_dir.join("cases").join(OEM_CASE).join(OEM_FILE))?,
    })
}

/// Run directory named by `LATEST`.
pub fn latest_run_dir(paths: &LabPaths) -> Result<PathBuf> {
    let latest = paths.latest_path();
    let run_id = fs::read_to_string(&latest)
        .with_context(|| format!("read {}", latest.display()))?;
    let run_id = run_id.trim();
    if run_id.is_empty() {
        return Err(anyhow!("{} is empty", latest.display()));
    }
    Ok(paths.run_dir(run_id))
}

pub fn export_baseline(run_dir: &Path, out: &Path) -> Result<()> {
    let baseline = build_baseline(run_dir)?;
    write_json(out, &baseline)?;
    tracing::info!(run_id = %baseline.run_id, out = %out.display(), "baseline exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, text).expect("write");
    }

    fn seed_run(run_dir: &Path) {
        write(
            &report_path(run_dir, BASIC_LEO),
            "Sat.SMA Sat.ECC Sat.RMAG\n7000 0.001 6993\n\n7000.5 0.0011 6992.2 7000.4 0.0012 7007.9 86400\n",
        );
        write(
            &report_path(run_dir, J2_RAAN_DRIFT),
            "98.1 97.8 0.0001 91.2 97.8 0.0001 30\nsummary done\n",
        );
        write(
            &report_path(run_dir, OUMUAMUA),
            "1.2 122.7 1.5e8 1.2 122.7 3.1e8 400\n",
        );
        write(
            &run_dir.join("cases").join(OEM_CASE).join(OEM_FILE),
            "Time SMA ECC\n\n  t0 7000 0.001\nt1 7001 0.001\nt2 7002 0.001  \n",
        );
    }

    #[test]
    fn export_picks_last_numeric_rows() {
        let temp = tempfile::tempdir().expect("tempdir");
        let run_dir = temp.path().join("run-0007-abc1234-clean");
        seed_run(&run_dir);
        let out = temp.path().join("interop").join("baseline.json");

        export_baseline(&run_dir, &out).expect("export");

        let text = fs::read_to_string(&out).expect("read baseline");
        let value: Value = serde_json::from_str(&text).expect("parse baseline");
        assert_eq!(value["run_id"], "run-0007-abc1234-clean");
        let leo = &value["cases"]["basic_leo_two_body"];
        assert_eq!(leo["startSMA"], 7000.5);
        assert_eq!(leo["endRMAG"], 7007.9);
        assert_eq!(leo["elapsedSecs"], 86400.0);
        let drift = &value["cases"]["advanced_j2_raan_drift"];
        assert_eq!(drift["startRAAN"], 98.1);
        assert_eq!(drift["elapsedDays"], 30.0);
        assert_eq!(value["cases"]["advanced_oumuamua_hyperbolic"]["endRMAG"], 3.1e8);
        assert_eq!(value["oem_summary"]["rows"], 3);
        assert_eq!(value["oem_summary"]["first"], "t0 7000 0.001");
        assert_eq!(value["oem_summary"]["last"], "t2 7002 0.001");

        let leo_keys = text.find("\"startSMA\"").expect("startSMA");
        assert!(leo_keys < text.find("\"elapsedSecs\"").expect("elapsedSecs"));
    }

    #[test]
    fn report_without_full_row_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let run_dir = temp.path().join("run-0001-norepo");
        seed_run(&run_dir);
        write(&report_path(&run_dir, OUMUAMUA), "1.2 122.7 1.5e8\nno data\n");

        let err = build_baseline(&run_dir).expect_err("short row");
        assert!(err.to_string().contains("No numeric row with 7 values"));
    }

    #[test]
    fn header_only_ephemeris_summarizes_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(OEM_FILE);
        fs::write(&path, "Time SMA ECC\n").expect("write");
        assert_eq!(
            oem_summary(&path).expect("summary"),
            OemSummary {
                rows: 0,
                first: String::new(),
                last: String::new(),
            }
        );
    }

    #[test]
    fn latest_names_the_run_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LabPaths::new(temp.path().to_path_buf());
        write(&paths.latest_path(), "run-0003-abc1234-clean\n");
        assert_eq!(
            latest_run_dir(&paths).expect("latest"),
            paths.run_dir("run-0003-abc1234-clean")
        );
    }
}
