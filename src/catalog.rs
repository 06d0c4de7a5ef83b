//! Declarative case catalogs, one per tier.
use crate::paths::LabPaths;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tier {
    Tier1,
    Tier2,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Tier1, Tier::Tier2];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Tier1 => "tier1",
            Tier::Tier2 => "tier2",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Case {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CaseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub data_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_report: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Case dispatch type. Unknown names are kept so they can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum CaseKind {
    GmatScript,
    PythonCommand,
    Unsupported(String),
}

impl From<String> for CaseKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "gmat_script" | "simulator_script" => CaseKind::GmatScript,
            "python_command" | "generic_command" => CaseKind::PythonCommand,
            _ => CaseKind::Unsupported(value),
        }
    }
}

impl From<CaseKind> for String {
    fn from(kind: CaseKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseKind::GmatScript => f.write_str("gmat_script"),
            CaseKind::PythonCommand => f.write_str("python_command"),
            CaseKind::Unsupported(name) => f.write_str(name),
        }
    }
}

pub fn load_catalog(paths: &LabPaths, tier: Tier) -> Result<Catalog> {
    let path = paths.catalog_path(tier.as_str());
    let bytes = fs::read(&path).with_context(|| format!("read catalog {}", path.display()))?;
    let catalog: Catalog = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse catalog {}", path.display()))?;
    Ok(catalog)
}

impl Catalog {
    /// Cases in catalog order, optionally narrowed to one id.
    pub fn select<'a>(&'a self, case_id: Option<&'a str>) -> impl Iterator<Item = &'a Case> {
        self.cases
            .iter()
            .filter(move |case| case_id.is_none_or(|id| case.id == id))
    }
}

/// Render the `list` command output for every tier.
pub fn render_listing(paths: &LabPaths) -> Result<String> {
    let mut out = String::new();
    for tier in Tier::ALL {
        let catalog = load_catalog(paths, tier)?;
        out.push_str(&format!("\n[{tier}] {}\n", catalog.description));
        for case in &catalog.cases {
            out.push_str(&format!("- {}: {}\n", case.id, case.tags.join(", ")));
        }
    }
    Ok(out)
}
