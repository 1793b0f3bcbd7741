use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Defeat-probability estimate for one boss. The feed omits or nulls the
/// value once a boss has been taken down, so absence is a state of its own
/// rather than a magic number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Option<f64>")]
pub enum Chance {
    Known(f64),
    #[default]
    Unknown,
}

impl From<Option<f64>> for Chance {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(p) => Chance::Known(p),
            None => Chance::Unknown,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BossRecord {
    pub name: String,
    #[serde(default)]
    pub killed: bool,
    #[serde(default)]
    pub chance: Chance,
}

/// One world's `latest.json`: the boss list plus an opaque feed timestamp
/// that is reproduced verbatim in the page footer.
#[derive(Clone, Debug, Deserialize)]
pub struct BossReport {
    pub bosses: Vec<BossRecord>,
    pub timestamp: String,
}

pub fn parse_report(json: &str) -> Result<BossReport> {
    let report: BossReport = serde_json::from_str(json).context("malformed boss report JSON")?;
    validate(&report)?;
    Ok(report)
}

// A nameless record or a pending boss without an estimate would render a
// broken row, so both are rejected before any HTML is produced.
fn validate(report: &BossReport) -> Result<()> {
    for (i, boss) in report.bosses.iter().enumerate() {
        if boss.name.is_empty() { bail!("boss #{} has an empty name", i + 1); }
        if !boss.killed && matches!(boss.chance, Chance::Unknown) {
            bail!("pending boss {:?} has no chance estimate", boss.name);
        }
    }
    Ok(())
}
