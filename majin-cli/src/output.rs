//! Preview output formatting

use anyhow::Result;
use majin_core::TickRate;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One previewed tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub tick: u64,
    pub rate: i64,
    pub seasonal: f64,
    pub noise: f64,
    pub trend: f64,
    pub burst: f64,
}

impl From<TickRate> for PreviewRow {
    fn from(tick: TickRate) -> Self {
        Self {
            tick: tick.tick,
            rate: tick.rate,
            seasonal: tick.seasonal,
            noise: tick.noise,
            trend: tick.trend,
            burst: tick.burst,
        }
    }
}

/// Write each tick as `tick rate`, or as one JSON object per line
///
/// Returns the number of rows written.
pub fn write_preview<W, I>(out: &mut W, ticks: I, json: bool) -> Result<u64>
where
    W: Write,
    I: IntoIterator<Item = TickRate>,
{
    let mut written = 0;
    for tick in ticks {
        let row = PreviewRow::from(tick);
        if json {
            serde_json::to_writer(&mut *out, &row)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{} {}", row.tick, row.rate)?;
        }
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use majin_core::{ScriptedRandom, WorkloadSimulator, WorkloadSpec};

    fn series(spec: WorkloadSpec) -> impl Iterator<Item = TickRate> {
        WorkloadSimulator::with_random(spec, ScriptedRandom::new()).series()
    }

    #[test]
    fn test_plain_preview() {
        let spec = WorkloadSpec { trend: 1.0, duration: 3.0, ..WorkloadSpec::flat(10.0) };
        let mut out = Vec::new();

        assert_eq!(write_preview(&mut out, series(spec), false).unwrap(), 3);
        assert_eq!(String::from_utf8(out).unwrap(), "0 11\n1 12\n2 13\n");
    }

    #[test]
    fn test_json_preview() {
        let spec = WorkloadSpec { duration: 2.0, ..WorkloadSpec::flat(4.0) };
        let mut out = Vec::new();
        write_preview(&mut out, series(spec), true).unwrap();

        let rows: Vec<PreviewRow> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].tick, 1);
        assert_eq!(rows[1].rate, 4);
        assert_eq!(rows[1].burst, 1.0);
    }
}
