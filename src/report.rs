use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::gcc::DelaySeries;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Console,
    Csv,
    Json,
}

/// `<dir>/<stem>_timedelay_ms_vs_time_s.csv` next to the input file.
pub fn default_csv_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let name = format!("{}_timedelay_ms_vs_time_s.csv", stem);
    match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

pub fn write_console<W: Write>(out: &mut W, series: &DelaySeries) -> Result<()> {
    writeln!(out, "{:<15} {:<15}", "Time Delay (ms)", "RMS Value")?;
    writeln!(out, "{}", "-".repeat(30))?;
    for est in &series.estimates {
        writeln!(out, "{:<15} {:<15}", est.delay_ms, est.rms)?;
    }
    Ok(())
}

pub fn write_csv<W: Write>(out: &mut W, series: &DelaySeries) -> Result<()> {
    writeln!(out, "Time (s);Time Delay (ms);RMS Value")?;
    for est in &series.estimates {
        writeln!(out, "{:.6};{:.3};{:.3}", est.time_s, est.delay_ms, est.rms)?;
    }
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, series: &DelaySeries) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, series).context("Failed to serialize results")?;
    writeln!(out)?;
    Ok(())
}

/// Write `series` in the requested mode. File modes return the path written.
pub fn emit(
    mode: OutputMode,
    series: &DelaySeries,
    input: &Path,
    output: Option<&Path>,
) -> Result<Option<PathBuf>> {
    match mode {
        OutputMode::Console => {
            let stdout = std::io::stdout();
            write_console(&mut stdout.lock(), series)?;
            Ok(None)
        }
        OutputMode::Csv | OutputMode::Json => {
            let path = match output {
                Some(p) => p.to_path_buf(),
                None if mode == OutputMode::Csv => default_csv_path(input),
                None => default_csv_path(input).with_extension("json"),
            };
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = std::io::BufWriter::new(file);
            if mode == OutputMode::Csv {
                write_csv(&mut writer, series)?;
            } else {
                write_json(&mut writer, series)?;
            }
            writer
                .flush()
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(Some(path))
        }
    }
}
