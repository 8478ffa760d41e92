//! Text and JSON writers for the diagnostic results.
//!
//! Text reports are whitespace-separated tables with a `#` header line so
//! they can be loaded directly by plotting tools.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{EdgeReport, PhotosphereReport, TauSpectrum};

pub const SPECTRUM_EXTENSION: &str = "tau_spec.diag";
pub const EDGES_EXTENSION: &str = "edges.diag";
pub const PHOTOSPHERE_EXTENSION: &str = "photosphere";

/// `<root>.<extension>`
pub fn output_path(root: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{root}.{extension}"))
}

/// One row per frequency: `Freq. Lambda` then the optical depth along each
/// sightline.
pub fn write_spectrum<W: Write>(mut writer: W, spectrum: &TauSpectrum) -> Result<()> {
    write!(writer, "# Freq.        Lambda      ")?;
    for line in &spectrum.sightlines {
        write!(writer, " {:>12}", line.name)?;
    }
    writeln!(writer)?;

    let wavelengths = spectrum.wavelengths();
    for (j, (&freq, lambda)) in spectrum.frequencies.iter().zip(wavelengths).enumerate() {
        write!(writer, "{:12.6e} {:12.6e}", freq, lambda)?;
        for tau in spectrum.tau.column(j) {
            write!(writer, " {:12.6e}", tau)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// One row per sightline: the optical depth at each edge, then the column
/// density of the last successful edge.
pub fn write_edges<W: Write>(mut writer: W, report: &EdgeReport) -> Result<()> {
    write!(writer, "# {:<10}", "Sightline")?;
    for edge in &report.edges {
        write!(writer, " {:>12}", edge.name)?;
    }
    writeln!(writer, " {:>12}", format!("N[{}]", report.column.units()))?;

    for (i, line) in report.sightlines.iter().enumerate() {
        write!(writer, "{:<12}", line.name)?;
        for tau in report.tau.row(i) {
            write!(writer, " {:12.6e}", tau)?;
        }
        writeln!(writer, " {:12.6e}", report.last_edge_column[i])?;
    }
    Ok(())
}

/// One row per sightline: `x y z rcyl` of the photosphere. Failed
/// sightlines keep the sentinel position.
pub fn write_photosphere<W: Write>(mut writer: W, report: &PhotosphereReport) -> Result<()> {
    writeln!(
        writer,
        "# tau_stop = {} freq = {:e} Hz",
        report.stop_depth, report.frequency
    )?;
    writeln!(
        writer,
        "# {:<10} {:>12} {:>12} {:>12} {:>12}",
        "Sightline", "x", "y", "z", "rcyl"
    )?;
    for (line, pos) in report.sightlines.iter().zip(&report.positions) {
        writeln!(
            writer,
            "{:<12} {:12.6e} {:12.6e} {:12.6e} {:12.6e}",
            line.name,
            pos.x,
            pos.y,
            pos.z,
            pos.cylindrical_radius()
        )?;
    }
    Ok(())
}

/// Pretty-printed JSON of any report.
pub fn write_json<W: Write, T: Serialize>(writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(writer, value).context("Failed to serialize report")?;
    Ok(())
}

/// Writes a report to `path` with the given writer function.
pub fn write_file<T, F>(path: &Path, value: &T, write: F) -> Result<()>
where
    T: ?Sized,
    F: FnOnce(&mut BufWriter<File>, &T) -> Result<()>,
{
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer, value).with_context(|| format!("Failed to write: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write: {}", path.display()))?;
    Ok(())
}
