//! Command-line front end.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Instant;
use tracing::{info, warn};

use crate::diag::report::{
    EDGES_EXTENSION, PHOTOSPHERE_EXTENSION, SPECTRUM_EXTENSION, output_path, write_edges,
    write_file, write_json, write_photosphere, write_spectrum,
};
use crate::diag::{SightlineProvider, evaluate_edges, locate_photosphere, optical_depth_spectrum};
use crate::model::io::{model_path, read_model, root_name};
use crate::transport::CentralSource;
use crate::{BandTable, ColumnMode, DiagnosticConfig, Model, RelativityMode};

/// Optical depth diagnostics along observer sightlines of an outflow model
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root name of the model (reads <ROOT>.model.json)
    pub root: String,

    /// Domain to evaluate
    #[arg(short, long, default_value_t = 0)]
    pub domain: usize,

    /// Locate the surface where the electron-scattering optical depth reaches TAU
    #[arg(short = 'p', long = "tau-stop", value_name = "TAU")]
    pub tau_stop: Option<f64>,

    /// Column density of a single ion (index into the atomic data)
    #[arg(long, value_name = "N", conflicts_with = "hydrogen")]
    pub cion: Option<usize>,

    /// Column density of hydrogen instead of mass
    #[arg(long)]
    pub hydrogen: bool,

    /// Linear Doppler shifts instead of the full relativistic transform
    #[arg(long)]
    pub classic: bool,

    /// Print the frequency band table of the model's sampling setup
    #[arg(long)]
    pub bands: bool,

    /// Also write every report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Diagnostic settings selected by the flags.
    pub fn config(&self) -> DiagnosticConfig {
        let mut config = DiagnosticConfig::new();
        if self.classic {
            config.relativity = RelativityMode::Linear;
        }
        config.column = match (self.cion, self.hydrogen) {
            (Some(n), _) => ColumnMode::Ion(n),
            (None, true) => ColumnMode::Hydrogen,
            (None, false) => ColumnMode::Mass,
        };
        if let Some(tau) = self.tau_stop {
            config.stop_depth = tau;
        }
        config
    }
}

/// Loads the model and runs the selected diagnostics, writing one report
/// file per diagnostic next to the model.
pub fn run(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let root = root_name(&cli.root);
    let model = read_model(&model_path(&root))?;
    info!(
        "Loaded model '{}' with {} domain(s)",
        model.name,
        model.ndomains()
    );

    if cli.bands {
        print_bands(&model)?;
    }

    let view = model
        .view(cli.domain)
        .with_context(|| format!("Cannot evaluate domain {}", cli.domain))?;
    let source = CentralSource::for_model(&view);
    let sightlines = model.sightlines();
    let config = cli.config();

    if cli.tau_stop.is_some() {
        let report = locate_photosphere(&view, &source, &sightlines, &config)?;
        write_file(
            &output_path(&root, PHOTOSPHERE_EXTENSION),
            &report,
            |w, r| write_photosphere(w, r),
        )?;
        if cli.json {
            write_file(
                &output_path(&root, &format!("{PHOTOSPHERE_EXTENSION}.json")),
                &report,
                |w, r| write_json(w, r),
            )?;
        }
        if report.failures > 0 {
            warn!("{} sightline(s) without a photosphere", report.failures);
        }
    } else {
        let edges = evaluate_edges(&view, &source, &sightlines, &config)?;
        write_file(&output_path(&root, EDGES_EXTENSION), &edges, |w, r| {
            write_edges(w, r)
        })?;

        let spectrum =
            optical_depth_spectrum(&view, &source, &sightlines, model.spectrum.as_ref(), &config)?;
        write_file(&output_path(&root, SPECTRUM_EXTENSION), &spectrum, |w, r| {
            write_spectrum(w, r)
        })?;

        if cli.json {
            write_file(
                &output_path(&root, &format!("{EDGES_EXTENSION}.json")),
                &edges,
                |w, r| write_json(w, r),
            )?;
            write_file(
                &output_path(&root, &format!("{SPECTRUM_EXTENSION}.json")),
                &spectrum,
                |w, r| write_json(w, r),
            )?;
        }
        let failures = edges.failures + spectrum.failures;
        if failures > 0 {
            warn!("{} photon(s) could not be integrated", failures);
        }
    }

    info!("Completed in {:.2?}", start.elapsed());
    Ok(())
}

fn print_bands(model: &Model) -> Result<()> {
    let Some(sampling) = &model.sampling else {
        warn!("Model '{}' has no sampling setup", model.name);
        return Ok(());
    };
    let table: BandTable = sampling
        .band_table()
        .context("Cannot build the frequency band table")?;

    println!("# Sampling mode: {}", sampling.mode.name());
    println!(
        "# {:>4} {:>12} {:>12} {:>12}",
        "band", "f1", "f2", "min_frac"
    );
    for (i, band) in table.iter().enumerate() {
        println!(
            "{:>6} {:12.6e} {:12.6e} {:12.3}",
            i, band.f1, band.f2, band.min_fraction
        );
    }
    Ok(())
}
