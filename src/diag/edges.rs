use ndarray::Array2;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::model::FlowModel;
use crate::transport::{ColumnMode, PhotonFactory};

use super::{
    DiagnosticConfig, DiagnosticError, SightLine, allocate, allocate_table, check_sightlines,
    trace_photon,
};

/// A named photoionization edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub name: &'static str,
    /// Rest-frame frequency (Hz).
    pub frequency: f64,
}

impl Edge {
    pub const fn new(name: &'static str, frequency: f64) -> Self {
        Self { name, frequency }
    }
}

pub const PHOTOIONIZATION_EDGES: [Edge; 4] = [
    Edge::new("HLymanEdge", 3.387485e15),
    Edge::new("HBalmerEdge", 8.293014e14),
    Edge::new("HeI24eVEdge", 5.9483e15),
    Edge::new("HeII54eVEdge", 1.394384e16),
];

/// Optical depth at each edge for every sightline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeReport {
    pub sightlines: Vec<SightLine>,
    pub edges: Vec<Edge>,
    /// Optical depth indexed by `[sightline, edge]`.
    pub tau: Array2<f64>,
    /// Column density of the last edge that integrated successfully along
    /// each sightline. Zero if none did.
    pub last_edge_column: Vec<f64>,
    pub column: ColumnMode,
    pub failures: usize,
}

/// Evaluates the optical depth at the standard photoionization edges.
pub fn evaluate_edges<M, F>(
    model: &M,
    factory: &F,
    sightlines: &[SightLine],
    config: &DiagnosticConfig,
) -> Result<EdgeReport, DiagnosticError>
where
    M: FlowModel + ?Sized,
    F: PhotonFactory + ?Sized,
{
    evaluate_edges_at(model, factory, sightlines, &PHOTOIONIZATION_EDGES, config)
}

/// Evaluates the optical depth at an arbitrary list of edges.
pub fn evaluate_edges_at<M, F>(
    model: &M,
    factory: &F,
    sightlines: &[SightLine],
    edges: &[Edge],
    config: &DiagnosticConfig,
) -> Result<EdgeReport, DiagnosticError>
where
    M: FlowModel + ?Sized,
    F: PhotonFactory + ?Sized,
{
    config.validate(model)?;
    check_sightlines(sightlines)?;
    if edges.is_empty() {
        return Err(DiagnosticError::InvalidConfig("no edges to evaluate".into()));
    }

    let n_edges = edges.len();
    let mut tau = allocate_table(sightlines.len(), n_edges, 0.0, "edge_tau")?;
    let mut last_edge_column = allocate(sightlines.len(), 0.0, "edge_column")?;
    let options = config.integration_options();

    info!(
        "Evaluating optical depth at {} edges along {} sightlines",
        n_edges,
        sightlines.len()
    );

    let failures: usize = tau
        .par_chunks_mut(n_edges)
        .zip(last_edge_column.par_iter_mut())
        .zip(sightlines.par_iter())
        .map(|((row, column), line)| {
            let mut failed = 0;
            for (tau, edge) in row.iter_mut().zip(edges) {
                match trace_photon(model, factory, edge.frequency, line.direction, &options) {
                    Ok(result) => {
                        *tau = result.optical_depth;
                        *column = result.column_density;
                    }
                    Err(err) => {
                        warn!("{}: skipping {}: {}", line.name, edge.name, err);
                        failed += 1;
                    }
                }
            }
            failed
        })
        .sum();

    let tau = Array2::from_shape_vec((sightlines.len(), n_edges), tau)
        .map_err(|e| DiagnosticError::InvalidConfig(e.to_string()))?;

    let report = EdgeReport {
        sightlines: sightlines.to_vec(),
        edges: edges.to_vec(),
        tau,
        last_edge_column,
        column: config.column,
        failures,
    };
    report.log();
    Ok(report)
}

impl EdgeReport {
    fn log(&self) {
        for (i, line) in self.sightlines.iter().enumerate() {
            let values = self
                .edges
                .iter()
                .zip(self.tau.row(i))
                .map(|(edge, tau)| format!("{}: {:.2e}", edge.name, tau))
                .collect::<Vec<_>>()
                .join("  ");
            info!(
                "{}: {}  column: {:.2e} {}",
                line.name,
                values,
                self.last_edge_column[i],
                self.column.units()
            );
        }
    }
}
