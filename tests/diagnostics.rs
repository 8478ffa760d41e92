use taudiag::bands::{BandError, BandMode, BandTable, MAX_BANDS, UserBands};
use taudiag::constants::{HEV, THOMSON, VLIGHT};
use taudiag::diag::spectrum::{N_FREQ_BINS, frequency_grid, spectrum_range};
use taudiag::diag::{
    DefaultSightlines, DiagnosticConfig, PHOTOSPHERE_SENTINEL, SightLine, SightlineProvider,
    evaluate_edges, locate_photosphere, optical_depth_spectrum,
};
use taudiag::model::io::{model_path, read_model, write_model};
use taudiag::model::{CartesianGrid, CellPlasma, FlowModel, Model, Observer, SpectrumSetup};
use taudiag::transport::{CentralSource, Photon, PhotonError, PhotonFactory};
use taudiag::{Point, Vector};

const R: f64 = 1e11;
const NE: f64 = 1e10;
const RHO: f64 = 2e-14;

/// Uniform cube [-R, R]^3 of ionized gas with some neutral hydrogen.
fn cube_model(core_radius: f64) -> Model {
    let plasma = CellPlasma::new(RHO, 1e10, NE).with_ions(vec![1e2, 0.0, 0.0]);
    let grid = CartesianGrid::uniform(Point::new(-R, -R, -R), [R / 10.0; 3], [20, 20, 20], plasma)
        .unwrap();
    Model::new("cube", core_radius, vec![grid])
}

/// Pure electron-scattering cube, grey at every frequency.
fn grey_model() -> Model {
    let grid = CartesianGrid::uniform(
        Point::new(-R, -R, -R),
        [R / 10.0; 3],
        [20, 20, 20],
        CellPlasma::new(RHO, 1e10, NE),
    )
    .unwrap();
    Model::new("grey", 0.0, vec![grid])
}

/// Central source that refuses to emit at one frequency.
struct FlakySource {
    inner: CentralSource,
    bad_frequency: f64,
}

impl PhotonFactory for FlakySource {
    fn create(&self, frequency: f64, direction: Vector) -> Result<Photon, PhotonError> {
        if frequency == self.bad_frequency {
            return Err(PhotonError::InvalidFrequency(frequency));
        }
        self.inner.create(frequency, direction)
    }
}

#[test]
fn test_edges_match_analytic_slab() {
    let model = grey_model();
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = vec![
        SightLine::new("+x", Vector::new(1., 0., 0.)).unwrap(),
        SightLine::new("-y", Vector::new(0., -1., 0.)).unwrap(),
        SightLine::new("+z", Vector::new(0., 0., 1.)).unwrap(),
    ];

    let report = evaluate_edges(&view, &source, &sightlines, &DiagnosticConfig::new()).unwrap();
    let expected = THOMSON * NE * R;
    assert_eq!(report.failures, 0);
    for tau in report.tau.iter() {
        assert!((tau - expected).abs() / expected < 1e-9);
    }
    for column in &report.last_edge_column {
        assert!((column - RHO * R).abs() / (RHO * R) < 1e-9);
    }
}

#[test]
fn test_edges_along_default_sightlines() {
    let model = grey_model();
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = DefaultSightlines.sightlines();

    let report = evaluate_edges(&view, &source, &sightlines, &DiagnosticConfig::new()).unwrap();
    assert_eq!(report.failures, 0);
    for (i, line) in sightlines.iter().enumerate() {
        let d = line.direction;
        let path = R / d.dx.abs().max(d.dy.abs()).max(d.dz.abs());
        let expected = THOMSON * NE * path;
        let tau = report.tau[[i, 0]];
        assert!(
            (tau - expected).abs() / expected < 1e-9,
            "{}: tau = {} expected {}",
            line.name,
            tau,
            expected
        );
    }
}

#[test]
fn test_edge_optical_depth_rises_above_lyman_edge() {
    let model = cube_model(0.0);
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = vec![SightLine::new("+x", Vector::new(1., 0., 0.)).unwrap()];

    let report = evaluate_edges(&view, &source, &sightlines, &DiagnosticConfig::new()).unwrap();
    let electron_scattering = THOMSON * NE * R;
    // HBalmerEdge is below the hydrogen threshold, HLymanEdge just above it
    assert!((report.tau[[0, 1]] - electron_scattering).abs() / electron_scattering < 1e-9);
    assert!(report.tau[[0, 0]] > report.tau[[0, 1]]);
}

#[test]
fn test_spectrum_frequency_grid() {
    let model = grey_model();
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = DefaultSightlines.sightlines();

    let spectrum =
        optical_depth_spectrum(&view, &source, &sightlines, None, &DiagnosticConfig::new())
            .unwrap();
    let freqs = &spectrum.frequencies;
    assert_eq!(freqs.len(), N_FREQ_BINS);
    assert_eq!(spectrum.tau.dim(), (sightlines.len(), N_FREQ_BINS));

    let first = VLIGHT / 1e-4;
    let last = VLIGHT / 1e-6;
    assert!((freqs[0] - first).abs() / first < 1e-12);
    assert!((freqs[N_FREQ_BINS - 1] - last).abs() / last < 1e-12);

    let step = (last - first) / (N_FREQ_BINS - 1) as f64;
    for pair in freqs.windows(2) {
        assert!(pair[1] > pair[0]);
        assert!(((pair[1] - pair[0]) - step).abs() / step < 1e-6);
    }

    // Grey medium: flat spectra
    for row in spectrum.tau.rows() {
        assert!(row.iter().all(|&t| (t - row[0]).abs() <= 1e-12 * row[0]));
    }
}

#[test]
fn test_spectrum_uses_model_wavelength_range() {
    let model = grey_model().with_spectrum(SpectrumSetup {
        wavelength_min: 900.0,
        wavelength_max: 1300.0,
        observers: vec![Observer::new(30.0, 0.5)],
    });
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = model.sightlines();
    assert_eq!(sightlines.len(), 1);
    assert_eq!(sightlines[0].name, "A30P0.50");

    let spectrum = optical_depth_spectrum(
        &view,
        &source,
        &sightlines,
        model.spectrum.as_ref(),
        &DiagnosticConfig::new(),
    )
    .unwrap();
    assert_eq!(spectrum.freq_min(), VLIGHT / (1300.0 * 1e-8));
    assert_eq!(spectrum.freq_max(), VLIGHT / (900.0 * 1e-8));
}

#[test]
fn test_spectrum_failure_isolation() {
    let model = cube_model(0.0);
    let view = model.view(0).unwrap();
    let sightlines = DefaultSightlines.sightlines();
    let config = DiagnosticConfig::new();

    let source = CentralSource::for_model(&view);
    let clean = optical_depth_spectrum(&view, &source, &sightlines, None, &config).unwrap();
    assert_eq!(clean.failures, 0);

    let (fmin, fmax) = spectrum_range(None);
    let bad_bin = 37;
    let flaky = FlakySource {
        inner: source,
        bad_frequency: frequency_grid(fmin, fmax, N_FREQ_BINS).unwrap()[bad_bin],
    };
    let broken = optical_depth_spectrum(&view, &flaky, &sightlines, None, &config).unwrap();
    assert_eq!(broken.failures, sightlines.len());
    assert_eq!(broken.frequencies, clean.frequencies);

    for ((i, j), &tau) in broken.tau.indexed_iter() {
        if j == bad_bin {
            assert_eq!(tau, 0.0);
        } else {
            assert_eq!(tau.to_bits(), clean.tau[[i, j]].to_bits());
        }
    }
}

#[test]
fn test_failed_sightline_does_not_affect_others() {
    // Thin in z: a source with a large core launches outside the domain along +z
    let grid = CartesianGrid::uniform(
        Point::new(-R, -R, -0.05 * R),
        [R / 10.0, R / 10.0, R / 100.0],
        [20, 20, 10],
        CellPlasma::new(RHO, 1e10, NE),
    )
    .unwrap();
    let model = Model::new("thin", 0.1 * R, vec![grid]);
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let good = SightLine::new("+x", Vector::new(1., 0., 0.)).unwrap();
    let bad = SightLine::new("+z", Vector::new(0., 0., 1.)).unwrap();
    let config = DiagnosticConfig::new();

    let alone = optical_depth_spectrum(&view, &source, &[good.clone()], None, &config).unwrap();
    let mixed =
        optical_depth_spectrum(&view, &source, &[bad.clone(), good.clone()], None, &config)
            .unwrap();
    assert_eq!(alone.failures, 0);
    assert_eq!(mixed.failures, N_FREQ_BINS);
    assert!(mixed.row(0).iter().all(|&t| t == 0.0));
    assert_eq!(mixed.row(1), alone.row(0));

    let photosphere = locate_photosphere(&view, &source, &[good, bad], &config).unwrap();
    assert_eq!(photosphere.failures, 1);
    assert!(photosphere.is_resolved(0));
    assert_eq!(photosphere.positions[1], PHOTOSPHERE_SENTINEL);
}

#[test]
fn test_photosphere_zero_depth_is_launch_point() {
    let model = cube_model(0.1 * R);
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = DefaultSightlines.sightlines();
    let mut config = DiagnosticConfig::new();
    config.stop_depth = 0.0;

    let report = locate_photosphere(&view, &source, &sightlines, &config).unwrap();
    assert_eq!(report.failures, 0);
    for (line, position) in sightlines.iter().zip(&report.positions) {
        let launch = source
            .create(config.photosphere_frequency, line.direction)
            .unwrap()
            .position;
        assert_eq!(*position, launch);
    }
}

#[test]
fn test_photosphere_unreachable_depth_escapes() {
    let model = cube_model(0.0);
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = vec![
        SightLine::new("+x", Vector::new(1., 0., 0.)).unwrap(),
        SightLine::new("-z", Vector::new(0., 0., -1.)).unwrap(),
    ];
    let mut config = DiagnosticConfig::new();
    config.stop_depth = 100.0 * THOMSON * NE * R;

    let report = locate_photosphere(&view, &source, &sightlines, &config).unwrap();
    assert_eq!(report.failures, 0);
    assert!((report.positions[0].x - R).abs() / R < 1e-12);
    assert!((report.positions[1].z + R).abs() / R < 1e-12);
}

#[test]
fn test_photosphere_halfway() {
    let model = grey_model();
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = vec![SightLine::new("+y", Vector::new(0., 1., 0.)).unwrap()];
    let mut config = DiagnosticConfig::new();
    config.stop_depth = 0.25 * THOMSON * NE * R;

    let report = locate_photosphere(&view, &source, &sightlines, &config).unwrap();
    assert!((report.positions[0].y - 0.25 * R).abs() / R < 1e-9);
    assert!(report.positions[0].x.abs() < 1e-6 * R);
}

#[test]
fn test_diagnostics_are_idempotent() {
    let model = cube_model(0.05 * R);
    let view = model.view(0).unwrap();
    let source = CentralSource::for_model(&view);
    let sightlines = DefaultSightlines.sightlines();
    let config = DiagnosticConfig::new();

    let a = optical_depth_spectrum(&view, &source, &sightlines, None, &config).unwrap();
    let b = optical_depth_spectrum(&view, &source, &sightlines, None, &config).unwrap();
    assert_eq!(a, b);

    let a = evaluate_edges(&view, &source, &sightlines, &config).unwrap();
    let b = evaluate_edges(&view, &source, &sightlines, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_diagnostics_on_model_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("wind");
    let root = root.to_str().unwrap();
    let path = model_path(root);
    write_model(&path, &cube_model(0.0)).unwrap();

    let model = read_model(&path).unwrap();
    assert!(model.view(1).is_err());
    let view = model.view(0).unwrap();
    assert!(view.contains(Point::origin()));

    let source = CentralSource::for_model(&view);
    let report = evaluate_edges(
        &view,
        &source,
        &model.sightlines(),
        &DiagnosticConfig::new(),
    )
    .unwrap();
    assert_eq!(report.failures, 0);
    assert_eq!(report.sightlines.len(), 8);
}

#[test]
fn test_cv_band_table() {
    let f1 = 1e14;
    let f2 = 1e17;
    let table = BandTable::new(&BandMode::Cv, 0.0, f1, f2).unwrap();
    assert_eq!(table.nbands(), 4);
    assert_eq!(table.band(0).unwrap().f1, f1);
    assert_eq!(table.band(0).unwrap().f2, 13.599 / HEV);
    assert_eq!(table.band(1).unwrap().f2, 24.588 / HEV);
    assert_eq!(table.band(2).unwrap().f2, 54.418 / HEV);
    assert_eq!(table.band(3).unwrap().f2, f2);
    for pair in table.bands().windows(2) {
        assert_eq!(pair[0].f2, pair[1].f1);
    }
    assert!(table.total_min_fraction() <= 1.0);

    assert!(matches!(
        BandTable::new(&BandMode::Cv, 0.0, 20.0 / HEV, f2),
        Err(BandError::LowerBoundAboveEdge { .. })
    ));
    assert!(matches!(
        BandTable::new(&BandMode::Cv, 0.0, f1, 30.0 / HEV),
        Err(BandError::UpperBoundBelowEdge { .. })
    ));
}

#[test]
fn test_user_band_table_limits() {
    let bands = UserBands::new(1.0, 100.0, vec![13.6, 54.4], vec![0.2, 0.3, 0.3]);
    let table = BandTable::new(&BandMode::UserDefined(bands), 0.0, 0.0, 0.0).unwrap();
    assert_eq!(table.nbands(), 3);
    assert!((table.f_min().unwrap() - 1.0 / HEV).abs() / table.f_min().unwrap() < 1e-12);

    let n = MAX_BANDS + 1;
    let too_many = UserBands::new(
        1.0,
        100.0,
        (1..n).map(|i| 1.0 + 9.0 * i as f64).collect(),
        vec![0.0; n],
    );
    assert!(matches!(
        BandTable::new(&BandMode::UserDefined(too_many), 0.0, 0.0, 0.0),
        Err(BandError::TooManyBands { .. })
    ));
}
