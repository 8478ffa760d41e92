pub mod bands;
pub mod cli;
pub mod constants;
pub mod diag;
pub mod geom;
pub mod model;
pub mod transport;

// Prelude
pub use bands::{Band, BandMode, BandTable};
pub use diag::{DiagnosticConfig, SightLine};
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use model::{FlowModel, Model};
pub use transport::{ColumnMode, RelativityMode};
