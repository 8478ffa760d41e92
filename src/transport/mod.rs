//! Photon creation and line-of-sight optical depth integration.

pub mod frame;
pub mod integrate;
pub mod opacity;
pub mod photon;

pub use frame::RelativityMode;
pub use integrate::{
    DEFAULT_MAX_CROSSINGS, IntegrationError, IntegrationOptions, IntegrationResult, Termination,
    integrate,
};
pub use opacity::{ColumnMode, Extinction};
pub use photon::{CentralSource, Photon, PhotonError, PhotonFactory, PhotonState};
