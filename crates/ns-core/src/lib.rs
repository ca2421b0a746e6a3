//! ns-core: stable foundation for the neutron-star structure workspace.
//!
//! Contains:
//! - numeric (Real + ODE tolerances + float helpers)
//! - units (code-unit constants and conversion of SI/CGS inputs via uom)
//! - error (shared numeric error)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{NsError, NsResult};
pub use numeric::*;
pub use units::*;
