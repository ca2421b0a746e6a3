//! Mass-radius sequences and target searches over central pressure.
//!
//! Provides:
//! - `SequenceBuilder`: parallel scan of central pressures into an
//!   `MrSequence`, with stability labels and a rejected-star ledger
//! - `MrSequence`: maximum-mass star, stable branch, interpolation at a mass
//! - `TargetLocator`: bracket + bisection search for a star of given mass or
//!   radius on the stable branch
//!
//! # Example
//!
//! ```no_run
//! use ns_eos::read_eos_csv;
//! use ns_sequence::{LocatorOptions, SequenceBuilder, SequenceOptions, Target, TargetLocator};
//!
//! let eos = read_eos_csv("eos/sly4.csv").unwrap();
//! let sequence = SequenceBuilder::new(&eos, SequenceOptions::default())
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let locator = TargetLocator::new(&eos, &sequence, LocatorOptions::default()).unwrap();
//! let star = locator.locate(Target::Mass(1.4)).unwrap();
//! println!("R(1.4) = {} km, Lambda = {:?}", star.star.radius, star.star.lambda());
//! ```

pub mod builder;
pub mod error;
pub mod locator;
pub mod options;
pub mod sequence;

pub use builder::{ProgressFn, SequenceBuilder, SequenceProgress};
pub use error::{SequenceError, SequenceResult};
pub use locator::{LocatedStar, Target, TargetLocator};
pub use options::{LocatorOptions, SequenceOptions};
pub use sequence::{MassInterpolation, MrSequence, RejectedStar, RejectionReason, SequencePoint};
