//! JPL Ephemeris module for planetary positions
//!
//! Reads the binary SPK kernels (DE421 and friends) in which JPL distributes
//! its Development Ephemerides.
//!
//! - `daf`: Double Array File format reader (underlying format of SPK files)
//! - `spk`: Spacecraft Planet Kernel segments and Chebyshev evaluation
//! - `names`: Mappings between body names and NAIF ID numbers

pub mod chebyshev;
pub mod daf;
pub mod errors;
pub mod names;
pub mod spk;

#[cfg(test)]
pub(crate) mod tests;

pub use self::errors::JplephemError;
pub use self::spk::SPK;
