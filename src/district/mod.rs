//! District name resolution: free-text labels to gazetteer coordinates.

pub mod gazetteer;
pub mod normalizer;

pub use gazetteer::{AdminPrefix, District};
pub use normalizer::{canonical_key, resolve};
