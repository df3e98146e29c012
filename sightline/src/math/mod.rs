mod curvature;
mod linspace;

pub use curvature::{curvature_correction, effective_radius};
pub(crate) use linspace::linspace;
