pub mod fields;

pub use fields::{ParticleParams, GAP_HALF_WIDTH, PROTON_CHARGE, PROTON_MASS};
