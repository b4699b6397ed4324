//! Geometry primitives, scalar helpers and integer hashes shared by the skylight crates.

mod geometry;
mod hash;
mod scalar;

pub use geometry::{RayInterval, direction_from_angles, ray_sphere_intersect, tangent_basis};
pub use hash::{hash_u32, hash2, hash3, hash_to_unit};
pub use scalar::{
    EXP_CLAMP, MIN_DENOMINATOR, luminance, lerp, remap, safe_div, safe_exp, safe_exp_vec3,
    saturate, smoothstep,
};
