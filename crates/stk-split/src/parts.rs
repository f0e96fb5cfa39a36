//! Post-subtraction part selection ("after subtraction,
//! `decompose()` yields the disjoint parts; the caller selects by volume
//! rank").

use stk_solid::Manifold;

/// One disjoint solid produced by decomposing a split layer, together with
/// its signed volume.
pub struct SplitPart {
    pub manifold: Manifold,
    pub volume: f64,
}

/// Splits `solid` into its disjoint components via the kernel's own mesh
/// split, ranked largest-volume first.
pub fn decompose_by_volume(solid: &Manifold) -> Vec<SplitPart> {
    let mut parts: Vec<SplitPart> = solid
        .split_components()
        .into_iter()
        .map(|m| {
            let volume = m.signed_volume();
            SplitPart { manifold: m, volume }
        })
        .collect();
    parts.sort_by(|a, b| b.volume.partial_cmp(&a.volume).unwrap());
    parts
}
