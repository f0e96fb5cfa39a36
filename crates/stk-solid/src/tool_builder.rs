//! ToolBuilder: the subtraction body for a partial-depth
//! cut — top chamfer, vertical wall, bottom ball-nose fillet. Builds a
//! stack of offset contours connected by the robust two-polygon tiler,
//! falling back to a coarser stair-step reconstruction when the
//! tiler can't find a feasible seam.

use stk_contour::CrossSection;

use crate::error::SolidError;
use crate::manifold::Manifold;
use crate::tiler::{self, RingPoint};

/// Which constraint pass the robust tiler should run under for a given
/// wall segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    Strict,
    Permissive,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolProfile {
    pub top_chamfer: f64,
    pub bottom_fillet: f64,
    pub depth: f64,
    pub arc_steps: usize,
}

impl ToolProfile {
    /// Clamps `top_chamfer + bottom_fillet` to `depth`.
    pub fn clamped(self) -> ToolProfile {
        let mut p = self;
        if p.top_chamfer + p.bottom_fillet > p.depth {
            p.top_chamfer = p.depth / 2.0;
            p.bottom_fillet = p.depth / 2.0;
        }
        p
    }

    fn with_arc_steps(self, arc_steps: usize) -> ToolProfile {
        ToolProfile { arc_steps, ..self }
    }
}

/// One (z, offset) sample of the step profile. `offset` is the Minkowski
/// offset distance to apply to the base cross-section: positive grows the
/// contour outward, negative shrinks it inward.
struct Sample {
    z: f64,
    offset: f64,
}

fn step_profile(profile: &ToolProfile) -> Vec<Sample> {
    let ToolProfile { top_chamfer: rt, bottom_fillet: rb, depth, arc_steps } = *profile;
    let arc_steps = arc_steps.max(2);
    let mut samples = Vec::with_capacity(arc_steps * 2 + 1);

    for i in 0..=arc_steps {
        let theta = std::f64::consts::FRAC_PI_2 * (i as f64 / arc_steps as f64);
        samples.push(Sample { z: -rt * (1.0 - theta.cos()), offset: -rt * (1.0 - theta.sin()) });
    }
    samples.push(Sample { z: -(depth - rb), offset: 0.0 });
    for i in 0..=arc_steps {
        let theta = std::f64::consts::FRAC_PI_2 * (i as f64 / arc_steps as f64);
        samples.push(Sample { z: -(depth - rb) - rb * theta.sin(), offset: rb * (1.0 - theta.cos()) });
    }
    samples
}

/// A sample resolved to its actual offset contour, or `None` when the
/// offset collapsed the contour to nothing.
fn resolved_contour(base: &CrossSection, sample: &Sample) -> Option<CrossSection> {
    match base.offset_rounded(-sample.offset) {
        Ok(Some(c)) => Some(c),
        _ => None,
    }
}

fn ring_at(contour: &CrossSection, z: f64) -> Option<Vec<RingPoint>> {
    let rings = contour.exterior_rings();
    if rings.len() != 1 {
        return None; // multi-component or holed contour: not a clean 1-to-1 tiling case
    }
    let ring = &rings[0];
    if ring.len() < 3 {
        return None;
    }
    Some(ring.iter().map(|p| RingPoint::new(p.x, p.y, z)).collect())
}

/// Builds the subtraction body for a partial-depth cut over `base`
/// (already positioned in absolute 2D coordinates). `mode` is the
/// starting tiling constraint; `Strict` retries in `Permissive` per
/// segment before the whole body falls back to the stair-step
/// reconstruction.
pub fn build(base: &CrossSection, profile: ToolProfile, mode: TileMode, shape_label: &str) -> Result<Manifold, SolidError> {
    let profile = profile.clamped();
    let samples = step_profile(&profile);

    if let Some(body) = tiled_build(base, &samples, mode) {
        return Ok(body);
    }

    stairstep_build(base, &profile.with_arc_steps(profile.arc_steps * 2), shape_label)
}

/// Primary reconstruction: walls from the robust tiler between every
/// adjacent sample pair, capped top and bottom. Returns `None` (triggering the stair-step fallback
/// for the *whole* body) if any segment can't be tiled even permissively,
/// or if a contour is multi-component/holed.
fn tiled_build(base: &CrossSection, samples: &[Sample], mode: TileMode) -> Option<Manifold> {
    let contours: Vec<Option<(CrossSection, Vec<RingPoint>)>> = samples
        .iter()
        .map(|s| resolved_contour(base, s).and_then(|c| ring_at(&c, s.z).map(|r| (c, r))))
        .collect();

    let mut walls = Vec::new();
    for pair in contours.windows(2) {
        let (Some((_, upper)), Some((_, lower))) = (&pair[0], &pair[1]) else { return None };
        let tiled = tiler::tile(upper, lower, mode).or_else(|| {
            if mode == TileMode::Strict {
                tiler::tile(upper, lower, TileMode::Permissive)
            } else {
                None
            }
        })?;
        walls.extend(tiled);
    }

    let (first_cs, first_ring) = contours.first()?.as_ref()?;
    let (last_cs, last_ring) = contours.last()?.as_ref()?;
    walls.extend(Manifold::flat_cap(first_cs, first_ring[0].z, true));
    walls.extend(Manifold::flat_cap(last_cs, last_ring[0].z, false));

    Some(Manifold::from_polygons(walls))
}

/// Fallback reconstruction:
/// union the per-step prisms, each extruded from the wider of its two
/// bounding samples. Always succeeds unless every sample collapsed.
fn stairstep_build(base: &CrossSection, profile: &ToolProfile, shape_label: &str) -> Result<Manifold, SolidError> {
    let samples = step_profile(profile);
    let mut body = Manifold::empty();
    let mut built_any = false;

    for pair in samples.windows(2) {
        let (top, bottom) = (&pair[0], &pair[1]);
        if (top.z - bottom.z).abs() < 1e-9 {
            continue;
        }
        let offset = if top.offset.abs() >= bottom.offset.abs() { top.offset } else { bottom.offset };
        let Some(contour) = resolved_contour(base, &Sample { z: 0.0, offset }) else { continue };
        let (z_hi, z_lo) = if top.z >= bottom.z { (top.z, bottom.z) } else { (bottom.z, top.z) };
        let prism = Manifold::from_cross_section(&contour, z_lo, z_hi);
        if prism.is_empty() {
            continue;
        }
        body = body.union(&prism);
        built_any = true;
    }

    if !built_any {
        return Err(SolidError::ToolBuildFailure {
            shape: shape_label.to_string(),
            reason: "every profile sample collapsed to an empty contour".to_string(),
        });
    }

    Ok(body)
}
