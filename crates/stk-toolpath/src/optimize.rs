//! Rapid-order optimization: reorders whole cut passes with a greedy
//! nearest-neighbor search to minimize travel distance. Applied as a
//! post-process after `pocketer::generate`.

use crate::point3::{Point3, ToolMove};

/// One `[Travel(plunge), Cut, Travel(retract)]` unit, as emitted by
/// `pocketer::emit_pass`.
struct Pass {
    moves: [ToolMove; 3],
    start: Point3,
    end: Point3,
    /// Rounded cut Z, used to keep passes within the same level together
    /// — reordering must never cut a deeper level before a shallower one
    /// finishes.
    level: i64,
}

fn as_pass(window: &[ToolMove]) -> Option<Pass> {
    let [ToolMove::Travel(plunge), ToolMove::Cut(cut), ToolMove::Travel(retract)] = window else { return None };
    let start = *plunge.first()?;
    let end = *retract.last()?;
    let level = (cut.first()?.z * 1000.0).round() as i64;
    Some(Pass { moves: [ToolMove::Travel(plunge.clone()), ToolMove::Cut(cut.clone()), ToolMove::Travel(retract.clone())], start, end, level })
}

fn dist2(a: Point3, b: Point3) -> f64 {
    let (dx, dy) = (a.x - b.x, a.y - b.y);
    dx * dx + dy * dy
}

/// Reorders passes within each contiguous same-level run by greedy
/// nearest-neighbor starting from the current tool position, preserving
/// level order across runs: a level must finish before the next one
/// starts, but passes within a level are interchangeable.
pub fn optimize_rapid_order(moves: &mut Vec<ToolMove>) {
    let Some(passes): Option<Vec<Pass>> = moves.chunks(3).map(as_pass).collect() else {
        return; // not cleanly divisible into plunge/cut/retract triples; leave untouched
    };
    if passes.len() <= 1 {
        return;
    }

    // Split into contiguous same-level runs, preserving run order.
    let mut runs: Vec<Vec<Pass>> = Vec::new();
    for pass in passes {
        match runs.last_mut() {
            Some(run) if run[0].level == pass.level => run.push(pass),
            _ => runs.push(vec![pass]),
        }
    }

    let mut ordered: Vec<Pass> = Vec::with_capacity(runs.iter().map(Vec::len).sum());
    let mut current = Point3::new(0.0, 0.0, 0.0);
    for mut remaining in runs {
        while !remaining.is_empty() {
            let (best_i, _) = remaining
                .iter()
                .enumerate()
                .map(|(i, p)| (i, dist2(current, p.start)))
                .fold((0, f64::MAX), |best, cand| if cand.1 < best.1 { cand } else { best });
            let chosen = remaining.swap_remove(best_i);
            current = chosen.end;
            ordered.push(chosen);
        }
    }

    *moves = ordered.into_iter().flat_map(|p| p.moves.into_iter()).collect();
}
