//! Elastic contact resolution.
//!
//! Walls reflect by orientation: only the velocity component normal to the
//! wall is negated. Pairs exchange the normal components of their velocities
//! through the 1D elastic formulas and keep their tangential components.

use crate::core::particle::{Particle, DIM};
use crate::core::wall::Orientation;
use crate::error::{Error, Result};

const EPS_DIST: f64 = 1e-12;

/// Specular reflection off a wall with the given orientation.
#[inline]
pub fn reflect(v: [f64; DIM], orientation: Orientation) -> [f64; DIM] {
    let mut out = v;
    let k = orientation.normal_axis();
    out[k] = -out[k];
    out
}

/// Post-collision velocities for an elastic collision between `a` and `b`.
pub fn elastic_pair(a: &Particle, b: &Particle) -> Result<([f64; DIM], [f64; DIM])> {
    // Unit normal from a -> b
    let mut n = [0.0_f64; DIM];
    for ((nk, &bk), &ak) in n.iter_mut().zip(b.r.iter()).zip(a.r.iter()) {
        *nk = bk - ak;
    }
    let dist = dot(&n, &n).sqrt();
    if dist <= EPS_DIST {
        return Err(Error::MathError(
            "degenerate contact normal in pair collision".into(),
        ));
    }
    for nk in &mut n {
        *nk /= dist;
    }

    let (ma, mb) = (a.mass, b.mass);
    let (ua, ub) = (dot(&a.v, &n), dot(&b.v, &n));
    let ua_new = (ua * (ma - mb) + 2.0 * mb * ub) / (ma + mb);
    let ub_new = (ub * (mb - ma) + 2.0 * ma * ua) / (ma + mb);

    let mut va = [0.0_f64; DIM];
    let mut vb = [0.0_f64; DIM];
    for k in 0..DIM {
        let ta = a.v[k] - ua * n[k];
        let tb = b.v[k] - ub * n[k];
        va[k] = ta + ua_new * n[k];
        vb[k] = tb + ub_new * n[k];
    }
    Ok((va, vb))
}

/// Resolve a collision between `particles[i]` and `particles[j]` in place.
/// Both velocities are assigned together.
pub fn resolve_pair(particles: &mut [Particle], i: usize, j: usize) -> Result<()> {
    if i == j || i >= particles.len() || j >= particles.len() {
        return Err(Error::InvalidParam(format!(
            "invalid pair ({i}, {j}) for {} particles",
            particles.len()
        )));
    }
    let (va, vb) = elastic_pair(&particles[i], &particles[j])?;
    particles[i].v = va;
    particles[j].v = vb;
    Ok(())
}

/// True when the pair overlaps and is closing.
pub fn approaching(a: &Particle, b: &Particle) -> bool {
    let mut d = [0.0_f64; DIM];
    let mut u = [0.0_f64; DIM];
    for k in 0..DIM {
        d[k] = b.r[k] - a.r[k];
        u[k] = b.v[k] - a.v[k];
    }
    dot(&d, &u) < 0.0
}

#[inline]
pub(crate) fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
