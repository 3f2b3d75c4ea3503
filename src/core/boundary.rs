use crate::core::particle::Particle;
use crate::core::wall::{Bounds, WallId};

/// Pull any particle that ended up beyond a wall plane back inside.
///
/// A particle whose disc crosses a plane is moved to touch it from the inside,
/// and its velocity component pointing further out is negated. Particles
/// already inside are left alone, so running the pass twice changes nothing
/// the second time. Returns the number of corrections made.
pub fn enforce(particles: &mut [Particle], bounds: &Bounds) -> usize {
    let mut corrections = 0usize;
    for p in particles.iter_mut() {
        for wall in WallId::ALL {
            let axis = wall.orientation().normal_axis();
            let outward = wall.outward();
            let limit = bounds.plane(wall) - outward * p.radius;
            // Signed distance past the limit along the outward normal.
            if (p.r[axis] - limit) * outward > 0.0 {
                p.r[axis] = limit;
                if p.v[axis] * outward > 0.0 {
                    p.v[axis] = -p.v[axis];
                }
                corrections += 1;
            }
        }
    }
    corrections
}

/// True when every particle disc lies inside `bounds`.
pub fn all_inside(particles: &[Particle], bounds: &Bounds) -> bool {
    particles.iter().all(|p| {
        p.r[0] - p.radius >= bounds.left
            && p.r[0] + p.radius <= bounds.right
            && p.r[1] - p.radius >= bounds.top
            && p.r[1] + p.radius <= bounds.bottom
    })
}
