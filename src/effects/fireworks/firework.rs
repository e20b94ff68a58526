use super::budget::ParticleBudget;
use super::particle::{Particle, SpecialEffect};
use super::pattern::{self, Pattern};
use std::f32::consts::TAU;

// Hue ranges for themed shells
const THEMES: [(f32, f32); 5] = [
    (0.0, 30.0),    // Red-orange
    (30.0, 60.0),   // Yellow-green
    (180.0, 240.0), // Cyan-blue
    (270.0, 300.0), // Purple-pink
    (320.0, 350.0), // Pink-red
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point at `t` on the cubic Bezier curve `p0 p1 p2 p3`.
    pub fn on_cubic(t: f32, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
        Point {
            x: bezier(t, p0.x, p1.x, p2.x, p3.x),
            y: bezier(t, p0.y, p1.y, p2.y, p3.y),
        }
    }
}

/// One axis of a cubic Bezier curve. Exact at both ends.
pub fn bezier(t: f32, p0: f32, p1: f32, p2: f32, p3: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// A shell: rising along its curve until `progress` hits 1, then the owner
/// of its burst until the last spark dies.
#[derive(Debug, Clone)]
pub struct Firework {
    pub origin: Point,
    pub target: Point,
    pub control1: Point,
    pub control2: Point,
    pub position: Point,
    /// 0 at launch, 1 at the target.
    pub progress: f32,
    /// Progress gained per tick.
    pub speed: f32,
    /// Launch angle, used as the spiral burst's phase.
    pub angle: f32,
    pub hue: f32,
    pub size: f32,
    pub exploded: bool,
    pub pattern: Pattern,
    pub effect: Option<SpecialEffect>,
    /// Multiplier on every spark's speed.
    pub spread: f32,
    pub particles: Vec<Particle>,
}

impl Firework {
    /// New shell leaving the bottom edge at `x`, aimed near the upper
    /// middle of a `width` x `height` surface.
    pub fn launch(x: f32, width: f32, height: f32, rng: &mut fastrand::Rng) -> Self {
        let origin = Point::new(x, height);
        let center = Point::new(width / 2.0, height * 0.4);
        let target = Point::new(
            center.x + (rng.f32() - 0.5) * (width * 0.4),
            center.y + (rng.f32() - 0.5) * (height * 0.3),
        );

        // Sideways jitter on the control points bends the climb
        let control1 = Point::new(
            origin.x + (target.x - origin.x) * 0.3 + (rng.f32() * 100.0 - 50.0),
            origin.y - (origin.y - target.y) * 0.3,
        );
        let control2 = Point::new(
            origin.x + (target.x - origin.x) * 0.7 + (rng.f32() * 100.0 - 50.0),
            origin.y - (origin.y - target.y) * 0.7,
        );

        let hue = if rng.f32() < 0.3 {
            let (lo, hi) = THEMES[rng.usize(0..THEMES.len())];
            lo + rng.f32() * (hi - lo)
        } else {
            rng.u32(0..360) as f32
        };

        let pattern = Pattern::random(rng);
        let size = if pattern == Pattern::Kamuro {
            2.5
        } else {
            1.2 + rng.f32()
        };

        Self {
            origin,
            target,
            control1,
            control2,
            position: origin,
            progress: 0.0,
            speed: 0.01 + rng.f32() * 0.008,
            angle: rng.f32() * TAU,
            hue,
            size,
            exploded: false,
            pattern,
            effect: SpecialEffect::roll(rng),
            spread: 1.0 + rng.f32() * 0.8,
            particles: Vec::new(),
        }
    }

    /// Moves the shell one tick along its curve. Returns true on the tick it
    /// reaches the target; the caller then bursts it.
    pub fn advance(&mut self) -> bool {
        if self.exploded {
            return false;
        }

        self.progress = (self.progress + self.speed).min(1.0);
        self.position = Point::on_cubic(
            self.progress,
            self.origin,
            self.control1,
            self.control2,
            self.target,
        );

        if self.progress >= 1.0 {
            self.exploded = true;
            return true;
        }
        false
    }

    /// Fills the burst. Returns the number of sparks admitted.
    pub fn explode(
        &mut self,
        floor: usize,
        budget: &mut ParticleBudget,
        rng: &mut fastrand::Rng,
    ) -> usize {
        let requested = self.pattern.particle_count(rng);
        self.particles = pattern::burst(self, requested, floor, budget, rng);
        self.particles.len()
    }

    /// Steps every spark once, retiring the dead ones and only then adding
    /// sparks split off during the pass. Returns how many were retired.
    pub fn step_particles(&mut self, budget: &mut ParticleBudget, rng: &mut fastrand::Rng) -> usize {
        let pattern = self.pattern;
        let mut spawned = Vec::new();
        let mut retired = 0;

        self.particles.retain_mut(|particle| {
            if particle.step(pattern, budget, rng, &mut spawned) {
                true
            } else {
                retired += 1;
                false
            }
        });
        budget.release(retired);

        self.particles.append(&mut spawned);
        retired
    }

    /// Exploded with nothing left burning.
    pub fn is_spent(&self) -> bool {
        self.exploded && self.particles.is_empty()
    }
}
