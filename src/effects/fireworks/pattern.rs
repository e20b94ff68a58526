use super::budget::ParticleBudget;
use super::firework::Firework;
use super::particle::{Particle, SpecialEffect};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Chrysanthemum, // Dense core, streaks outward
    Willow,        // Heavy sparks falling in arcs
    Crossette,     // Sparks that split again
    Ring,          // Even circle
    Kamuro,        // Very dense, slow falling
    Spiral,        // Rotating arms
    Spherical,
    Scattered,
    Palm,          // Upward fronds that droop
    Heart,
    DoubleBurst,   // Second stage via splits
    Strobe,        // Flickering
    MultiColor,    // Independent hue per spark
    Star,          // Five points
    Brocade,       // Long-burning, some braking
    Crown,         // Scalloped ring
    WeepingWillow, // Long-lived, wiggling fall
    Fan,           // Upward 60 degree wedge
}

/// Per-tick gravity and drag. Gravity is picked by the sign of the vertical
/// velocity before it is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    pub gravity_rising: f32,
    pub gravity_falling: f32,
    pub drag_x: f32,
    pub drag_y: f32,
}

impl Physics {
    const fn uniform(gravity: f32, drag: f32) -> Self {
        Self {
            gravity_rising: gravity,
            gravity_falling: gravity,
            drag_x: drag,
            drag_y: drag,
        }
    }

    pub fn apply(&self, vx: &mut f32, vy: &mut f32) {
        *vy += if *vy > 0.0 {
            self.gravity_falling
        } else {
            self.gravity_rising
        };
        *vx *= self.drag_x;
        *vy *= self.drag_y;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStage {
    /// Crossette break: 8-13 sparks.
    Crossette,
    /// Second stage of a double burst: 12-19 sparks.
    Second,
}

impl SplitStage {
    fn count(self, rng: &mut fastrand::Rng) -> usize {
        match self {
            SplitStage::Crossette => 8 + rng.usize(0..6),
            SplitStage::Second => 12 + rng.usize(0..8),
        }
    }
}

/// When a spark of a splitting pattern may break apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRule {
    /// Exclusive lower bound on age.
    pub after: u32,
    /// Exclusive upper bound on age.
    pub before: Option<u32>,
    /// Chance per eligible tick.
    pub chance: f32,
    pub stage: SplitStage,
}

impl SplitRule {
    pub fn allows(&self, life: u32) -> bool {
        life > self.after && self.before.is_none_or(|before| life < before)
    }
}

/// Launch parameters of one spark, before hue and jitter are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub angle: f32,
    pub speed: f32,
    pub size: f32,
    pub decay: f32,
    pub max_life: f32,
    pub flicker: bool,
    pub acceleration: f32,
    pub rotation_speed: f32,
    pub wiggle: f32,
    pub wiggle_speed: f32,
}

impl Emission {
    fn new(angle: f32, speed: f32, size: f32, decay: f32, max_life: f32) -> Self {
        Self {
            angle,
            speed,
            size,
            decay,
            max_life,
            flicker: false,
            acceleration: 0.0,
            rotation_speed: 0.0,
            wiggle: 0.0,
            wiggle_speed: 0.0,
        }
    }
}

fn between(rng: &mut fastrand::Rng, lo: f32, hi: f32) -> f32 {
    lo + rng.f32() * (hi - lo)
}

impl Pattern {
    pub const ALL: [Pattern; 18] = [
        Pattern::Chrysanthemum,
        Pattern::Willow,
        Pattern::Crossette,
        Pattern::Ring,
        Pattern::Kamuro,
        Pattern::Spiral,
        Pattern::Spherical,
        Pattern::Scattered,
        Pattern::Palm,
        Pattern::Heart,
        Pattern::DoubleBurst,
        Pattern::Strobe,
        Pattern::MultiColor,
        Pattern::Star,
        Pattern::Brocade,
        Pattern::Crown,
        Pattern::WeepingWillow,
        Pattern::Fan,
    ];

    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(0..Self::ALL.len())]
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Chrysanthemum => "chrysanthemum",
            Pattern::Willow => "willow",
            Pattern::Crossette => "crossette",
            Pattern::Ring => "ring",
            Pattern::Kamuro => "kamuro",
            Pattern::Spiral => "spiral",
            Pattern::Spherical => "spherical",
            Pattern::Scattered => "scattered",
            Pattern::Palm => "palm",
            Pattern::Heart => "heart",
            Pattern::DoubleBurst => "double-burst",
            Pattern::Strobe => "strobe",
            Pattern::MultiColor => "multi-color",
            Pattern::Star => "star",
            Pattern::Brocade => "brocade",
            Pattern::Crown => "crown",
            Pattern::WeepingWillow => "weeping-willow",
            Pattern::Fan => "fan",
        }
    }

    /// Sparks a full burst asks for.
    pub fn particle_count(self, rng: &mut fastrand::Rng) -> usize {
        match self {
            Pattern::Kamuro => 500,
            Pattern::Brocade => 450,
            Pattern::DoubleBurst | Pattern::WeepingWillow => 400,
            Pattern::Chrysanthemum | Pattern::MultiColor => 350,
            Pattern::Star => 320,
            Pattern::Willow | Pattern::Heart => 300,
            Pattern::Palm | Pattern::Crown => 280,
            Pattern::Spiral | Pattern::Fan => 250,
            Pattern::Ring => 220,
            Pattern::Crossette => 180,
            Pattern::Strobe => 150,
            Pattern::Spherical | Pattern::Scattered => 200 + rng.usize(0..100),
        }
    }

    pub fn physics(self) -> Physics {
        match self {
            Pattern::Willow => Physics::uniform(0.06, 0.98),
            Pattern::Kamuro => Physics::uniform(0.02, 0.99),
            Pattern::Palm => Physics {
                gravity_rising: 0.03,
                gravity_falling: 0.08,
                drag_x: 0.98,
                drag_y: 1.0,
            },
            Pattern::WeepingWillow => Physics::uniform(0.03, 0.99),
            Pattern::Brocade => Physics::uniform(0.04, 1.0),
            _ => Physics::uniform(0.04, 0.99),
        }
    }

    pub fn split_rule(self) -> Option<SplitRule> {
        match self {
            Pattern::Crossette => Some(SplitRule {
                after: 15,
                before: None,
                chance: 0.03,
                stage: SplitStage::Crossette,
            }),
            Pattern::DoubleBurst => Some(SplitRule {
                after: 20,
                before: Some(30),
                chance: 0.08,
                stage: SplitStage::Second,
            }),
            _ => None,
        }
    }

    /// Emission of spark `index` out of `count`. `phase` is the shell's
    /// launch angle and `spread` widens or narrows every speed.
    pub fn emission(
        self,
        index: usize,
        count: usize,
        phase: f32,
        spread: f32,
        rng: &mut fastrand::Rng,
    ) -> Emission {
        let fraction = index as f32 / count.max(1) as f32;
        let max_life = between(rng, 80.0, 120.0);

        match self {
            Pattern::Chrysanthemum => {
                let size = if index % 5 == 0 { 1.5 } else { 0.7 };
                Emission::new(
                    rng.f32() * TAU,
                    between(rng, 1.0, 5.0) * spread,
                    size,
                    between(rng, 0.008, 0.02),
                    max_life,
                )
            }
            Pattern::Willow => Emission::new(
                rng.f32() * TAU,
                between(rng, 1.0, 4.0) * spread,
                0.8,
                between(rng, 0.006, 0.014),
                between(rng, 150.0, 200.0),
            ),
            Pattern::Crossette => Emission::new(
                rng.f32() * TAU,
                between(rng, 1.5, 5.0) * spread,
                1.2,
                between(rng, 0.012, 0.03),
                max_life,
            ),
            Pattern::Ring => Emission::new(
                fraction * TAU,
                between(rng, 2.0, 3.5) * spread,
                0.8,
                between(rng, 0.018, 0.03),
                max_life,
            ),
            Pattern::Kamuro => Emission::new(
                rng.f32() * TAU,
                between(rng, 1.0, 3.5) * spread,
                between(rng, 0.5, 1.5),
                between(rng, 0.005, 0.012),
                between(rng, 120.0, 180.0),
            ),
            Pattern::Spiral => Emission {
                rotation_speed: between(rng, 0.05, 0.1),
                // Ten turns around the burst
                ..Emission::new(
                    fraction * TAU * 10.0 + phase,
                    between(rng, 1.0, 4.0) * spread,
                    0.8,
                    between(rng, 0.012, 0.024),
                    max_life,
                )
            },
            Pattern::Spherical => Emission::new(
                rng.f32() * TAU,
                between(rng, 1.0, 4.0) * spread,
                0.8,
                between(rng, 0.012, 0.024),
                max_life,
            ),
            Pattern::Palm => Emission::new(
                -FRAC_PI_2 + (rng.f32() - 0.5) * 0.6,
                between(rng, 2.0, 5.0) * spread,
                0.8,
                between(rng, 0.008, 0.018),
                between(rng, 120.0, 150.0),
            ),
            Pattern::Heart => {
                let t = fraction * TAU;
                let heart_x = 16.0 * t.sin().powi(3);
                let heart_y = 13.0 * t.cos()
                    - 5.0 * (2.0 * t).cos()
                    - 2.0 * (3.0 * t).cos()
                    - (4.0 * t).cos();
                Emission::new(
                    heart_y.atan2(heart_x),
                    between(rng, 1.0, 3.0) * spread,
                    0.9,
                    between(rng, 0.01, 0.025),
                    max_life,
                )
            }
            Pattern::DoubleBurst => Emission::new(
                rng.f32() * TAU,
                between(rng, 1.0, 4.0) * spread,
                1.0,
                between(rng, 0.01, 0.02),
                max_life,
            ),
            Pattern::Strobe => Emission {
                flicker: true,
                ..Emission::new(
                    rng.f32() * TAU,
                    between(rng, 0.5, 2.5) * spread,
                    1.2,
                    between(rng, 0.02, 0.04),
                    between(rng, 60.0, 90.0),
                )
            },
            Pattern::MultiColor => Emission::new(
                rng.f32() * TAU,
                between(rng, 1.0, 4.0) * spread,
                0.8,
                between(rng, 0.01, 0.025),
                max_life,
            ),
            Pattern::Star => {
                const POINTS: usize = 5;
                let arm = (index % POINTS) as f32 * (TAU / POINTS as f32);
                let reach = 1.0 + 0.5 * (index / POINTS) as f32 / (count as f32 / POINTS as f32);
                Emission::new(
                    arm,
                    between(rng, 1.5, 3.5) * reach * spread,
                    0.9,
                    between(rng, 0.01, 0.025),
                    max_life,
                )
            }
            Pattern::Brocade => {
                let acceleration = if rng.f32() > 0.7 {
                    -0.001 - rng.f32() * 0.002
                } else {
                    0.0
                };
                Emission {
                    acceleration,
                    ..Emission::new(
                        rng.f32() * TAU,
                        between(rng, 1.2, 4.7) * spread,
                        between(rng, 0.7, 1.2),
                        between(rng, 0.006, 0.016),
                        between(rng, 100.0, 150.0),
                    )
                }
            }
            Pattern::Crown => {
                let angle = fraction * TAU;
                let scallop = 1.0 + 0.3 * (angle * 8.0).sin();
                Emission::new(
                    angle,
                    between(rng, 1.5, 3.0) * scallop * spread,
                    0.8,
                    between(rng, 0.01, 0.025),
                    max_life,
                )
            }
            Pattern::WeepingWillow => Emission {
                wiggle: between(rng, 0.3, 1.0),
                wiggle_speed: between(rng, 0.05, 0.1),
                ..Emission::new(
                    rng.f32() * TAU,
                    between(rng, 0.8, 2.8) * spread,
                    between(rng, 0.6, 1.0),
                    between(rng, 0.004, 0.01),
                    between(rng, 180.0, 250.0),
                )
            },
            Pattern::Fan => Emission::new(
                -FRAC_PI_2 + (rng.f32() - 0.5) * (PI / 3.0),
                between(rng, 1.5, 4.5) * spread,
                0.8,
                between(rng, 0.01, 0.025),
                max_life,
            ),
            Pattern::Scattered => Emission::new(
                rng.f32() * TAU,
                between(rng, 0.5, 4.5) * spread,
                between(rng, 0.7, 1.5),
                between(rng, 0.018, 0.04),
                max_life,
            ),
        }
    }
}

/// Materializes a shell's burst of `requested` sparks at its current
/// position. The count is admitted against `budget` first, so the result
/// may be shorter than asked for, or empty.
pub fn burst(
    firework: &Firework,
    requested: usize,
    floor: usize,
    budget: &mut ParticleBudget,
    rng: &mut fastrand::Rng,
) -> Vec<Particle> {
    let count = budget.reserve_burst(requested, floor);
    if count < requested {
        tracing::debug!(
            pattern = firework.pattern.name(),
            requested,
            admitted = count,
            live = budget.live(),
            "particle budget truncated burst"
        );
    }

    let pattern = firework.pattern;
    let mut particles = Vec::with_capacity(count);

    for index in 0..count {
        let mut emission = pattern.emission(index, count, firework.angle, firework.spread, rng);
        if firework.effect == Some(SpecialEffect::Flicker) {
            emission.flicker = true;
        }
        if firework.effect == Some(SpecialEffect::Wiggle) && emission.wiggle == 0.0 {
            emission.wiggle = between(rng, 0.3, 1.0);
            emission.wiggle_speed = between(rng, 0.05, 0.1);
        }

        let hue = if pattern == Pattern::MultiColor {
            (rng.f32() * 360.0).floor()
        } else {
            firework.hue + rng.f32() * 30.0 - 15.0
        };

        particles.push(Particle {
            x: firework.position.x,
            y: firework.position.y,
            vx: emission.angle.cos() * emission.speed * between(rng, 0.85, 1.15),
            vy: emission.angle.sin() * emission.speed * between(rng, 0.85, 1.15),
            alpha: 1.0,
            hue,
            brightness: between(rng, 50.0, 100.0),
            size: emission.size * firework.size,
            decay: emission.decay,
            life: 0,
            max_life: emission.max_life,
            has_split: false,
            flicker: emission.flicker,
            effect: firework.effect,
            acceleration: emission.acceleration,
            rotation_speed: emission.rotation_speed,
            wiggle: emission.wiggle,
            wiggle_speed: emission.wiggle_speed,
            wiggle_offset: rng.f32() * TAU,
            shown_alpha: 1.0,
            glint: false,
        });
    }

    particles
}

/// Secondary burst thrown off by `parent`. Split sparks are admitted
/// all-or-nothing and never split again.
pub fn split_burst(
    parent: &Particle,
    stage: SplitStage,
    budget: &mut ParticleBudget,
    rng: &mut fastrand::Rng,
) -> Vec<Particle> {
    let count = stage.count(rng);
    if !budget.reserve_exact(count) {
        return Vec::new();
    }
    tracing::trace!(?stage, count, "spark split");

    (0..count)
        .map(|index| {
            let angle = index as f32 / count as f32 * TAU;
            let speed = between(rng, 1.0, 3.0);
            Particle {
                x: parent.x,
                y: parent.y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                alpha: parent.alpha * 0.8,
                hue: parent.hue + rng.f32() * 40.0 - 20.0,
                brightness: parent.brightness * 0.8,
                size: parent.size * 0.5,
                decay: parent.decay * 1.5,
                life: 0,
                max_life: parent.max_life * 0.5,
                has_split: true,
                flicker: parent.flicker,
                effect: parent.effect,
                acceleration: parent.acceleration,
                rotation_speed: parent.rotation_speed,
                wiggle: parent.wiggle,
                wiggle_speed: parent.wiggle_speed,
                wiggle_offset: rng.f32() * TAU,
                shown_alpha: parent.alpha * 0.8,
                glint: false,
            }
        })
        .collect()
}
