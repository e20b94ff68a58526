use super::budget::ParticleBudget;
use super::pattern::{self, Pattern};
use std::f32::consts::FRAC_PI_2;

/// Below this speed, braking stops scaling velocity.
const MIN_SPEED: f32 = 0.1;
const ACCELERATE_FACTOR: f32 = 1.01;
const DECELERATE_FACTOR: f32 = 0.99;
/// Rotation applied to spiral sparks that carry no speed of their own.
const DEFAULT_ROTATION: f32 = 0.05;
const WIGGLE_GAIN: f32 = 0.05;
const BRIGHTNESS_FADE: f32 = 0.5;
const OVERAGE_DECAY: f32 = 1.5;

/// Per-shell modifier inherited by every spark of the burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialEffect {
    ColorShift,
    Glitter,
    Flicker,
    Accelerate,
    Decelerate,
    Wiggle,
}

impl SpecialEffect {
    /// Half of all shells get a roll; within a roll "none" is twice as
    /// likely as any single effect.
    pub fn roll(rng: &mut fastrand::Rng) -> Option<Self> {
        if rng.f32() >= 0.5 {
            return None;
        }
        match rng.usize(0..8) {
            0 => Some(SpecialEffect::ColorShift),
            1 => Some(SpecialEffect::Glitter),
            2 => Some(SpecialEffect::Flicker),
            3 => Some(SpecialEffect::Accelerate),
            4 => Some(SpecialEffect::Decelerate),
            5 => Some(SpecialEffect::Wiggle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Opacity, starts at 1 and only ever falls.
    pub alpha: f32,
    pub hue: f32,
    /// HSL lightness in percent, fades toward 0.
    pub brightness: f32,
    pub size: f32,
    pub decay: f32,
    /// Ticks lived.
    pub life: u32,
    pub max_life: f32,
    pub has_split: bool,
    pub flicker: bool,
    pub effect: Option<SpecialEffect>,
    pub acceleration: f32,
    pub rotation_speed: f32,
    pub wiggle: f32,
    pub wiggle_speed: f32,
    pub wiggle_offset: f32,
    /// Alpha to draw with this tick (flicker applied).
    pub shown_alpha: f32,
    /// Glitter flash rolled this tick.
    pub glint: bool,
}

impl Particle {
    /// Advances one tick. Split bursts are pushed onto `spawned` rather than
    /// the parent's collection, which is being iterated. Returns whether the
    /// particle is still alive.
    pub fn step(
        &mut self,
        pattern: Pattern,
        budget: &mut ParticleBudget,
        rng: &mut fastrand::Rng,
        spawned: &mut Vec<Particle>,
    ) -> bool {
        self.life += 1;

        match self.effect {
            Some(SpecialEffect::Accelerate) => {
                self.vx *= ACCELERATE_FACTOR;
                self.vy *= ACCELERATE_FACTOR;
            }
            Some(SpecialEffect::Decelerate) => self.scale_velocity(DECELERATE_FACTOR),
            _ => {}
        }

        if self.acceleration != 0.0 {
            self.scale_velocity(1.0 + self.acceleration);
        }

        if self.wiggle > 0.0 {
            let amount =
                self.wiggle * (self.life as f32 * self.wiggle_speed + self.wiggle_offset).sin();
            let normal = self.vy.atan2(self.vx) + FRAC_PI_2;
            self.vx += normal.cos() * amount * WIGGLE_GAIN;
            self.vy += normal.sin() * amount * WIGGLE_GAIN;
        }

        pattern.physics().apply(&mut self.vx, &mut self.vy);

        if pattern == Pattern::Spiral || self.rotation_speed != 0.0 {
            let step = if self.rotation_speed != 0.0 {
                self.rotation_speed
            } else {
                DEFAULT_ROTATION
            };
            self.rotate_velocity(step);
        }

        if self.effect == Some(SpecialEffect::ColorShift) {
            self.hue = (self.hue + 1.0) % 360.0;
        }

        self.glint = self.effect == Some(SpecialEffect::Glitter) && rng.f32() > 0.7;

        if !self.has_split {
            if let Some(rule) = pattern.split_rule() {
                if rule.allows(self.life) && rng.f32() < rule.chance {
                    self.has_split = true;
                    spawned.extend(pattern::split_burst(self, rule.stage, budget, rng));
                }
            }
        }


        self.x += self.vx;
        self.y += self.vy;

        if self.life as f32 > self.max_life {
            self.alpha -= self.decay * OVERAGE_DECAY;
        } else {
            self.alpha -= self.decay;
        }
        self.brightness = (self.brightness - BRIGHTNESS_FADE).max(0.0);

        if self.alpha <= 0.0 {
            return false;
        }

        self.shown_alpha = if self.flicker && rng.f32() > 0.5 {
            self.alpha * (0.3 + rng.f32() * 0.7)
        } else {
            self.alpha
        };
        true
    }

    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    /// Scales velocity unless that would leave the particle stalled. Only
    /// braking goes through here; acceleration always applies.
    fn scale_velocity(&mut self, factor: f32) {
        if self.speed() * factor < MIN_SPEED {
            return;
        }
        self.vx *= factor;
        self.vy *= factor;
    }

    fn rotate_velocity(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        let vx = self.vx * cos - self.vy * sin;
        let vy = self.vx * sin + self.vy * cos;
        self.vx = vx;
        self.vy = vy;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A quiet spark: no effect, no modifiers, slow decay.
    pub(crate) fn spark() -> Particle {
        Particle {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            alpha: 1.0,
            hue: 120.0,
            brightness: 80.0,
            size: 1.0,
            decay: 0.001,
            life: 0,
            max_life: 1000.0,
            has_split: false,
            flicker: false,
            effect: None,
            acceleration: 0.0,
            rotation_speed: 0.0,
            wiggle: 0.0,
            wiggle_speed: 0.0,
            wiggle_offset: 0.0,
            shown_alpha: 1.0,
            glint: false,
        }
    }

    fn run(p: &mut Particle, pattern: Pattern, ticks: usize) -> Vec<Particle> {
        let mut budget = ParticleBudget::new(10_000);
        let mut rng = fastrand::Rng::with_seed(7);
        let mut spawned = Vec::new();
        for _ in 0..ticks {
            p.step(pattern, &mut budget, &mut rng, &mut spawned);
        }
        spawned
    }

    #[test]
    fn willow_converges_to_terminal_velocity() {
        let mut p = spark();
        run(&mut p, Pattern::Willow, 200);
        // v' = (v + 0.06) * 0.98 settles at 0.98 * 0.06 / 0.02
        let terminal = 0.98 * 0.06 / (1.0 - 0.98);
        assert!((p.vy - terminal).abs() < 0.1, "vy = {}", p.vy);
        assert!(p.vx.abs() < 1e-6);
    }

    #[test]
    fn life_counts_ticks() {
        let mut p = spark();
        run(&mut p, Pattern::Spherical, 12);
        assert_eq!(p.life, 12);
    }

    #[test]
    fn alpha_never_rises() {
        let mut p = spark();
        p.decay = 0.02;
        p.max_life = 10.0;
        p.flicker = true;
        let mut budget = ParticleBudget::new(100);
        let mut rng = fastrand::Rng::with_seed(3);
        let mut spawned = Vec::new();
        let mut last = p.alpha;
        while p.step(Pattern::Strobe, &mut budget, &mut rng, &mut spawned) {
            assert!(p.alpha <= last);
            assert!(p.shown_alpha <= p.alpha);
            last = p.alpha;
        }
        assert!(p.alpha <= 0.0);
    }

    #[test]
    fn decay_speeds_up_past_max_life() {
        let mut p = spark();
        p.decay = 0.01;
        p.max_life = 1.0;
        run(&mut p, Pattern::Spherical, 1);
        assert!((p.alpha - 0.99).abs() < 1e-6);
        run(&mut p, Pattern::Spherical, 1);
        assert!((p.alpha - 0.975).abs() < 1e-6);
    }

    #[test]
    fn brightness_floors_at_zero() {
        let mut p = spark();
        p.brightness = 1.0;
        run(&mut p, Pattern::Spherical, 5);
        assert_eq!(p.brightness, 0.0);
    }

    #[test]
    fn rotation_preserves_speed() {
        let mut p = spark();
        p.vx = 3.0;
        p.vy = 0.0;
        p.rotation_speed = 0.3;
        p.rotate_velocity(p.rotation_speed);
        assert!((p.speed() - 3.0).abs() < 1e-5);
        assert!(p.vy > 0.0);
    }

    // Brocade has no drag and only pulls on vy, so vx shows the effects alone

    #[test]
    fn accelerate_speeds_up_every_tick() {
        let mut p = spark();
        p.vx = 2.0;
        p.effect = Some(SpecialEffect::Accelerate);
        run(&mut p, Pattern::Brocade, 10);
        let expected = 2.0 * ACCELERATE_FACTOR.powi(10);
        assert!((p.vx - expected).abs() < 1e-5, "vx = {}", p.vx);
    }

    #[test]
    fn accelerate_lifts_slow_sparks() {
        let mut p = spark();
        p.vx = 0.05;
        p.effect = Some(SpecialEffect::Accelerate);
        run(&mut p, Pattern::Brocade, 1);
        assert!((p.vx - 0.05 * ACCELERATE_FACTOR).abs() < 1e-7, "vx = {}", p.vx);
    }

    #[test]
    fn decelerate_slows_every_tick() {
        let mut p = spark();
        p.vx = 2.0;
        p.effect = Some(SpecialEffect::Decelerate);
        run(&mut p, Pattern::Brocade, 10);
        let expected = 2.0 * DECELERATE_FACTOR.powi(10);
        assert!((p.vx - expected).abs() < 1e-5, "vx = {}", p.vx);
    }

    #[test]
    fn decelerate_stops_near_zero() {
        let mut p = spark();
        p.vx = 0.1005;
        p.effect = Some(SpecialEffect::Decelerate);
        run(&mut p, Pattern::Brocade, 1);
        assert_eq!(p.vx, 0.1005);
    }

    #[test]
    fn negative_acceleration_brakes_brocade() {
        let mut braked = spark();
        braked.vx = 3.0;
        braked.acceleration = -0.002;
        run(&mut braked, Pattern::Brocade, 20);
        let expected = 3.0 * (1.0f32 - 0.002).powi(20);
        assert!((braked.vx - expected).abs() < 1e-4, "vx = {}", braked.vx);

        let mut free = spark();
        free.vx = 3.0;
        run(&mut free, Pattern::Brocade, 20);
        assert_eq!(free.vx, 3.0);
        assert!(braked.vx < free.vx);
    }

    #[test]
    fn wiggle_turns_velocity_sideways() {
        // Offsets put the first tick's sine at +1 and -1
        let wiggling = |offset: f32| {
            let mut p = spark();
            p.vx = 1.0;
            p.wiggle = 1.0;
            p.wiggle_speed = 0.1;
            p.wiggle_offset = offset;
            run(&mut p, Pattern::Brocade, 1);
            p
        };
        let mut plain = spark();
        plain.vx = 1.0;
        run(&mut plain, Pattern::Brocade, 1);

        let left = wiggling(FRAC_PI_2 - 0.1);
        let right = wiggling(-FRAC_PI_2 - 0.1);

        assert!((left.vy - plain.vy - WIGGLE_GAIN).abs() < 1e-5, "vy = {}", left.vy);
        assert!((right.vy - plain.vy + WIGGLE_GAIN).abs() < 1e-5, "vy = {}", right.vy);
        assert!((left.vx - 1.0).abs() < 1e-5);
        assert!((right.vx - 1.0).abs() < 1e-5);
    }

    #[test]
    fn glitter_glints_on_some_ticks() {
        let mut p = spark();
        p.effect = Some(SpecialEffect::Glitter);
        let mut budget = ParticleBudget::new(100);
        let mut rng = fastrand::Rng::with_seed(9);
        let mut spawned = Vec::new();
        let mut glints = 0;
        for _ in 0..200 {
            assert!(p.step(Pattern::Spherical, &mut budget, &mut rng, &mut spawned));
            if p.glint {
                glints += 1;
            }
        }
        assert!((20..180).contains(&glints), "{glints} glints");
    }

    #[test]
    fn only_glitter_glints() {
        let mut p = spark();
        p.effect = Some(SpecialEffect::Flicker);
        let mut budget = ParticleBudget::new(100);
        let mut rng = fastrand::Rng::with_seed(10);
        let mut spawned = Vec::new();
        for _ in 0..200 {
            p.step(Pattern::Spherical, &mut budget, &mut rng, &mut spawned);
            assert!(!p.glint);
        }
    }

    #[test]
    fn color_shift_cycles_hue() {
        let mut p = spark();
        p.hue = 359.5;
        p.effect = Some(SpecialEffect::ColorShift);
        run(&mut p, Pattern::Spherical, 1);
        assert!((p.hue - 0.5).abs() < 1e-4);
    }

    #[test]
    fn crossette_splits_at_most_once() {
        let mut p = spark();
        p.vx = 1.0;
        p.decay = 0.0001;
        let spawned = run(&mut p, Pattern::Crossette, 400);
        assert!(p.has_split);
        assert!((8..=13).contains(&spawned.len()));
    }

    #[test]
    fn no_split_before_min_age() {
        let mut p = spark();
        let spawned = run(&mut p, Pattern::Crossette, 15);
        assert!(spawned.is_empty());
        assert!(!p.has_split);
    }
}
