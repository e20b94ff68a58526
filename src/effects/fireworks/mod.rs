use super::Effect;
use crate::color::hsl_to_rgb;
use crate::config::ShowConfig;
use crate::error::ShowError;
use crate::frame::FrameBuffer;
use crossterm::event::{Event, MouseButton, MouseEvent, MouseEventKind};
use std::io::{self, Write};

pub mod budget;
pub mod firework;
pub mod particle;
pub mod pattern;
pub mod scheduler;

use budget::ParticleBudget;
use firework::Firework;
use scheduler::{LaunchOrigin, LaunchScheduler};

const SHELL_RADIUS: f32 = 2.0;
const SHELL_LIGHTNESS: f32 = 0.7;
const GLINT_SCALE: f32 = 1.5;
const GLINT_ALPHA: f32 = 0.3;

/// The fireworks engine. Owns every shell, the particle budget and the only
/// random source; nothing else mutates show state.
pub struct FireworksShow {
    config: ShowConfig,
    fireworks: Vec<Firework>,
    budget: ParticleBudget,
    scheduler: LaunchScheduler,
    rng: fastrand::Rng,
    frame: FrameBuffer,
    mounted: bool,
}

impl Effect for FireworksShow {
    fn mount(width: usize, height: usize, config: &ShowConfig) -> Result<Self, ShowError> {
        if width == 0 || height == 0 {
            return Err(ShowError::EmptySurface { width, height });
        }
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let scheduler = LaunchScheduler::new(config, &mut rng);
        tracing::info!(width, height, seed = ?config.seed, "fireworks mounted");

        Ok(Self {
            config: config.clone(),
            fireworks: Vec::with_capacity(config.max_fireworks),
            budget: ParticleBudget::new(config.max_particles),
            scheduler,
            rng,
            frame: FrameBuffer::new(width, height, config.cell_size, config.background),
            mounted: true,
        })
    }

    fn resize(&mut self, width: usize, height: usize) {
        tracing::info!(width, height, "surface resized");
        self.frame.resize(width, height);
    }

    fn update(&mut self, dt: f32) {
        if !self.mounted {
            return;
        }

        let due = self.scheduler.advance(
            dt as f64 * 1000.0,
            self.fireworks.len(),
            &self.config,
            &mut self.rng,
        );
        for origin in due {
            let x = self.launch_x(origin);
            self.spawn(x);
        }

        let Self {
            config,
            fireworks,
            budget,
            rng,
            ..
        } = self;

        // Shells that burst this tick start moving next tick
        for firework in fireworks.iter_mut() {
            if !firework.exploded {
                if firework.advance() {
                    let admitted = firework.explode(config.burst_floor, budget, rng);
                    tracing::debug!(
                        pattern = firework.pattern.name(),
                        effect = ?firework.effect,
                        admitted,
                        live = budget.live(),
                        "shell burst"
                    );
                }
            } else {
                firework.step_particles(budget, rng);
            }
        }
        fireworks.retain(|firework| !firework.is_spent());
    }

    fn render(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.draw();
        self.frame.present(out)
    }

    fn handle_event(&mut self, event: &Event) {
        if let Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            ..
        }) = event
        {
            let x = (*column as f32 + 0.5) * self.config.cell_size;
            self.pointer(x);
        }
    }

    fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        let cancelled = self.scheduler.cancel_all();
        let released = self.live_particles();
        self.budget.release(released);
        self.fireworks.clear();
        self.mounted = false;
        tracing::info!(cancelled, released, "fireworks unmounted");
    }
}

impl FireworksShow {
    pub fn fireworks(&self) -> &[Firework] {
        &self.fireworks
    }

    pub fn budget(&self) -> &ParticleBudget {
        &self.budget
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn scheduler(&self) -> &LaunchScheduler {
        &self.scheduler
    }

    /// Sparks currently owned by all shells.
    pub fn live_particles(&self) -> usize {
        self.fireworks.iter().map(|f| f.particles.len()).sum()
    }

    /// Launches one shell from world `x` unless the show is full. Returns
    /// whether it went up.
    pub fn spawn(&mut self, x: f32) -> bool {
        if !self.mounted || self.fireworks.len() >= self.config.max_fireworks {
            return false;
        }
        let firework = Firework::launch(
            x,
            self.frame.world_width(),
            self.frame.world_height(),
            &mut self.rng,
        );
        self.fireworks.push(firework);
        true
    }

    /// Pointer stimulus at world `x`: queues a small staggered batch.
    pub fn pointer(&mut self, x: f32) -> usize {
        if !self.mounted {
            return 0;
        }
        let batch = self
            .scheduler
            .stimulus(x, self.fireworks.len(), &self.config, &mut self.rng);
        tracing::debug!(x, batch, "pointer stimulus");
        batch
    }

    fn launch_x(&mut self, origin: LaunchOrigin) -> f32 {
        let width = self.frame.world_width();
        let center = width / 2.0;
        match origin {
            LaunchOrigin::Show => center + (self.rng.f32() - 0.5) * (width * 0.8),
            // Pull toward the middle so clicked shells still frame the show
            LaunchOrigin::Pointer { x } => {
                x + (center - x) * 0.2 + (self.rng.f32() - 0.5) * 80.0
            }
        }
    }

    fn draw(&mut self) {
        self.frame.clear();

        for firework in &self.fireworks {
            if !firework.exploded {
                let color = hsl_to_rgb(firework.hue, 1.0, SHELL_LIGHTNESS);
                self.frame.fill_disc(
                    firework.position.x,
                    firework.position.y,
                    SHELL_RADIUS,
                    color,
                    1.0,
                );
                continue;
            }

            for particle in &firework.particles {
                let lightness = particle.brightness / 100.0;
                let color = hsl_to_rgb(particle.hue, 1.0, lightness);

                self.frame.fill_disc(
                    particle.x,
                    particle.y,
                    particle.size,
                    color,
                    particle.shown_alpha,
                );

                if particle.glint {
                    self.frame.fill_disc(
                        particle.x,
                        particle.y,
                        particle.size * GLINT_SCALE,
                        hsl_to_rgb(particle.hue, 0.8, 0.9),
                        particle.shown_alpha * GLINT_ALPHA,
                    );
                }
            }
        }
    }
}
