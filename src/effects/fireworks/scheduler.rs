use crate::config::ShowConfig;

/// Where a queued shell should leave from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaunchOrigin {
    /// Regular show cadence, biased to the middle of the surface.
    Show,
    /// Pointer stimulus at world `x`.
    Pointer { x: f32 },
}

#[derive(Debug, Clone, Copy)]
struct PendingLaunch {
    due_ms: f64,
    origin: LaunchOrigin,
}

/// Decides when shells go up. Batches are staggered: each shell is queued
/// with its own due time and released by `advance` once the clock passes it.
#[derive(Debug)]
pub struct LaunchScheduler {
    clock_ms: f64,
    last_launch_ms: Option<f64>,
    next_interval_ms: f64,
    pending: Vec<PendingLaunch>,
}

impl LaunchScheduler {
    pub fn new(config: &ShowConfig, rng: &mut fastrand::Rng) -> Self {
        Self {
            clock_ms: 0.0,
            last_launch_ms: None,
            next_interval_ms: Self::draw_interval(config, rng),
            pending: Vec::new(),
        }
    }

    /// Shells queued but not yet due.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock by `dt_ms`, queues a new batch when the cadence says
    /// so and returns every launch now due, in due order. `active` is the
    /// current number of fireworks; at the ceiling no batch is queued.
    pub fn advance(
        &mut self,
        dt_ms: f64,
        active: usize,
        config: &ShowConfig,
        rng: &mut fastrand::Rng,
    ) -> Vec<LaunchOrigin> {
        self.clock_ms += dt_ms;

        let elapsed = self
            .last_launch_ms
            .map_or(f64::INFINITY, |last| self.clock_ms - last);
        if elapsed > self.next_interval_ms {
            if active < config.max_fireworks {
                let batch = 1 + rng.usize(0..4);
                self.queue(batch, LaunchOrigin::Show, config.stagger_ms);
                tracing::debug!(batch, active, clock_ms = self.clock_ms, "queued launch batch");
            }
            self.last_launch_ms = Some(self.clock_ms);
            self.next_interval_ms = Self::draw_interval(config, rng);
        }

        self.take_due()
    }

    /// Queues a small batch aimed from pointer position `x`. Returns the
    /// batch size, 0 when the show is already at its ceiling.
    pub fn stimulus(
        &mut self,
        x: f32,
        active: usize,
        config: &ShowConfig,
        rng: &mut fastrand::Rng,
    ) -> usize {
        if active >= config.max_fireworks {
            return 0;
        }
        let batch = 2 + rng.usize(0..3);
        self.queue(batch, LaunchOrigin::Pointer { x }, config.stagger_ms);
        batch
    }

    /// Drops every queued launch. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    fn queue(&mut self, batch: usize, origin: LaunchOrigin, stagger_ms: f32) {
        for i in 0..batch {
            self.pending.push(PendingLaunch {
                due_ms: self.clock_ms + i as f64 * stagger_ms as f64,
                origin,
            });
        }
    }

    fn take_due(&mut self) -> Vec<LaunchOrigin> {
        let clock = self.clock_ms;
        let mut due = Vec::new();
        self.pending.retain(|launch| {
            if launch.due_ms <= clock {
                due.push(*launch);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|launch| launch.origin).collect()
    }

    fn draw_interval(config: &ShowConfig, rng: &mut fastrand::Rng) -> f64 {
        let (lo, hi) = config.launch_interval_ms;
        (lo + rng.f32() * (hi - lo)) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_batch_goes_up_immediately() {
        let config = ShowConfig::default();
        let mut rng = fastrand::Rng::with_seed(20);
        let mut scheduler = LaunchScheduler::new(&config, &mut rng);
        let due = scheduler.advance(16.0, 0, &config, &mut rng);
        assert_eq!(due, vec![LaunchOrigin::Show]);
        assert!(scheduler.pending() <= 3);
    }

    #[test]
    fn batch_is_staggered() {
        let config = ShowConfig::default();
        let mut rng = fastrand::Rng::with_seed(21);
        let mut scheduler = LaunchScheduler::new(&config, &mut rng);
        let mut launched = scheduler.advance(1.0, 0, &config, &mut rng).len();
        let queued = launched + scheduler.pending();
        assert!((1..=4).contains(&queued));

        // Nothing new is due until the stagger elapses
        assert!(scheduler.advance(100.0, 0, &config, &mut rng).is_empty());
        launched += scheduler.advance(200.0, 0, &config, &mut rng).len();
        launched += scheduler.advance(250.0, 0, &config, &mut rng).len();
        assert!(launched >= queued);
    }

    #[test]
    fn cadence_stays_within_interval() {
        let config = ShowConfig {
            stagger_ms: 0.0,
            ..ShowConfig::default()
        };
        let mut rng = fastrand::Rng::with_seed(22);
        let mut scheduler = LaunchScheduler::new(&config, &mut rng);

        let mut batches = Vec::new();
        for tick in 0..6000 {
            if !scheduler.advance(1.0, 0, &config, &mut rng).is_empty() {
                batches.push(tick);
            }
        }
        for pair in batches.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((300..=1001).contains(&gap), "gap {gap}");
        }
        assert!(batches.len() >= 6);
    }

    #[test]
    fn ceiling_blocks_new_batches() {
        let config = ShowConfig::default();
        let mut rng = fastrand::Rng::with_seed(23);
        let mut scheduler = LaunchScheduler::new(&config, &mut rng);
        assert!(scheduler.advance(16.0, 20, &config, &mut rng).is_empty());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.stimulus(10.0, 20, &config, &mut rng), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn stimulus_queues_pointer_batch() {
        let config = ShowConfig::default();
        let mut rng = fastrand::Rng::with_seed(24);
        let mut scheduler = LaunchScheduler::new(&config, &mut rng);
        let batch = scheduler.stimulus(42.0, 3, &config, &mut rng);
        assert!((2..=4).contains(&batch));

        let due = scheduler.advance(0.0, 20, &config, &mut rng);
        assert_eq!(due, vec![LaunchOrigin::Pointer { x: 42.0 }]);
        assert_eq!(scheduler.pending(), batch - 1);
    }

    #[test]
    fn cancel_drops_pending() {
        let config = ShowConfig::default();
        let mut rng = fastrand::Rng::with_seed(25);
        let mut scheduler = LaunchScheduler::new(&config, &mut rng);
        let batch = scheduler.stimulus(0.0, 0, &config, &mut rng);
        assert_eq!(scheduler.cancel_all(), batch);
        assert!(scheduler.advance(10_000.0, 20, &config, &mut rng).is_empty());
    }
}
