/// Count of live particles across the whole show, capped at a fixed ceiling.
///
/// The counter only moves through `reserve_*` and `release`, so every
/// particle that exists was admitted here first.
#[derive(Debug)]
pub struct ParticleBudget {
    live: usize,
    ceiling: usize,
}

impl ParticleBudget {
    pub fn new(ceiling: usize) -> Self {
        Self { live: 0, ceiling }
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn headroom(&self) -> usize {
        self.ceiling - self.live
    }

    /// Admits a main burst. Returns the full request when it fits, all the
    /// remaining headroom when that still reaches `floor`, and nothing
    /// otherwise. Never admits past the ceiling.
    pub fn reserve_burst(&mut self, requested: usize, floor: usize) -> usize {
        let headroom = self.headroom();
        let admitted = if requested <= headroom {
            requested
        } else if headroom >= floor {
            headroom
        } else {
            0
        };
        self.live += admitted;
        admitted
    }

    /// All-or-nothing admission, used for split bursts.
    pub fn reserve_exact(&mut self, count: usize) -> bool {
        if count > self.headroom() {
            return false;
        }
        self.live += count;
        true
    }

    pub fn release(&mut self, count: usize) {
        debug_assert!(count <= self.live, "released more particles than were reserved");
        self.live = self.live.saturating_sub(count);
    }
}
