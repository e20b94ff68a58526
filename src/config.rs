use crate::error::ShowError;

/// Tunables for a fireworks show. Defaults match the stock show.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowConfig {
    /// Most shells in the air (or still burning) at once.
    pub max_fireworks: usize,
    /// Most live particles across every firework.
    pub max_particles: usize,
    /// Smallest burst worth drawing when the budget is tight.
    pub burst_floor: usize,
    /// Launch cadence in milliseconds, redrawn after every launch event.
    pub launch_interval_ms: (f32, f32),
    /// Delay between shells of one batch, in milliseconds.
    pub stagger_ms: f32,
    /// World units covered by one terminal cell (and by one half-row).
    pub cell_size: f32,
    pub background: (u8, u8, u8),
    pub seed: Option<u64>,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            max_fireworks: 20,
            max_particles: 3000,
            burst_floor: 100,
            launch_interval_ms: (300.0, 1000.0),
            stagger_ms: 150.0,
            cell_size: 6.0,
            background: (0, 0, 0),
            seed: None,
        }
    }
}

impl ShowConfig {
    pub fn validate(&self) -> Result<(), ShowError> {
        if self.max_fireworks == 0 {
            return Err(ShowError::InvalidConfig("max_fireworks must be at least 1".into()));
        }
        if self.max_particles == 0 {
            return Err(ShowError::InvalidConfig("max_particles must be at least 1".into()));
        }
        if self.burst_floor > self.max_particles {
            return Err(ShowError::InvalidConfig(format!(
                "burst_floor {} exceeds max_particles {}",
                self.burst_floor, self.max_particles
            )));
        }
        let (lo, hi) = self.launch_interval_ms;
        if lo.is_nan() || hi.is_nan() || lo < 0.0 || hi < lo {
            return Err(ShowError::InvalidConfig(format!(
                "launch interval {lo}..{hi} ms is not a valid range"
            )));
        }
        // Zero stagger sends a whole batch up on one tick
        if self.stagger_ms.is_nan() || self.stagger_ms < 0.0 {
            return Err(ShowError::InvalidConfig("stagger_ms must not be negative".into()));
        }
        if self.cell_size.is_nan() || self.cell_size <= 0.0 {
            return Err(ShowError::InvalidConfig("cell_size must be positive".into()));
        }
        Ok(())
    }
}

/// Parses `RRGGBB`, with or without a leading `#`.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ShowConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_floor_above_ceiling() {
        let config = ShowConfig {
            max_particles: 50,
            burst_floor: 100,
            ..ShowConfig::default()
        };
        assert!(matches!(config.validate(), Err(ShowError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_inverted_launch_interval() {
        let config = ShowConfig {
            launch_interval_ms: (900.0, 200.0),
            ..ShowConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_cell_size() {
        let config = ShowConfig {
            cell_size: 0.0,
            ..ShowConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nan_cell_size() {
        let config = ShowConfig {
            cell_size: f32::NAN,
            ..ShowConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nan_launch_interval() {
        let config = ShowConfig {
            launch_interval_ms: (f32::NAN, 500.0),
            ..ShowConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn stagger_may_be_zero_but_not_negative() {
        let zero = ShowConfig {
            stagger_ms: 0.0,
            ..ShowConfig::default()
        };
        assert_eq!(zero.validate(), Ok(()));

        for stagger_ms in [-1.0, f32::NAN] {
            let config = ShowConfig {
                stagger_ms,
                ..ShowConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("1a1b26"), Some((0x1a, 0x1b, 0x26)));
        assert_eq!(parse_hex_color("#FF0080"), Some((255, 0, 128)));
        assert_eq!(parse_hex_color("fff"), None);
        assert_eq!(parse_hex_color("zz0000"), None);
    }
}
