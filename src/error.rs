use thiserror::Error;

/// Reasons a show refuses to start.
///
/// Running out of firework slots or particle budget is not in here: those
/// requests are dropped or truncated silently.
#[derive(Debug, Error, PartialEq)]
pub enum ShowError {
    #[error("drawable surface is empty ({width}x{height})")]
    EmptySurface { width: usize, height: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
