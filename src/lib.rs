//! Terminal fireworks show: a particle engine that launches shells along
//! curved paths, bursts them into patterned sparks and paints the result
//! with half-block glyphs.

pub mod color;
pub mod config;
pub mod effects;
pub mod error;
pub mod frame;

pub use config::ShowConfig;
pub use effects::Effect;
pub use effects::fireworks::FireworksShow;
pub use error::ShowError;
