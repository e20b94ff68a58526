use crate::config::ShowConfig;
use crate::error::ShowError;
use crossterm::event::Event;
use std::io::{self, Write};

pub mod fireworks;

/// Lifecycle the terminal host drives: mount once, tick and render every
/// frame, unmount on the way out.
pub trait Effect {
    fn mount(width: usize, height: usize, config: &ShowConfig) -> Result<Self, ShowError>
    where
        Self: Sized;
    /// Surface dimensions changed. Only the raster is rebuilt.
    fn resize(&mut self, width: usize, height: usize);
    fn update(&mut self, dt: f32);
    fn render(&mut self, out: &mut dyn Write) -> io::Result<()>;
    fn handle_event(&mut self, _event: &Event) {}
    /// Cancels pending work; no state changes after this returns.
    fn unmount(&mut self);
}
