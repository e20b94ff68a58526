use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use fireshow::config::parse_hex_color;
use fireshow::{Effect, FireworksShow, ShowConfig};
use std::fs::File;
use std::io::{BufWriter, Stdout, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Fireworks show for the terminal. Click to launch shells from the pointer.
/// Press 'q', ESC, or Ctrl+C to exit.
#[derive(Debug, Parser)]
#[command(name = "fireshow", version)]
struct Args {
    /// Most shells in flight or burning at once
    #[arg(long, default_value_t = 20)]
    max_fireworks: usize,

    /// Most live sparks across the whole show
    #[arg(long, default_value_t = 3000)]
    max_particles: usize,

    /// Smallest burst drawn when the spark budget is tight
    #[arg(long, default_value_t = 100)]
    burst_floor: usize,

    /// Shortest pause between launch batches, in milliseconds
    #[arg(long, default_value_t = 300.0)]
    launch_min_ms: f32,

    /// Longest pause between launch batches, in milliseconds
    #[arg(long, default_value_t = 1000.0)]
    launch_max_ms: f32,

    /// Delay between shells of one batch, in milliseconds
    #[arg(long, default_value_t = 150.0)]
    stagger_ms: f32,

    /// World units per terminal cell; larger values shrink the show
    #[arg(long, default_value_t = 6.0)]
    cell_size: f32,

    /// Background color as hex (e.g., --bg-color 1a1b26)
    #[arg(long, value_parser = parse_bg_color)]
    bg_color: Option<(u8, u8, u8)>,

    /// Seed the random source for a repeatable show
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (the terminal is taken by the show)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Maximum log level written to --log-file
    #[arg(long, default_value_t = tracing::Level::INFO)]
    log_level: tracing::Level,
}

impl Args {
    fn show_config(&self) -> ShowConfig {
        ShowConfig {
            max_fireworks: self.max_fireworks,
            max_particles: self.max_particles,
            burst_floor: self.burst_floor,
            launch_interval_ms: (self.launch_min_ms, self.launch_max_ms),
            stagger_ms: self.stagger_ms,
            cell_size: self.cell_size,
            background: self.bg_color.unwrap_or((0, 0, 0)),
            seed: self.seed,
        }
    }
}

fn parse_bg_color(value: &str) -> Result<(u8, u8, u8), String> {
    parse_hex_color(value)
        .ok_or_else(|| format!("invalid hex color {value:?}, expected RRGGBB (e.g., 1a1b26)"))
}

fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(args.log_level)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

fn run_effect<E: Effect>(config: &ShowConfig) -> Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)
        .context("failed to prepare terminal")?;

    let result = drive::<E>(&mut stdout, config);

    execute!(stdout, Show, LeaveAlternateScreen, DisableMouseCapture)
        .context("failed to restore terminal")?;
    terminal::disable_raw_mode().context("failed to disable raw mode")?;

    result
}

fn drive<E: Effect>(stdout: &mut BufWriter<Stdout>, config: &ShowConfig) -> Result<()> {
    let (cols, rows) = terminal::size().context("failed to query terminal size")?;
    let mut effect = E::mount(cols as usize, rows as usize * 2, config)?;

    let outcome = run_frames(&mut effect, stdout);
    effect.unmount();
    outcome
}

fn run_frames<E: Effect>(effect: &mut E, stdout: &mut BufWriter<Stdout>) -> Result<()> {
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;
    const FIXED_DT: f32 = 1.0 / 60.0;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            match &event {
                Event::Key(key_event) => {
                    if key_event.code == KeyCode::Char('q')
                        || key_event.code == KeyCode::Esc
                        || (key_event.code == KeyCode::Char('c')
                            && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
                    {
                        return Ok(());
                    }
                    effect.handle_event(&event);
                }
                Event::Resize(cols, rows) => {
                    effect.resize(*cols as usize, *rows as usize * 2);
                    execute!(stdout, Clear(ClearType::All))?;
                }
                _ => {
                    effect.handle_event(&event);
                }
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            effect.update(FIXED_DT);
            accumulator -= FIXED_DT;
        }

        effect.render(stdout).context("failed to draw frame")?;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = args.show_config();
    config.validate()?;

    run_effect::<FireworksShow>(&config)
}
