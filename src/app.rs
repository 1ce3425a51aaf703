use crate::config::{load_words, Args, Settings};
use crate::ecosystem::Ecosystem;
use crate::population::PopulationController;
use crate::render::{CleanupGuard, Renderer};
use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::Color,
    terminal,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{self, Stdout};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Smallest terminal the tank generator copes with.
const MIN_COLS: u16 = 40;
const MIN_ROWS: u16 = 16;

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_tracing(path)?;
    }
    let settings = args.settings()?;
    let words = if settings.word_bubbles {
        load_words(&settings.word_file)
    } else {
        Vec::new()
    };

    let mut app = App::init(settings, words)?;
    app.run()
}

/// The terminal belongs to the renderer, so logs only go to a file.
fn init_tracing(path: &std::path::Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

struct App {
    settings: Settings,
    words: Vec<String>,
    rng: StdRng,
    eco: Ecosystem,
    controller: PopulationController,
    renderer: Renderer,
    out: Stdout,
    verbose: bool,
    should_quit: bool,
    last_frame: Duration,
    // dropped last so the screen is restored after everything else
    _guard: CleanupGuard,
}

impl App {
    fn init(settings: Settings, words: Vec<String>) -> anyhow::Result<Self> {
        let (cols, rows) = terminal::size().context("querying terminal size")?;
        if cols < MIN_COLS || rows < MIN_ROWS {
            anyhow::bail!("terminal too small: {cols}x{rows}, need at least {MIN_COLS}x{MIN_ROWS}");
        }

        let seed = settings.seed.unwrap_or_else(rand::random);
        info!(seed, "starting aquarium");
        let mut rng = StdRng::seed_from_u64(seed);

        let eco = Ecosystem::generate(i32::from(cols), i32::from(rows) - 1, &settings, words.clone(), &mut rng);
        let controller = controller_for(&settings, &eco);

        let mut out = io::stdout();
        let guard = CleanupGuard::enter(&mut out)?;

        Ok(Self {
            verbose: settings.verbose,
            settings,
            words,
            rng,
            eco,
            controller,
            renderer: Renderer::new(cols, rows),
            out,
            should_quit: false,
            last_frame: Duration::ZERO,
            _guard: guard,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let delay = self.settings.delay();

        while !self.should_quit {
            let frame_start = Instant::now();
            self.handle_input()?;
            if self.should_quit {
                break;
            }

            self.eco.tick(&mut self.rng);

            self.renderer.compose(self.eco.surface());
            if self.verbose {
                let lines = self.overlay_lines(delay);
                self.renderer.overlay(&lines, Color::White);
            }
            self.renderer.flush(&mut self.out)?;

            // pacing
            while frame_start.elapsed() < delay {
                std::hint::spin_loop();
                let left = delay.saturating_sub(frame_start.elapsed());
                if left > Duration::from_millis(2) {
                    std::thread::sleep(left - Duration::from_millis(1));
                }
            }

            self.last_frame = frame_start.elapsed();
            self.controller.regulate(self.last_frame, &mut self.eco, &mut self.rng);
        }
        Ok(())
    }

    fn handle_input(&mut self) -> anyhow::Result<()> {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Resize(cols, rows) => self.rebuild(cols, rows),
                Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press,
                    ..
                }) => match code {
                    KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        self.should_quit = true
                    }
                    KeyCode::Char('l') if modifiers.contains(KeyModifiers::CONTROL) => {
                        self.renderer.request_full_redraw()
                    }
                    KeyCode::Char('v') => {
                        self.verbose = !self.verbose;
                        self.renderer.request_full_redraw();
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        Ok(())
    }

    /// A new terminal size means a new tank.
    fn rebuild(&mut self, cols: u16, rows: u16) {
        let cols = cols.max(MIN_COLS);
        let rows = rows.max(MIN_ROWS);
        info!(cols, rows, "terminal resized, regenerating tank");
        self.eco = Ecosystem::generate(
            i32::from(cols),
            i32::from(rows) - 1,
            &self.settings,
            self.words.clone(),
            &mut self.rng,
        );
        self.controller = controller_for(&self.settings, &self.eco);
        self.renderer.resize(cols, rows);
    }

    fn overlay_lines(&self, delay: Duration) -> Vec<String> {
        let mut lines = vec![
            format!(
                "reduce clock {:>4}{}",
                self.controller.clock(),
                if self.controller.is_settled() { " (settled)" } else { "" }
            ),
            format!(
                "frame {:>4} ms / {} ms  population {}/{}",
                self.last_frame.as_millis(),
                delay.as_millis(),
                self.eco.population(),
                self.eco.max_fish()
            ),
        ];
        for school in self.eco.schools() {
            lines.push(format!(
                "{:<12} {:<13} {:>3} {:?}",
                school.species.label(),
                school.topology.label(),
                school.len(),
                school.color
            ));
        }
        lines
    }
}

fn controller_for(settings: &Settings, eco: &Ecosystem) -> PopulationController {
    PopulationController::new(settings.delay(), eco.max_fish())
        .with_settle_frames(settings.settle_frames)
        .with_rearm(settings.rearm())
        .with_ideal_ratio(settings.ideal_ratio as usize)
        .with_min_school_size(settings.min_school_size)
}
