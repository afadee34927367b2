use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keyveil::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{Command, CrosstermEventSource, Runner, TrainerEvent},
    GameMode, MaskPolicy, Trainer, TrainerError,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TICK_RATE_MS: u64 = 100;

/// touch-typing trainer: learn a shuffled layout until every letter is hidden
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A touch-typing trainer. Keys are mapped to shuffled letters; type the prompted letter and each key's letter is hidden once you have hit it enough times in a row. Win by typing from memory with every key hidden."
)]
pub struct Cli {
    /// start directly in this mode instead of showing the mode screen
    #[clap(short = 'm', long, value_enum)]
    mode: Option<GameMode>,

    /// rule that decides when a key's letter is hidden
    #[clap(short = 'p', long, value_enum)]
    policy: Option<MaskPolicy>,

    /// global-order priority, given as the characters printed on the keys (e.g. "fjdksla;")
    #[clap(long)]
    priority: Option<String>,

    /// correct presses in a row on a key before its letter is hidden
    #[clap(long)]
    streak_to_hide: Option<usize>,

    /// correct presses on hidden keys in a row needed to win
    #[clap(long)]
    streak_to_win: Option<usize>,

    /// number of recent presses shown under the keyboard
    #[clap(long)]
    history: Option<usize>,

    /// seed for reproducible layouts and prompts
    #[clap(short = 's', long)]
    seed: Option<u64>,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command-line flags override the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if self.mode.is_some() {
            cfg.mode = self.mode;
        }
        if let Some(policy) = self.policy {
            cfg.policy = policy;
        }
        if let Some(n) = self.streak_to_hide {
            cfg.streak_to_hide = n;
        }
        if let Some(n) = self.streak_to_win {
            cfg.streak_to_win = n;
        }
        if let Some(n) = self.history {
            cfg.history_window = n;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if self.priority.is_some() {
            cfg.priority.clone_from(&self.priority);
        }
        cfg
    }
}

#[derive(Debug)]
pub struct App {
    pub trainer: Trainer,
    pub history_window: usize,
}

impl App {
    pub fn new(cfg: &Config) -> Result<Self, TrainerError> {
        let mut trainer = Trainer::new(cfg.session_config())?;
        if let Some(mode) = cfg.mode {
            trainer.select_mode(mode)?;
        }

        Ok(Self {
            trainer,
            history_window: cfg.history_window,
        })
    }

    /// Returns false when the app should exit
    pub fn handle(&mut self, command: Command) -> Result<bool, TrainerError> {
        match command {
            Command::Quit => return Ok(false),
            Command::ModeMenu => self.trainer.reset(),
            Command::SelectMode(mode) => self.trainer.select_mode(mode)?,
            Command::Regenerate => self.trainer.regenerate_layout()?,
            Command::Press(key) => {
                self.trainer.press(key)?;
            }
            Command::Nothing => {}
        }
        Ok(true)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tracing();

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "config saved");
    }

    // Configuration errors surface here, before the terminal is taken over
    let mut app = App::new(&config).inspect_err(|e| tracing::error!("{e}"))?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!("session aborted: {e}");
    }
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| ui(app, f))?;
    loop {
        match runner.step() {
            TrainerEvent::Tick => continue,
            TrainerEvent::Resize => {}
            TrainerEvent::Key(key) => {
                let command = Command::from_key(&key, app.trainer.phase());
                if !app.handle(command)? {
                    break;
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app.trainer.snapshot(app.history_window), f.area());
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // The TUI owns stdout/stderr, so logs only ever go to a file
    let log_file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init(),
        None => tracing_subscriber::registry().with(env_filter).init(),
    }
}
