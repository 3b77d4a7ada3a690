//! Headless farm driver.
//!
//! Reads one command per line and turns it into simulation ticks. Key holds
//! are simulated by feeding the same input for as many ticks as the hold
//! needs. Time advances only while ticking.

use std::fmt::Write as _;
use std::io::{BufRead, Write};

use anyhow::Result;
use farmstead_common::CellCoord;
use farmstead_gameplay::{
    unix_now, ActionFamily, ActionKind, Commit, CommitOutcome, DocumentStorage, FarmSession,
    FileStorage, InteractionResult, ManualClock, Persistence, SaveError, TickInput,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;

/// A hold gives up after this many times its threshold.
const HOLD_TIMEOUT_FACTOR: f32 = 4.0;

/// Longest single `wait` (seconds).
pub const MAX_WAIT_SECONDS: f32 = 3600.0;

const HELP_TEXT: &str = "\
Commands:
  plant <x> <z>     hold plant on a cell
  water <x> <z>     hold water on a cell
  harvest <x> <z>   hold harvest on a cell
  wait <seconds>    let time pass
  swap <a> <b>      swap two inventory slots
  inventory         list inventory slots
  grid              show the farm
  save              save now
  load              reload the last save
  help              show this help
  quit              save and exit";

/// Command parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Unknown command word
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    /// Wrong number of arguments
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Argument is not a valid number
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// Wait longer than [`MAX_WAIT_SECONDS`]
    #[error("wait is limited to {MAX_WAIT_SECONDS} seconds")]
    WaitTooLong,
}

/// A parsed driver command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Hold an action key on a cell until it commits
    Hold {
        /// Action to perform
        action: ActionKind,
        /// Target cell
        cell: CellCoord,
    },
    /// Tick idle for a number of seconds
    Wait(f32),
    /// Swap two inventory slots
    Swap(usize, usize),
    /// List the inventory
    Inventory,
    /// Draw the grid
    Grid,
    /// Save now
    Save,
    /// Reload the last save
    Load,
    /// Show help
    Help,
    /// Exit
    Quit,
}

impl Command {
    /// Parses a command line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = parts.first() else {
            return Ok(None);
        };
        let args = &parts[1..];

        let command = match *command {
            "plant" => Self::hold(ActionKind::Plant, args, "plant <x> <z>")?,
            "water" => Self::hold(ActionKind::Water, args, "water <x> <z>")?,
            "harvest" => Self::hold(ActionKind::Harvest, args, "harvest <x> <z>")?,
            "wait" => match args {
                [text] => {
                    let seconds: f32 = parse_number(text)?;
                    if !seconds.is_finite() || seconds < 0.0 {
                        return Err(CommandError::InvalidNumber((*text).to_string()));
                    }
                    if seconds > MAX_WAIT_SECONDS {
                        return Err(CommandError::WaitTooLong);
                    }
                    Self::Wait(seconds)
                },
                _ => return Err(CommandError::Usage("wait <seconds>")),
            },
            "swap" => match args {
                [a, b] => Self::Swap(parse_number(a)?, parse_number(b)?),
                _ => return Err(CommandError::Usage("swap <a> <b>")),
            },
            "inventory" | "inv" => Self::Inventory,
            "grid" => Self::Grid,
            "save" => Self::Save,
            "load" => Self::Load,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    fn hold(action: ActionKind, args: &[&str], usage: &'static str) -> Result<Self, CommandError> {
        match args {
            [x, z] => Ok(Self::Hold {
                action,
                cell: CellCoord::new(parse_number(x)?, parse_number(z)?),
            }),
            _ => Err(CommandError::Usage(usage)),
        }
    }
}

fn parse_number<T: std::str::FromStr>(text: &str) -> Result<T, CommandError> {
    text.parse()
        .map_err(|_| CommandError::InvalidNumber(text.to_string()))
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this and keep going
    Continue(String),
    /// Stop the driver
    Quit,
}

/// The driver: a session, its persistence and the clock it ticks.
#[derive(Debug)]
pub struct App<S> {
    session: FarmSession,
    persistence: Persistence<S>,
    clock: ManualClock,
    dt: f32,
    /// Set when the stored save could not be read; writes would destroy it
    saves_disabled: bool,
}

impl<S: DocumentStorage> App<S> {
    /// Creates the driver over a storage medium.
    #[must_use]
    pub fn new(config: &EngineConfig, storage: S) -> Self {
        let clock = ManualClock::new(unix_now());
        let session = FarmSession::new(config.farm.clone(), Box::new(clock.clone()))
            .with_auto_save_interval(config.auto_save_interval);

        Self {
            session,
            persistence: Persistence::new(storage),
            clock,
            dt: config.tick_dt(),
            saves_disabled: false,
        }
    }

    /// Gets the session.
    #[must_use]
    pub fn session(&self) -> &FarmSession {
        &self.session
    }

    /// Gets the persistence layer.
    #[must_use]
    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Returns true if saving is off because the stored save is unreadable.
    #[must_use]
    pub fn saves_disabled(&self) -> bool {
        self.saves_disabled
    }

    /// Loads the last save, or starts a fresh farm.
    ///
    /// An unreadable save is left in place and saving is turned off for the
    /// session.
    pub fn start(&mut self) {
        match self.session.start(&self.persistence) {
            Ok(Some(report)) => info!(
                restored = report.restored_spots,
                dropped = report.dropped_entries,
                "resumed farm"
            ),
            Ok(None) => {},
            Err(e) => {
                warn!(error = %e, "could not load save, starting fresh with saving disabled");
                self.saves_disabled = true;
                self.session.grant_starter_seeds();
            },
        }
    }

    /// Saves before exit.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.saves_disabled {
            warn!("saving disabled, exit save skipped");
            return Ok(());
        }
        self.session.save(&mut self.persistence)?;
        Ok(())
    }

    fn save(&mut self) -> String {
        if self.saves_disabled {
            return "save disabled: the existing save could not be read".to_string();
        }
        match self.session.save(&mut self.persistence) {
            Ok(()) => "saved".to_string(),
            Err(e) => format!("save failed: {e}"),
        }
    }

    fn load(&mut self) -> String {
        match self.session.load(&self.persistence) {
            Ok(report) => {
                self.saves_disabled = false;
                format!("loaded {} crops", report.restored_spots)
            },
            Err(SaveError::NotFound(_)) => "no save found".to_string(),
            Err(e) => {
                self.saves_disabled = true;
                format!("load failed: {e}; saving disabled")
            },
        }
    }

    /// Executes one command.
    pub fn execute(&mut self, command: Command) -> Reply {
        let text = match command {
            Command::Hold { action, cell } => self.hold(action, cell),
            Command::Wait(seconds) => self.wait(seconds),
            Command::Swap(a, b) => match self.session.inventory_mut().swap(a, b) {
                Ok(()) => format!("swapped slots {a} and {b}"),
                Err(e) => e.to_string(),
            },
            Command::Inventory => self.describe_inventory(),
            Command::Grid => self.describe_grid(),
            Command::Save => self.save(),
            Command::Load => self.load(),
            Command::Help => HELP_TEXT.to_string(),
            Command::Quit => return Reply::Quit,
        };
        Reply::Continue(text)
    }

    /// Advances one tick with the given input.
    fn step(&mut self, input: &TickInput) -> InteractionResult<Option<Commit>> {
        self.clock.advance(f64::from(self.dt));
        let result = self.session.tick(input, self.dt);

        for event in self.session.grid_mut().take_visual_events() {
            debug!(
                spot = %event.spot,
                kind = ?event.kind,
                asset = event.asset.as_deref().unwrap_or("none"),
                "visual event"
            );
        }

        if self.session.should_auto_save() {
            if self.saves_disabled {
                self.session.mark_saved();
            } else if let Err(e) = self.session.save(&mut self.persistence) {
                warn!(error = %e, "auto-save failed");
                self.session.mark_saved();
            }
        }

        result
    }

    fn hold(&mut self, action: ActionKind, cell: CellCoord) -> String {
        let Some(target) = self.session.grid().id_at(cell) else {
            return format!("{cell} is off the grid");
        };
        let Some(spot) = self.session.grid().spot(target) else {
            return format!("{cell} is off the grid");
        };
        let refusal = match action {
            ActionKind::Plant if spot.has_crop() => Some("already planted"),
            ActionKind::Plant if self.session.inventory().first_seed().is_none() => {
                Some("no seeds to plant")
            },
            ActionKind::Harvest if !spot.has_crop() => Some("nothing to harvest"),
            ActionKind::Water if !spot.can_water() => Some("nothing to water"),
            _ => None,
        };
        if let Some(reason) = refusal {
            return format!("{cell}: {reason}");
        }

        let input = match action.family() {
            ActionFamily::PlantOrHarvest => TickInput::plant_or_harvest(target),
            ActionFamily::Water => TickInput::water(target),
        };
        let threshold = self.session.config().interaction.hold_threshold(action);
        let max_ticks = (threshold * HOLD_TIMEOUT_FACTOR / self.dt).ceil() as usize + 1;

        let mut text = format!("{} on {cell} did not complete", action.display_name());
        for _ in 0..max_ticks {
            match self.step(&input) {
                Ok(Some(commit)) => {
                    text = describe_commit(&commit, cell);
                    break;
                },
                Ok(None) => {},
                Err(e) => {
                    text = format!("{} on {cell} failed: {e}", action.display_name());
                    break;
                },
            }
        }

        if let Err(e) = self.step(&TickInput::idle()) {
            warn!(error = %e, "release tick failed");
        }
        text
    }

    fn wait(&mut self, seconds: f32) -> String {
        let ticks = (seconds / self.dt).round() as usize;
        for _ in 0..ticks {
            if let Err(e) = self.step(&TickInput::idle()) {
                warn!(error = %e, "idle tick failed");
            }
        }
        format!("waited {seconds}s")
    }

    fn describe_inventory(&self) -> String {
        let mut text = String::new();
        for (index, slot) in self.session.inventory().slots().iter().enumerate() {
            match slot {
                Some(stack) => {
                    let _ = writeln!(text, "[{index}] {} x{}", stack.display_name, stack.count);
                },
                None => {
                    let _ = writeln!(text, "[{index}] -");
                },
            }
        }
        text.trim_end().to_string()
    }

    fn describe_grid(&self) -> String {
        let grid = self.session.grid();
        let rows: Vec<String> = (0..grid.height())
            .map(|z| {
                (0..grid.width())
                    .map(|x| match grid.spot_at(CellCoord::new(x, z)).and_then(|s| s.crop()) {
                        None => '.',
                        Some(crop) if crop.is_mature() => 'M',
                        Some(_) => 'y',
                    })
                    .collect()
            })
            .collect();
        rows.join("\n")
    }
}

fn describe_commit(commit: &Commit, cell: CellCoord) -> String {
    match &commit.outcome {
        CommitOutcome::Planted { kind } => format!("planted {kind} at {cell}"),
        CommitOutcome::Watered => format!("watered {cell}"),
        CommitOutcome::Harvested { items } => {
            let items: Vec<String> = items
                .iter()
                .map(|item| format!("{} x{}", item.display_name, item.count))
                .collect();
            format!("harvested {cell}: {}", items.join(", "))
        },
    }
}

/// Feeds commands from `input` to the app until quit or end of input.
pub fn run_with<S, R, W>(app: &mut App<S>, input: R, mut output: W) -> Result<()>
where
    S: DocumentStorage,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = %line, "rejected command");
                writeln!(output, "{e}")?;
                continue;
            },
        };
        match app.execute(command) {
            Reply::Continue(text) => writeln!(output, "{text}")?,
            Reply::Quit => break,
        }
    }

    app.shutdown()?;
    writeln!(output, "bye")?;
    Ok(())
}

/// Run the driver on stdin/stdout with file-backed saves.
pub fn run(config: &EngineConfig) -> Result<()> {
    let save_path = config.save_path();
    info!("Save file: {}", save_path.display());

    let mut app = App::new(config, FileStorage::new(save_path));
    app.start();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_with(&mut app, stdin.lock(), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmstead_gameplay::MemoryStorage;
    use std::io::Cursor;

    fn app() -> App<MemoryStorage> {
        let mut app = App::new(&EngineConfig::default(), MemoryStorage::new());
        app.start();
        app
    }

    fn run_script(app: &mut App<MemoryStorage>, script: &str) -> String {
        let mut output = Vec::new();
        run_with(app, Cursor::new(script), &mut output).expect("script runs");
        String::from_utf8(output).expect("utf-8 output")
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("plant 2 3"),
            Ok(Some(Command::Hold {
                action: ActionKind::Plant,
                cell: CellCoord::new(2, 3)
            }))
        );
        assert_eq!(Command::parse("  wait 1.5 "), Ok(Some(Command::Wait(1.5))));
        assert_eq!(Command::parse("swap 0 8"), Ok(Some(Command::Swap(0, 8))));
        assert_eq!(Command::parse("inv"), Ok(Some(Command::Inventory)));
        assert_eq!(Command::parse(""), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            Command::parse("water 1"),
            Err(CommandError::Usage("water <x> <z>"))
        );
        assert_eq!(
            Command::parse("plant a 1"),
            Err(CommandError::InvalidNumber("a".to_string()))
        );
        assert_eq!(
            Command::parse("wait -2"),
            Err(CommandError::InvalidNumber("-2".to_string()))
        );
        assert_eq!(Command::parse("wait 1e30"), Err(CommandError::WaitTooLong));
        assert_eq!(
            Command::parse("wait 3600"),
            Ok(Some(Command::Wait(MAX_WAIT_SECONDS)))
        );
    }

    #[test]
    fn test_fresh_start_has_starter_seeds() {
        let app = app();
        assert_eq!(app.session().inventory().count("plant_seed"), 1000);
    }

    #[test]
    fn test_plant_water_harvest_script() {
        let mut app = app();
        let output = run_script(
            &mut app,
            "plant 0 0\nwater 0 0\ngrid\nharvest 0 0\ninventory\nquit\n",
        );

        assert!(output.contains("planted plant_seed at (0, 0)"));
        assert!(output.contains("watered (0, 0)"));
        assert!(output.contains("M....."));
        assert!(output.contains("harvested (0, 0): Extraction x1, Plant Seed x2"));
        assert!(output.contains("[0] Plant Seed x1001"));
        assert!(output.contains("[1] Extraction x1"));
        assert!(output.ends_with("bye\n"));
        assert!(app.persistence().storage().bytes().is_some());
    }

    #[test]
    fn test_refusals() {
        let mut app = app();
        let output = run_script(&mut app, "harvest 0 0\nwater 0 0\nplant 9 9\nplant 1 0\nplant 1 0\n");

        assert!(output.contains("(0, 0): nothing to harvest"));
        assert!(output.contains("(0, 0): nothing to water"));
        assert!(output.contains("(9, 9) is off the grid"));
        assert!(output.contains("(1, 0): already planted"));
    }

    #[test]
    fn test_unknown_command_keeps_running() {
        let mut app = app();
        let output = run_script(&mut app, "dance\nswap 0 1\nswap 0 99\n");

        assert!(output.contains("unknown command 'dance'"));
        assert!(output.contains("swapped slots 0 and 1"));
        assert!(output.contains("Invalid slot index 99"));
        assert_eq!(
            app.session().inventory().slot(1).map(|s| s.kind.as_str()),
            Some("plant_seed")
        );
    }

    #[test]
    fn test_save_and_load_commands() {
        let mut app = app();
        let output = run_script(
            &mut app,
            "load\nsave\nload\nplant 2 1\nsave\nharvest 2 1\nload\ngrid\n",
        );

        assert!(output.contains("no save found"));
        assert!(output.contains("loaded 0 crops"));
        assert!(output.contains("saved"));
        assert!(output.contains("loaded 1 crops"));
        assert!(output.contains("......\n..y..."));
    }

    #[test]
    fn test_unreadable_save_is_never_overwritten() {
        let newer = r#"{"version":{"major":1,"minor":9,"patch":0},"spots":[],"inventory":[{"kind":"gold","displayName":"Gold","count":500}]}"#;
        let config = EngineConfig {
            auto_save_interval: 1.0,
            ..EngineConfig::default()
        };
        let mut app = App::new(&config, MemoryStorage::with_bytes(newer));
        app.start();

        assert!(app.saves_disabled());
        assert_eq!(app.session().inventory().count("plant_seed"), 1000);

        let output = run_script(&mut app, "plant 0 0\nwait 3\nsave\nquit\n");
        assert!(output.contains("save disabled"));
        assert!(output.ends_with("bye\n"));
        assert_eq!(
            app.persistence().storage().bytes(),
            Some(newer.as_bytes())
        );
    }

    #[test]
    fn test_corrupted_save_is_never_overwritten() {
        let storage = MemoryStorage::with_bytes("{not json");
        let mut app = App::new(&EngineConfig::default(), storage);
        app.start();

        let output = run_script(&mut app, "load\nsave\n");
        assert!(output.contains("load failed"));
        assert!(output.contains("save disabled"));
        assert_eq!(
            app.persistence().storage().bytes(),
            Some("{not json".as_bytes())
        );
    }
}
