//! sim-runner: headless session runner for the city simulation.
//!
//! Usage:
//!   sim-runner --seed 12345 --frames 3600 --db saves.db
//!   sim-runner --config sim.json --speed 3
//!   sim-runner --ipc-mode

use anyhow::Result;
use citytick_core::{
    autosave_unit::existing_autosaves,
    calendar_unit::CalendarUnit,
    clock::ManualClock,
    command::ControlCommand,
    config::SimConfig,
    event::SimEvent,
    scheduler::Scheduler,
    snapshot::load_game,
    store::SqliteSaveStore,
    types::Tick,
    world::{GameWorld, OwnedContent, Player},
};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::env;
use std::io::{self, BufRead, Write};

const FRAME_SECONDS: f64 = 1.0 / 60.0;
/// Chance that a frame stalls, as a backgrounded tab would.
const STALL_CHANCE: f64 = 0.002;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Frames { count: u64 },
    Command { cmd: ControlCommand },
    Delay { delay_ticks: Tick, message: String },
    Load { key: String },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    tick:      Tick,
    paused:    bool,
    speed:     u32,
    max_speed: u32,
    date:      Option<String>,
    players:   Vec<PlayerSummary>,
    autosaves: Vec<String>,
    events:    Vec<SimEvent>,
}

#[derive(serde::Serialize)]
struct PlayerSummary {
    id:    String,
    name:  String,
    money: f64,
}

/// Host-side frame loop: jittered frame times fed into a manual clock.
struct Session {
    scheduler: Scheduler,
    clock:     ManualClock,
    frame_rng: Pcg64Mcg,
    world:     GameWorld,
    store:     SqliteSaveStore,
}

impl Session {
    fn run_frames(&mut self, frames: u64) -> Vec<SimEvent> {
        use rand::Rng;
        let mut events = Vec::new();
        for _ in 0..frames {
            let mut dt = FRAME_SECONDS * self.frame_rng.gen_range(0.8..1.25);
            if self.frame_rng.gen_bool(STALL_CHANCE) {
                dt += self.frame_rng.gen_range(0.5..3.0);
                log::debug!("frame stalled for {dt:.2}s");
            }
            self.clock.advance(dt);
            events.extend(self.scheduler.update(&mut self.world, &mut self.store));
        }
        events
    }

    fn ui_state(&self, events: Vec<SimEvent>) -> Result<UiState> {
        Ok(UiState {
            tick:      self.scheduler.tick_number(),
            paused:    self.scheduler.is_paused(),
            speed:     self.scheduler.speed(),
            max_speed: self.scheduler.max_speed(),
            date:      self
                .scheduler
                .find_unit::<CalendarUnit>()
                .map(|c| c.date().to_string()),
            players:   self
                .world
                .players
                .iter()
                .map(|p| PlayerSummary {
                    id:    p.id.clone(),
                    name:  p.name.clone(),
                    money: p.money,
                })
                .collect(),
            autosaves: existing_autosaves(&self.store)?,
            events,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let frames = parse_arg(&args, "--frames", 3600u64);
    let speed = parse_arg(&args, "--speed", 0i64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");

    let config = match string_arg(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    if !ipc_mode {
        println!("citytick — sim-runner");
        println!("  seed:      {seed}");
        println!("  frames:    {frames}");
        println!("  db:        {db}");
        println!("  tick:      {} ms", config.scheduler.base_tick_ms);
        println!();
    }

    let store = if db == ":memory:" {
        SqliteSaveStore::in_memory()?
    } else {
        SqliteSaveStore::open(db)?
    };
    store.migrate()?;

    let clock = ManualClock::new();
    let mut scheduler = Scheduler::build(&config, Box::new(clock.clone()))?;
    if speed != 0 {
        scheduler.set_speed(speed);
    }

    let mut session = Session {
        scheduler,
        clock,
        frame_rng: Pcg64Mcg::seed_from_u64(seed),
        world: demo_world(&config.units.profit_target_type),
        store,
    };

    if ipc_mode {
        run_ipc_loop(&mut session)?;
    } else {
        let events = session.run_frames(frames);
        print_summary(&session, &events, frames)?;
    }

    Ok(())
}

fn run_ipc_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let events = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Vec::new(),
            IpcCommand::Frames { count } => session.run_frames(count),
            IpcCommand::Command { cmd } => {
                session.scheduler.submit(cmd);
                session.run_frames(1)
            }
            IpcCommand::Delay { delay_ticks, message } => {
                let due = session.scheduler.request_delayed_action(
                    delay_ticks,
                    Box::new(move || {
                        log::info!("delayed action: {message}");
                        Ok(())
                    }),
                )?;
                log::debug!("delayed action queued for tick {due}");
                Vec::new()
            }
            IpcCommand::Load { key } => {
                match load_game(&session.store, &key) {
                    Ok(save) => {
                        log::info!("Loaded '{key}' saved at tick {}", save.tick);
                        session.world = save.world;
                    }
                    Err(e) => {
                        let err_json = serde_json::json!({ "error": e.to_string() });
                        writeln!(stdout, "{}", err_json)?;
                        stdout.flush()?;
                        continue;
                    }
                }
                Vec::new()
            }
        };

        let state = session.ui_state(events)?;
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(session: &Session, events: &[SimEvent], frames: u64) -> Result<()> {
    let scheduler = &session.scheduler;
    let autosaves = existing_autosaves(&session.store)?;
    let refreshes = events
        .iter()
        .filter(|e| matches!(e, SimEvent::UiRefreshRequested { .. }))
        .count();

    println!("=== RUN SUMMARY ===");
    println!("  frames run:     {frames}");
    println!("  final tick:     {}", scheduler.tick_number());
    println!("  speed:          {} / {}", scheduler.speed(), scheduler.max_speed());
    if let Some(calendar) = scheduler.find_unit::<CalendarUnit>() {
        println!("  date:           {}", calendar.date());
    }
    println!("  ui refreshes:   {refreshes}");
    println!("  autosaves:      {}", autosaves.join(", "));

    println!();
    println!("=== PLAYERS ===");
    for player in &session.world.players {
        println!("  {} ({}) | ${:.0}", player.name, player.id, player.money);
    }
    for key in autosaves.iter().take(1) {
        if let Some(saved_at) = session.store.saved_at(key)? {
            println!();
            println!("  latest autosave '{key}' written {saved_at}");
        }
    }
    Ok(())
}

fn demo_world(target_type: &str) -> GameWorld {
    let mut world = GameWorld::new();

    let mut alice = Player::new("player-1", "Alice", 0.0);
    alice.add_content(OwnedContent::new("c-1", target_type, 12.5));
    alice.add_content(OwnedContent::new("c-2", target_type, 7.5));
    alice.add_content(OwnedContent::new("c-3", "house", 0.0));
    alice.add_money(100.0);

    let mut bob = Player::new("player-2", "Bob", 250.0);
    bob.add_content(OwnedContent::new("c-4", target_type, 20.0));

    world.add_player(alice);
    world.add_player(bob);
    world
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
