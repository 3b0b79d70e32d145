//! hackterm - local drift sim.
//!
//! The interactive shell: reads one line, dispatches it through the session,
//! renders the reply, repeats. End-of-input or `quit` ends the process
//! cleanly; nothing is persisted unless the player asks.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use drift_core::render::{render, WIDTH};
use drift_core::{Reply, SaveFile, Session};
use game_world::{PlayerState, World};

#[derive(Debug, Parser)]
#[command(name = "hackterm", about = "hackterm // local drift sim")]
struct Cli {
    /// Save file location.
    #[arg(long, default_value = "save.json")]
    save: PathBuf,

    /// Start fresh with this handle, skipping the load prompt.
    #[arg(long)]
    handle: Option<String>,

    /// Output wrap width.
    #[arg(long, default_value_t = WIDTH)]
    width: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let world = World::load().context("loading world definition")?;
    let save = SaveFile::new(&cli.save);

    let stdin = io::stdin();
    let mut input = stdin.lock().lines();

    show("hackterm // local drift sim", cli.width);
    show("Type help for commands. Type quit to exit.", cli.width);

    let state = start_state(&world, &save, &cli, &mut input)?;
    let mut session = Session::new(&world, state, save);
    print_reply(&session.look(), cli.width);

    loop {
        print!("{}> ", session.location());
        io::stdout().flush()?;

        let Some(line) = input.next() else {
            println!();
            show("Session ended.", cli.width);
            return Ok(());
        };
        let reply = session.handle_line(&line.context("reading input")?);
        print_reply(&reply, cli.width);
        if reply.quit {
            return Ok(());
        }
    }
}

/// Resume from the save file when the player wants it, else start fresh.
fn start_state(
    world: &World,
    save: &SaveFile,
    cli: &Cli,
    input: &mut impl Iterator<Item = io::Result<String>>,
) -> anyhow::Result<PlayerState> {
    if let Some(handle) = &cli.handle {
        return Ok(PlayerState::fresh(handle));
    }

    if save.exists() {
        print!("Load save? (y/N) ");
        io::stdout().flush()?;
        let answer = match input.next() {
            Some(line) => line.context("reading input")?,
            None => String::new(),
        };
        if answer.trim().eq_ignore_ascii_case("y") {
            match save.load() {
                Ok(state) if world.contains(&state.location) => return Ok(state),
                Ok(state) => {
                    warn!(location = %state.location, "save points at an unknown node");
                    show("Failed to load save file, starting fresh.", cli.width);
                }
                Err(err) => {
                    warn!(error = %err, "load failed");
                    show("Failed to load save file, starting fresh.", cli.width);
                }
            }
        }
    }

    print!("HANDLE? ");
    io::stdout().flush()?;
    let handle = match input.next() {
        Some(line) => line.context("reading input")?,
        None => String::new(),
    };
    Ok(PlayerState::fresh(&handle))
}

fn show(text: &str, width: usize) {
    println!("{}", render(text, width));
}

fn print_reply(reply: &Reply, width: usize) {
    for line in &reply.lines {
        println!("{}", render(line, width));
    }
}
