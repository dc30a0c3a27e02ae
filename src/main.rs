//! DRAW4! - authoritative UNO-style card game over plain TCP
//!
//! One binary, two modes:
//! - `draw4 serve [port]` hosts a game (lobby, then one session)
//! - `draw4 join <addr>` joins a game as a console player

mod console;
mod game;
mod lobby;
mod network;

use std::env;
use std::io;

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("serve") => {
            // Server console carries the lifecycle log
            init_logger(log::LevelFilter::Info);
            let port = match args.get(2) {
                Some(p) => p.parse().map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("invalid port: {}", p))
                })?,
                None => network::DEFAULT_PORT,
            };
            lobby::run(port)
        }
        Some("join") if args.len() >= 3 => {
            // Keep the play surface clean; only warnings get through
            init_logger(log::LevelFilter::Warn);
            console::run(&args[2])
        }
        _ => {
            eprintln!("usage: draw4 serve [port]");
            eprintln!("       draw4 join <addr[:port]>");
            Ok(())
        }
    }
}

fn init_logger(level: log::LevelFilter) {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let _ = simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
}
