//! # driftkv-cli — interactive shell
//!
//! A REPL over the DriftKV storage engine. Reads commands from stdin,
//! executes them against the engine, and prints results to stdout. Works
//! interactively or scripted (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! SET key value      Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Delete a key (writes a tombstone)
//! FLUSH              Seal the active memtable for flushing
//! STATS              Print engine debug info
//! HELP               Show the command list
//! CLEAR              Clear the screen
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! ```text
//! DRIFT_DATA_DIR      SSTable directory       (default: "data")
//! DRIFT_MEMTABLE_KB   rotation threshold KiB  (default: 32768 = 32 MiB)
//! DRIFT_SSTABLE_LIMIT compaction threshold    (default: 100)
//! ```

mod command;

use anyhow::Result;
use command::ShellCommand;
use engine::{LsmTree, Options};
use memtable::Lookup;
use std::io::{self, BufRead, Write};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

fn help() -> &'static str {
    "Available commands:\n\
     SET <key> <value> - Set key to hold the string value\n\
     GET <key>         - Get the value of key\n\
     DEL <key>         - Delete a key\n\
     FLUSH             - Seal the active memtable for flushing\n\
     STATS             - Print engine debug info\n\
     HELP              - Show this help menu\n\
     CLEAR             - Clear the screen\n\
     EXIT              - Exit the program"
}

fn main() -> Result<()> {
    env_logger::init();

    let data_dir = env_or("DRIFT_DATA_DIR", "data");
    let memtable_kb: usize = env_or("DRIFT_MEMTABLE_KB", "32768")
        .parse()
        .unwrap_or(32 * 1024);
    let sstable_limit: usize = env_or("DRIFT_SSTABLE_LIMIT", "100").parse().unwrap_or(100);

    let store = LsmTree::open_with(
        &data_dir,
        Options {
            memtable_max_bytes: memtable_kb * 1024,
            sstable_compaction_threshold: sstable_limit,
        },
    )?;

    print!("{}", CLEAR_SCREEN);
    println!(
        "DriftKV started (dir={}, memtable={}KiB, sstable_limit={})",
        data_dir, memtable_kb, sstable_limit
    );
    println!("Commands: SET key value | GET key | DEL key | FLUSH | STATS | HELP | CLEAR | EXIT");
    print!("driftkv> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match command::parse(&line) {
            Ok(None) => {}
            Ok(Some(cmd)) => {
                if run(&store, cmd) {
                    break;
                }
            }
            Err(msg) => println!("ERR {}", msg),
        }
        print!("driftkv> ");
        io::stdout().flush().ok();
    }

    Ok(())
}

/// Executes one command; returns `true` when the shell should exit.
fn run(store: &LsmTree, cmd: ShellCommand) -> bool {
    match cmd {
        ShellCommand::Set { key, value } => {
            store.put(key.into_bytes(), value.into_bytes());
            println!("OK");
        }
        ShellCommand::Get { key } => match store.get(key.as_bytes()) {
            Lookup::Found(value) => println!("{}", String::from_utf8_lossy(&value)),
            Lookup::Deleted | Lookup::Absent => println!("(nil)"),
        },
        ShellCommand::Del { key } => match store.get(key.as_bytes()) {
            Lookup::Found(_) => {
                store.remove(key.into_bytes());
                println!("(integer) 1");
            }
            Lookup::Deleted | Lookup::Absent => {
                println!("key \"{}\" not found", key);
            }
        },
        ShellCommand::Flush => {
            store.flush();
            println!("OK ({} tables, {} pending)", store.sstable_count(), store.pending_flushes());
        }
        ShellCommand::Stats => println!("{:?}", store),
        ShellCommand::Help => println!("{}", help()),
        ShellCommand::Clear => {
            print!("{}", CLEAR_SCREEN);
            io::stdout().flush().ok();
        }
        ShellCommand::Exit => {
            println!("bye");
            return true;
        }
    }
    false
}
