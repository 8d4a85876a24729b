//! # driftkv-server — TCP front end
//!
//! Serves the DriftKV store over the RESP-style wire protocol: one thread
//! per connection, each buffering reads until a full request frame decodes,
//! then executing it against the shared engine and writing the reply.
//!
//! ## Configuration
//!
//! ```text
//! DRIFT_ADDR          bind address            (default: "127.0.0.1")
//! DRIFT_PORT          bind port               (default: 9001)
//! DRIFT_DATA_DIR      SSTable directory       (default: "data")
//! DRIFT_MEMTABLE_KB   rotation threshold KiB  (default: 32768 = 32 MiB)
//! DRIFT_SSTABLE_LIMIT compaction threshold    (default: 100)
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p server
//! $ printf '*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$5\r\nAlice\r\n' | nc 127.0.0.1 9001
//! +OK
//! ```

use anyhow::Result;
use engine::{LsmTree, Options};
use memtable::Lookup;
use resp::{decode, encode, Command, DecodeError};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

const READ_CHUNK: usize = 4 * 1024;

/// A buffer that outgrows this without decoding is dropped; it bounds the
/// per-connection memory a misbehaving client can pin.
const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    env_logger::init();

    let addr = env_or("DRIFT_ADDR", "127.0.0.1");
    let port: u16 = env_or("DRIFT_PORT", "9001").parse().unwrap_or(9001);
    let data_dir = env_or("DRIFT_DATA_DIR", "data");
    let memtable_kb: usize = env_or("DRIFT_MEMTABLE_KB", "32768")
        .parse()
        .unwrap_or(32 * 1024);
    let sstable_limit: usize = env_or("DRIFT_SSTABLE_LIMIT", "100").parse().unwrap_or(100);

    let store = Arc::new(LsmTree::open_with(
        &data_dir,
        Options {
            memtable_max_bytes: memtable_kb * 1024,
            sstable_compaction_threshold: sstable_limit,
        },
    )?);

    let listener = TcpListener::bind((addr.as_str(), port))?;
    log::info!("listening on {}", listener.local_addr()?);

    serve(listener, store)
}

/// Accept loop: one handler thread per connection.
fn serve(listener: TcpListener, store: Arc<LsmTree>) -> Result<()> {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let store = Arc::clone(&store);
                thread::Builder::new()
                    .name("driftkv-conn".into())
                    .spawn(move || {
                        let peer = stream
                            .peer_addr()
                            .map(|a| a.to_string())
                            .unwrap_or_else(|_| "unknown".into());
                        if let Err(e) = handle_client(stream, &store) {
                            log::warn!("connection from {} ended: {:#}", peer, e);
                        }
                    })?;
            }
            Err(e) => log::warn!("accept failed: {}", e),
        }
    }
    Ok(())
}

/// Per-connection loop: buffer, decode, execute, reply.
///
/// `Incomplete` keeps the buffer and reads on; any other decode error gets
/// an `-ERR` reply and resets the buffer, leaving the connection usable.
fn handle_client(mut stream: TcpStream, store: &LsmTree) -> Result<()> {
    let mut buffer: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..n]);

        match decode(&buffer) {
            Ok(command) => {
                let reply = execute(store, command);
                stream.write_all(&reply)?;
                buffer.clear();
            }
            Err(DecodeError::Incomplete) => {
                if buffer.len() > MAX_REQUEST_BYTES {
                    stream.write_all(&encode::error("request too large"))?;
                    return Ok(());
                }
            }
            Err(e) => {
                log::debug!("rejecting malformed request: {}", e);
                stream.write_all(&encode::error(&e.to_string()))?;
                buffer.clear();
            }
        }
    }
}

/// Runs one decoded command against the store and encodes the reply.
fn execute(store: &LsmTree, command: Command) -> Vec<u8> {
    let key = match &command {
        Command::Set { key, .. } | Command::Get { key } | Command::Del { key } => key,
    };
    if key.is_empty() {
        return encode::error("invalid key");
    }

    match command {
        Command::Set { key, value } => {
            store.put(key, value);
            encode::simple_string("OK")
        }
        Command::Get { key } => match store.get(&key) {
            Lookup::Found(value) => encode::bulk_string(Some(&value)),
            Lookup::Deleted | Lookup::Absent => encode::bulk_string(None),
        },
        Command::Del { key } => {
            store.remove(key);
            encode::integer(1)
        }
    }
}
