//! # RESP — request/response wire codec
//!
//! The framing DriftKV speaks on the wire: a request is an array of bulk
//! strings, a response is a simple string, error, integer, or bulk string.
//!
//! ## Request format
//!
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<operation>\r\n
//! $<len>\r\n<key>\r\n
//! [$<len>\r\n<value>\r\n]          (SET only)
//! ```
//!
//! Three operations exist: `SET key value`, `GET key`, `DEL key`.
//!
//! ## Example
//!
//! ```rust
//! use resp::{decode, encode, Command};
//!
//! let cmd = decode(b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$5\r\nAlice\r\n").unwrap();
//! assert!(matches!(cmd, Command::Set { .. }));
//!
//! let reply = encode::simple_string("OK");
//! assert_eq!(reply, b"+OK\r\n");
//! ```
//!
//! [`decode`] distinguishes a buffer that ends mid-frame
//! ([`DecodeError::Incomplete`] — keep reading) from a malformed one (reply
//! with an error and reset), which is what a buffering network front end
//! needs.

mod decoder;
pub mod encode;

pub use decoder::{decode, Command, DecodeError};
