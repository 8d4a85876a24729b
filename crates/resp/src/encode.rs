//! Response encoders. Each returns the exact bytes to put on the wire.

/// `+<s>\r\n` — e.g. the `OK` acknowledgement.
pub fn simple_string(s: &str) -> Vec<u8> {
    format!("+{}\r\n", s).into_bytes()
}

/// `-ERR <msg>\r\n`.
pub fn error(msg: &str) -> Vec<u8> {
    format!("-ERR {}\r\n", msg).into_bytes()
}

/// `:<value>\r\n`.
pub fn integer(value: i64) -> Vec<u8> {
    format!(":{}\r\n", value).into_bytes()
}

/// `$<len>\r\n<bytes>\r\n`, or the null bulk string `$-1\r\n` for `None`.
pub fn bulk_string(data: Option<&[u8]>) -> Vec<u8> {
    match data {
        None => b"$-1\r\n".to_vec(),
        Some(data) => {
            let mut out = format!("${}\r\n", data.len()).into_bytes();
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
            out
        }
    }
}
