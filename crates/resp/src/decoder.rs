use thiserror::Error;

/// A fully parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Associate `key` with `value`.
    Set { key: Vec<u8>, value: Vec<u8> },
    /// Look up `key`.
    Get { key: Vec<u8> },
    /// Delete `key`.
    Del { key: Vec<u8> },
}

/// Why a buffer failed to decode.
///
/// `Incomplete` is recoverable: the frame is cut off and more bytes may
/// still arrive. Every other variant means the bytes received so far can
/// never become a valid request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ends mid-frame; read more and retry.
    #[error("incomplete request")]
    Incomplete,
    #[error("missing array marker")]
    MissingArrayMarker,
    #[error("invalid argument count")]
    BadArgumentCount,
    #[error("unexpected argument count")]
    UnexpectedArgumentCount,
    #[error("missing {0} string marker")]
    MissingStringMarker(&'static str),
    #[error("invalid {0} length")]
    BadLength(&'static str),
    #[error("malformed {0}")]
    Malformed(&'static str),
    #[error("unknown operation")]
    UnknownOperation,
    #[error("SET requires a value")]
    MissingValue,
    #[error("too many arguments")]
    TooManyArguments,
    #[error("extra data after command")]
    TrailingBytes,
}

/// Decodes one request frame from `buf`.
///
/// The whole frame must be consumed: trailing bytes beyond a single optional
/// `\r\n` are rejected, so callers hand over exactly one request at a time.
pub fn decode(buf: &[u8]) -> Result<Command, DecodeError> {
    let mut input = buf;

    match input.first() {
        None => return Err(DecodeError::Incomplete),
        Some(&b'*') => input = &input[1..],
        Some(_) => return Err(DecodeError::MissingArrayMarker),
    }

    let header = read_line(&mut input)?;
    let argc: i64 = parse_int(header).ok_or(DecodeError::BadArgumentCount)?;
    if !(2..=3).contains(&argc) {
        return Err(DecodeError::UnexpectedArgumentCount);
    }

    let operation = read_bulk(&mut input, "operation")?;
    let key = read_bulk(&mut input, "key")?;

    let command = match operation.as_slice() {
        b"SET" => {
            if argc != 3 {
                return Err(DecodeError::MissingValue);
            }
            let value = read_bulk(&mut input, "value")?;
            Command::Set { key, value }
        }
        b"GET" | b"DEL" => {
            if argc > 2 {
                return Err(DecodeError::TooManyArguments);
            }
            if operation[0] == b'G' {
                Command::Get { key }
            } else {
                Command::Del { key }
            }
        }
        _ => return Err(DecodeError::UnknownOperation),
    };

    if !input.is_empty() && input != b"\r\n" {
        return Err(DecodeError::TrailingBytes);
    }

    Ok(command)
}

/// Consumes up to the next CRLF. No CRLF yet means the frame is cut off.
fn read_line<'a>(input: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    match input.windows(2).position(|w| w == b"\r\n") {
        Some(pos) => {
            let line = &input[..pos];
            *input = &input[pos + 2..];
            Ok(line)
        }
        None => Err(DecodeError::Incomplete),
    }
}

/// Consumes one `$<len>\r\n<bytes>\r\n` bulk string.
fn read_bulk(input: &mut &[u8], what: &'static str) -> Result<Vec<u8>, DecodeError> {
    match input.first() {
        None => return Err(DecodeError::Incomplete),
        Some(&b'$') => *input = &input[1..],
        Some(_) => return Err(DecodeError::MissingStringMarker(what)),
    }

    let len_line = read_line(input)?;
    let len: usize = parse_int(len_line)
        .filter(|n| *n >= 0)
        .map(|n| n as usize)
        .ok_or(DecodeError::BadLength(what))?;

    if input.len() < len + 2 {
        return Err(DecodeError::Incomplete);
    }
    let (payload, rest) = input.split_at(len);
    if &rest[..2] != b"\r\n" {
        return Err(DecodeError::Malformed(what));
    }
    let data = payload.to_vec();
    *input = &rest[2..];
    Ok(data)
}

fn parse_int(line: &[u8]) -> Option<i64> {
    std::str::from_utf8(line).ok()?.parse().ok()
}
