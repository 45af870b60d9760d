// ── RouterOS API sentence codec ──
//
// A sentence is a sequence of length-prefixed words terminated by a
// zero-length word. Lengths use a 1-5 byte prefix whose leading bits
// select the width.

use std::io::{self, Read, Write};

use crate::connector::Row;
use crate::error::Error;

/// Largest word accepted from a device. Real replies stay far below this;
/// anything larger is a corrupt or hostile length prefix.
pub const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Append the length prefix for a word of `len` bytes.
pub fn encode_length(len: usize, out: &mut Vec<u8>) -> Result<(), Error> {
    let n = u32::try_from(len).map_err(|_| Error::Protocol {
        message: format!("word of {len} bytes exceeds the protocol limit"),
    })?;
    let bytes = n.to_be_bytes();

    match n {
        0..0x80 => out.push(bytes[3]),
        0x80..0x4000 => out.extend_from_slice(&(n | 0x8000).to_be_bytes()[2..]),
        0x4000..0x20_0000 => out.extend_from_slice(&(n | 0xC0_0000).to_be_bytes()[1..]),
        0x20_0000..0x1000_0000 => out.extend_from_slice(&(n | 0xE000_0000).to_be_bytes()),
        _ => {
            out.push(0xF0);
            out.extend_from_slice(&bytes);
        }
    }
    Ok(())
}

/// Read one length prefix.
pub fn decode_length<R: Read>(reader: &mut R) -> Result<usize, Error> {
    let first = read_byte(reader)?;

    let (extra, initial) = match first {
        b if b & 0x80 == 0x00 => (0, u32::from(b)),
        b if b & 0xC0 == 0x80 => (1, u32::from(b & 0x3F)),
        b if b & 0xE0 == 0xC0 => (2, u32::from(b & 0x1F)),
        b if b & 0xF0 == 0xE0 => (3, u32::from(b & 0x0F)),
        0xF0 => (4, 0),
        b => {
            return Err(Error::Protocol {
                message: format!("reserved control byte 0x{b:02X} in length prefix"),
            });
        }
    };

    let mut value = initial;
    for _ in 0..extra {
        value = (value << 8) | u32::from(read_byte(reader)?);
    }

    usize::try_from(value).map_err(|_| Error::Protocol {
        message: format!("word length {value} does not fit in memory"),
    })
}

/// Encode a full sentence (words plus the terminating empty word).
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    for word in words {
        let bytes = word.as_ref().as_bytes();
        encode_length(bytes.len(), &mut out)?;
        out.extend_from_slice(bytes);
    }
    out.push(0);
    Ok(out)
}

/// Write a sentence and flush.
pub fn write_sentence<W: Write, S: AsRef<str>>(writer: &mut W, words: &[S]) -> Result<(), Error> {
    let buf = encode_sentence(words)?;
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// Read words up to (not including) the terminating empty word.
pub fn read_sentence<R: Read>(reader: &mut R) -> Result<Vec<String>, Error> {
    let mut words = Vec::new();
    loop {
        let len = decode_length(reader)?;
        if len == 0 {
            return Ok(words);
        }
        if len > MAX_WORD_LEN {
            return Err(Error::Protocol {
                message: format!("word length {len} exceeds the {MAX_WORD_LEN} byte limit"),
            });
        }
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        words.push(String::from_utf8_lossy(&buf).into_owned());
    }
}

fn read_byte<R: Read>(reader: &mut R) -> Result<u8, Error> {
    let mut b = [0u8; 1];
    match reader.read_exact(&mut b) {
        Ok(()) => Ok(b[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::Fatal {
            message: "connection closed by device".into(),
        }),
        Err(e) => Err(Error::Io(e)),
    }
}

// ── Replies ─────────────────────────────────────────────────────────

/// A decoded reply sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `!re`: one data row.
    Re(Row),
    /// `!done`: end of reply, with optional attributes.
    Done(Row),
    /// `!empty`: a print matched no rows. `!done` still follows.
    Empty,
    /// `!trap`: command failed.
    Trap { category: Option<u32>, message: String },
    /// `!fatal`: connection is being closed.
    Fatal(String),
}

/// Interpret a raw sentence as a reply.
pub fn parse_reply(words: &[String]) -> Result<Reply, Error> {
    let Some((kind, rest)) = words.split_first() else {
        return Err(Error::Protocol {
            message: "empty reply sentence".into(),
        });
    };

    match kind.as_str() {
        "!re" => Ok(Reply::Re(attributes(rest))),
        "!done" => Ok(Reply::Done(attributes(rest))),
        "!empty" => Ok(Reply::Empty),
        "!trap" => {
            let attrs = attributes(rest);
            Ok(Reply::Trap {
                category: attrs.get("category").and_then(|c| c.parse().ok()),
                message: attrs.get("message").cloned().unwrap_or_default(),
            })
        }
        // `!fatal` carries its reason as a bare word, not an attribute.
        "!fatal" => Ok(Reply::Fatal(rest.join(" "))),
        other => Err(Error::Protocol {
            message: format!("unexpected reply word '{other}'"),
        }),
    }
}

/// Collect `=key=value` words into a row. Tags and API attributes
/// (`.tag=`) are skipped; `.id` and friends start with `=` and are kept.
fn attributes(words: &[String]) -> Row {
    words
        .iter()
        .filter_map(|w| w.strip_prefix('='))
        .map(|w| match w.split_once('=') {
            Some((k, v)) => (k.to_owned(), v.to_owned()),
            None => (w.to_owned(), String::new()),
        })
        .collect()
}

/// Build an attribute word.
pub fn attribute(key: &str, value: &str) -> String {
    format!("={key}={value}")
}
