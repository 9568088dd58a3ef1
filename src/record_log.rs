use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use crate::error::CounterError;

// Unix millis as 19 zero-padded digits plus '\n'.
// Every entry in a log has exactly this many bytes.
pub const DIGITS: usize = 19;
pub const ENTRY_LEN: usize = DIGITS + 1;

pub fn encode(ts: DateTime<Utc>) -> Result<[u8; ENTRY_LEN], CounterError> {
    let millis = ts.timestamp_millis();
    if millis < 0 {
        return Err(CounterError::InvalidTimestamp(ts.to_rfc3339()));
    }

    let text = format!("{:0width$}\n", millis, width = DIGITS);
    let mut entry = [0u8; ENTRY_LEN];
    entry.copy_from_slice(text.as_bytes());
    Ok(entry)
}

// `offset` is only used to say where the bad entry sits.
pub fn decode(bytes: &[u8], offset: u64) -> Result<DateTime<Utc>, CounterError> {
    let bad = |reason: &str| CounterError::Decode {
        offset,
        reason: reason.to_string(),
    };

    if bytes.len() != ENTRY_LEN {
        return Err(bad("wrong entry length"));
    }
    let (digits, terminator) = bytes.split_at(DIGITS);
    if terminator != b"\n" {
        return Err(bad("missing entry terminator"));
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(bad("non-digit byte in timestamp"));
    }

    // all ASCII digits, so utf8 cannot fail; parse can still overflow i64
    let millis: i64 = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| bad("timestamp out of range"))?;

    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| bad("timestamp out of range"))
}

// Append-only file of fixed-width timestamp entries. Never truncated.
#[derive(Debug)]
pub struct RecordLog {
    path: PathBuf,
    file: File,
}

impl RecordLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CounterError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .map_err(CounterError::io("log open"))?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    // Writes land at the end of the file whatever the read cursor says.
    pub fn append(&mut self, ts: DateTime<Utc>) -> Result<usize, CounterError> {
        let entry = encode(ts)?;
        self.file
            .write_all(&entry)
            .map_err(CounterError::io("log append"))?;
        Ok(entry.len())
    }

    pub fn len(&self) -> Result<u64, CounterError> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(CounterError::io("log stat"))
    }

    pub fn is_empty(&self) -> Result<bool, CounterError> {
        Ok(self.len()? == 0)
    }

    pub fn read_entry_at(&mut self, pos: u64) -> Result<DateTime<Utc>, CounterError> {
        self.file
            .seek(SeekFrom::Start(pos))
            .map_err(CounterError::io("log seek"))?;

        let mut buf = [0u8; ENTRY_LEN];
        self.file
            .read_exact(&mut buf)
            .map_err(CounterError::io("log read"))?;

        decode(&buf, pos)
    }

    pub fn sync(&self) -> Result<(), CounterError> {
        self.file.sync_all().map_err(CounterError::io("log sync"))
    }
}
