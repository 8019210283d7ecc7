//! Reader for JSON-lines event logs.
//!
//! Each non-empty line is one [`EventRecord`]. Lines starting with `#` are comments.
//! Logs can hold millions of events, so the reader streams them.

use super::schema::EventRecord;
use crate::utils::error::EventError;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Streaming iterator over the records of an event log
///
/// **Public** - used by the replay command
pub struct EventLogReader<R: BufRead> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: BufRead> EventLogReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// 1-based number of the last line read
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl EventLogReader<BufReader<File>> {
    /// Open an event log file for streaming
    ///
    /// # Errors
    /// * `EventError::IoError` - If the file cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        debug!("Opening event log: {}", path.display());
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for EventLogReader<R> {
    type Item = Result<EventRecord, EventError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(EventError::IoError(e))),
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return Some(parse_event_line(trimmed, self.line_number));
        }
    }
}

/// Parse one log line
///
/// **Public** - useful for tests and for hosts that ship events one at a time
///
/// # Errors
/// * `EventError::InvalidRecord` - The line is not a valid event record
pub fn parse_event_line(line: &str, line_number: usize) -> Result<EventRecord, EventError> {
    serde_json::from_str(line).map_err(|e| EventError::InvalidRecord {
        line: line_number,
        reason: e.to_string(),
    })
}

/// Read a whole event log into memory
///
/// # Arguments
/// * `path` - Path to the JSON-lines log
///
/// # Returns
/// All records, in file order
///
/// # Errors
/// * `EventError::IoError` - File read error
/// * `EventError::InvalidRecord` - First malformed line
pub fn read_event_log(path: impl AsRef<Path>) -> Result<Vec<EventRecord>, EventError> {
    let records = EventLogReader::open(path)?.collect::<Result<Vec<_>, _>>()?;
    debug!("Read {} events", records.len());
    Ok(records)
}
