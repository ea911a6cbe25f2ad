use crate::{matcher::match_line, store::Store, Error, Result};
use log::debug;
use std::io::BufRead;

/// Line counters for one scanned input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines: u64,
    /// Lines with both a source address and a destination port
    pub hits: u64,
    /// Lines with a destination port but no source address
    pub port_only: u64,
}

/// Read `reader` to the end, recording every matched line into `store`.
///
/// Lines are handled strictly in stream order. The store lock is only taken per line, never while reading.
pub fn scan_stream(name: &str, mut reader: impl BufRead, store: &Store) -> Result<ScanStats> {
    let mut stats = ScanStats::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|source| Error::Read {
            name: name.to_owned(),
            source,
        })?;
        if read == 0 {
            break;
        }
        stats.lines += 1;
        let line = String::from_utf8_lossy(&buf);
        let hit = match_line(&line);
        match (&hit.ip, &hit.port) {
            (Some(_), Some(_)) => stats.hits += 1,
            (None, Some(_)) => stats.port_only += 1,
            _ => continue,
        }
        store.record_hit(&hit)?;
    }
    debug!(
        "{}: {} lines, {} hits, {} port-only",
        name, stats.lines, stats.hits, stats.port_only
    );
    Ok(stats)
}
