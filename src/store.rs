use crate::{matcher::MatchResult, Error, Result};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

/// Key used for lines where a destination port was found but no source address.
pub const UNKNOWN_IP: &str = "unknown";

/// Activity seen from one source address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpRecord {
    pub request_count: u64,
    pub port_counts: HashMap<String, u64>,
}

impl IpRecord {
    fn hit(&mut self, port: &str) {
        self.request_count += 1;
        *self.port_counts.entry(port.to_owned()).or_default() += 1;
    }
}

/// Aggregated counts shared by every scanner. Uses `Arc` internally to be cheaply cloneable.
///
/// A single lock covers the whole map, so every `record_hit` is atomic with respect to the others.
#[derive(Clone)]
pub struct Store {
    records: Arc<Mutex<HashMap<String, IpRecord>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Construct an empty store. The `unknown` record is created here so port-only lines always have a home.
    pub fn new() -> Self {
        let mut records = HashMap::new();
        records.insert(UNKNOWN_IP.to_owned(), IpRecord::default());
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, IpRecord>>> {
        self.records.lock().map_err(|_| Error::Poisoned)
    }

    /// Fold one matched line into the counts.
    ///
    /// With both fields the address's request count and port tally go up by one, creating the
    /// record on first sighting. With only a port the `unknown` record's port tally goes up, its
    /// request count does not. With neither this does nothing.
    pub fn record_hit(&self, hit: &MatchResult) -> Result<()> {
        match (&hit.ip, &hit.port) {
            (Some(ip), Some(port)) => {
                self.lock()?.entry(ip.clone()).or_default().hit(port);
            }
            (None, Some(port)) => {
                let mut records = self.lock()?;
                let unknown = records.entry(UNKNOWN_IP.to_owned()).or_default();
                *unknown.port_counts.entry(port.clone()).or_default() += 1;
            }
            _ => {}
        }
        Ok(())
    }

    /// Copy out the current records.
    pub fn snapshot(&self) -> Result<HashMap<String, IpRecord>> {
        Ok(self.lock()?.clone())
    }

    /// Take the records out of the store, falling back to a copy if another handle is still alive.
    pub fn into_records(self) -> Result<HashMap<String, IpRecord>> {
        match Arc::try_unwrap(self.records) {
            Ok(mutex) => mutex.into_inner().map_err(|_| Error::Poisoned),
            Err(records) => Self { records }.snapshot(),
        }
    }
}
