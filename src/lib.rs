pub mod matcher;
pub mod report;
pub mod scanner;
pub mod store;

use log::{debug, info};
use scanner::ScanStats;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use store::Store;
use thiserror::Error;

pub use report::Report;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to read {name}: {source}")]
    Read { name: String, source: io::Error },
    #[error("aggregate store lock poisoned by a panicking scanner")]
    Poisoned,
    #[error("scanner task for {name} failed: {source}")]
    Join { name: String, source: tokio::task::JoinError },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Open every path before any scanning starts, so a missing file stops the run before any work is done.
pub fn open_inputs(paths: &[impl AsRef<Path>]) -> Result<Vec<(String, BufReader<File>)>> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let file = File::open(path).map_err(|source| Error::Open {
                path: path.to_owned(),
                source,
            })?;
            Ok((path.display().to_string(), BufReader::new(file)))
        })
        .collect()
}

/// Scan every input on its own blocking task, all sharing one store, and wait for all of them.
///
/// The store is only handed back once every scanner has finished, so it is stable from then on.
/// Any scanner failing fails the whole run.
pub async fn scan_inputs<R>(inputs: Vec<(String, R)>) -> Result<Store>
where
    R: BufRead + Send + 'static,
{
    let store = Store::new();
    // Each input gets its own task, handles to which will be collected here with their name
    let mut join_handles = Vec::with_capacity(inputs.len());
    for (name, reader) in inputs {
        let store = store.clone();
        info!("Spawning scanner for {}", name);
        let task_name = name.clone();
        let join_handle = tokio::task::spawn_blocking(move || scanner::scan_stream(&task_name, reader, &store));
        join_handles.push((name, join_handle));
    }

    let mut total = ScanStats::default();
    for (name, join_handle) in join_handles {
        let stats = join_handle.await.map_err(|source| Error::Join {
            name: name.clone(),
            source,
        })??;
        info!("Finished {}: {} lines, {} hits", name, stats.lines, stats.hits);
        total.lines += stats.lines;
        total.hits += stats.hits;
        total.port_only += stats.port_only;
    }
    debug!(
        "All scanners done: {} lines, {} hits, {} port-only",
        total.lines, total.hits, total.port_only
    );
    Ok(store)
}

/// Open and scan the given log files, then reduce the result to a report.
pub async fn scan_files(paths: &[impl AsRef<Path>], min_requests: u64) -> Result<Report> {
    let inputs = open_inputs(paths)?;
    let store = scan_inputs(inputs).await?;
    Ok(Report::from_records(&store.into_records()?, min_requests))
}
