/*!
 * Background reconciliation worker
 *
 * One thread owns the StoreSystem and runs passes in request order. Every
 * request gets a generation number; callers only ever see the result of the
 * newest request, so a slow pass over an old store root can never overwrite
 * a newer view.
 */

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use modelvault_core_interface::StoreSystem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

use super::reconcile::{reconcile, ReconcileOptions};
use super::report::ReconcileReport;
use crate::error::{Result, VaultError};

struct Request {
    generation: u64,
    root: PathBuf,
    options: ReconcileOptions,
}

/// Outcome of one pass, tagged with the request it answers
#[derive(Debug)]
pub struct WorkerResult {
    pub generation: u64,
    pub root: PathBuf,
    pub outcome: Result<ReconcileReport>,
}

pub struct ReconcileWorker {
    requests: Option<Sender<Request>>,
    results: Receiver<WorkerResult>,
    latest: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl ReconcileWorker {
    /// Start the worker thread
    pub fn spawn<S: StoreSystem>(system: S) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<Request>();
        let (result_tx, result_rx) = unbounded::<WorkerResult>();
        let latest = Arc::new(AtomicU64::new(0));
        let worker_latest = Arc::clone(&latest);

        let handle = thread::Builder::new()
            .name("modelvault-reconcile".to_string())
            .spawn(move || {
                for request in request_rx.iter() {
                    // Skip anything superseded while it sat in the queue
                    if request.generation < worker_latest.load(Ordering::Acquire) {
                        debug!("Skipping stale request {}", request.generation);
                        continue;
                    }
                    let outcome = reconcile(&system, &request.root, &request.options);
                    let result = WorkerResult {
                        generation: request.generation,
                        root: request.root,
                        outcome,
                    };
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| VaultError::Worker(format!("failed to spawn worker: {}", e)))?;

        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
            latest,
            handle: Some(handle),
        })
    }

    /// Queue a pass and return its generation
    pub fn request(&self, root: &Path, options: ReconcileOptions) -> Result<u64> {
        let sender = self
            .requests
            .as_ref()
            .ok_or_else(|| VaultError::Worker("worker is shut down".to_string()))?;
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        sender
            .send(Request {
                generation,
                root: root.to_path_buf(),
                options,
            })
            .map_err(|_| VaultError::Worker("worker thread has stopped".to_string()))?;
        Ok(generation)
    }

    /// Generation of the most recent request (0 before the first)
    pub fn current_generation(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// Non-blocking: the newest result if it has arrived
    ///
    /// Results for older generations are drained and dropped.
    pub fn latest(&self) -> Option<WorkerResult> {
        let mut newest = None;
        while let Ok(result) = self.results.try_recv() {
            if result.generation == self.current_generation() {
                newest = Some(result);
            } else {
                debug!("Discarding stale result {}", result.generation);
            }
        }
        newest
    }

    /// Block until the result for the newest request arrives
    ///
    /// Returns `Ok(None)` on timeout.
    pub fn recv_latest(&self, timeout: Duration) -> Result<Option<WorkerResult>> {
        if self.current_generation() == 0 {
            return Err(VaultError::Worker("no reconciliation requested".to_string()));
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(result) if result.generation == self.current_generation() => {
                    return Ok(Some(result))
                }
                Ok(result) => debug!("Discarding stale result {}", result.generation),
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(VaultError::Worker("worker thread has stopped".to_string()))
                }
            }
        }
    }

    /// Stop accepting requests and wait for the thread to finish
    pub fn shutdown(&mut self) -> Result<()> {
        self.requests.take();
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| VaultError::Worker("worker thread panicked".to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for ReconcileWorker {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    const WAIT: Duration = Duration::from_secs(10);

    fn store(system: &MockSystem, root: &str, blob_name: &str) {
        system.add_dir(Path::new(root).join("manifests"));
        system.add_file(Path::new(root).join("blobs").join(blob_name), b"data");
    }

    #[test]
    fn test_single_request() {
        let system = MockSystem::new();
        store(&system, "/a", "junk");
        let worker = ReconcileWorker::spawn(system).unwrap();

        let generation = worker.request(Path::new("/a"), ReconcileOptions::default()).unwrap();
        let result = worker.recv_latest(WAIT).unwrap().unwrap();
        assert_eq!(result.generation, generation);
        assert_eq!(result.outcome.unwrap().orphaned.len(), 1);
    }

    #[test]
    fn test_only_newest_result_returned() {
        let system = MockSystem::new();
        store(&system, "/old", "old-file");
        store(&system, "/new", "new-file");
        let worker = ReconcileWorker::spawn(system).unwrap();

        worker.request(Path::new("/old"), ReconcileOptions::default()).unwrap();
        worker.request(Path::new("/old"), ReconcileOptions::default()).unwrap();
        let newest = worker.request(Path::new("/new"), ReconcileOptions::default()).unwrap();
        assert_eq!(newest, 3);

        let result = worker.recv_latest(WAIT).unwrap().unwrap();
        assert_eq!(result.generation, newest);
        assert_eq!(result.root, PathBuf::from("/new"));
        assert!(worker.latest().is_none());
    }

    #[test]
    fn test_errors_are_delivered() {
        let worker = ReconcileWorker::spawn(MockSystem::new()).unwrap();
        worker.request(Path::new("/absent"), ReconcileOptions::default()).unwrap();
        let result = worker.recv_latest(WAIT).unwrap().unwrap();
        assert!(matches!(
            result.outcome,
            Err(VaultError::StoreRootUnavailable { .. })
        ));
    }

    #[test]
    fn test_recv_without_request() {
        let worker = ReconcileWorker::spawn(MockSystem::new()).unwrap();
        assert_eq!(worker.current_generation(), 0);
        assert!(matches!(
            worker.recv_latest(Duration::from_millis(10)),
            Err(VaultError::Worker(_))
        ));
    }

    #[test]
    fn test_request_after_shutdown() {
        let mut worker = ReconcileWorker::spawn(MockSystem::new()).unwrap();
        worker.shutdown().unwrap();
        assert!(worker.request(Path::new("/a"), ReconcileOptions::default()).is_err());
    }
}
