//! Work queue and worker pool.
//!
//! One producer task reads lines from an async source and hands them to a
//! fixed number of workers over a shared channel. Workers pull until the
//! channel is closed and drained; the producer closes it by dropping the
//! sender when the source ends.

use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::error::CorsProbeError;

/// Capacity of the handoff channel. One slot keeps the producer at most a
/// single line ahead of the workers.
const QUEUE_CAPACITY: usize = 1;

/// Outcome of a pool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Lines the producer pushed onto the queue
    pub produced: usize,
    /// Items workers took off the queue, summed over all workers
    pub processed: usize,
    /// Workers that exited normally
    pub workers: usize,
}

/// Runs a line-oriented input through a fixed pool of async workers.
#[derive(Debug, Clone)]
pub struct ConcurrentProcessor {
    max_concurrency: usize,
}

impl ConcurrentProcessor {
    /// Create a processor with `max_concurrency` workers (at least one).
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Number of workers this processor spawns.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Feed every line of `input` to `handler`, each line to exactly one worker.
    ///
    /// Returns once the input is exhausted and every worker has exited.
    /// A read error ends the input early; lines read before it are still
    /// processed.
    pub async fn run<R, F, Fut>(&self, input: R, handler: F) -> PoolStats
    where
        R: AsyncRead + Unpin + Send + 'static,
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<String>(QUEUE_CAPACITY);
        let producer = tokio::spawn(produce_lines(input, tx));

        let queue = Arc::new(Mutex::new(rx));
        let handler = Arc::new(handler);

        let workers: Vec<_> = (0..self.max_concurrency)
            .map(|id| {
                let queue = Arc::clone(&queue);
                let handler = Arc::clone(&handler);
                tokio::spawn(worker_loop(id, queue, handler))
            })
            .collect();

        let mut stats = PoolStats::default();

        for joined in join_all(workers).await {
            match joined {
                Ok(processed) => {
                    stats.processed += processed;
                    stats.workers += 1;
                }
                Err(e) => {
                    let err = CorsProbeError::internal(format!("worker task failed: {}", e));
                    error!("{}", err);
                }
            }
        }

        match producer.await {
            Ok(produced) => stats.produced = produced,
            Err(e) => {
                let err = CorsProbeError::internal(format!("input task failed: {}", e));
                error!("{}", err);
            }
        }

        stats
    }
}

/// Push each line of `input` onto the queue, then close it.
///
/// Lines are split on `\n` with a trailing `\r` removed. Bytes that are not
/// valid UTF-8 are replaced rather than ending the input.
///
/// Returns the number of lines pushed.
async fn produce_lines<R>(input: R, tx: mpsc::Sender<String>) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(input).split(b'\n');
    let mut produced = 0;

    loop {
        match segments.next_segment().await {
            Ok(Some(mut raw)) => {
                if raw.last() == Some(&b'\r') {
                    raw.pop();
                }
                let line = match String::from_utf8(raw) {
                    Ok(line) => line,
                    Err(e) => {
                        debug!(line = produced + 1, "input line is not valid UTF-8");
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                if tx.send(line).await.is_err() {
                    // Every worker is gone; nothing left to feed.
                    break;
                }
                produced += 1;
            }
            Ok(None) => break,
            Err(e) => {
                warn!("error while scanning input: {}", e);
                break;
            }
        }
    }

    debug!(lines = produced, "input exhausted, closing queue");
    produced
}

async fn worker_loop<F, Fut>(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    handler: Arc<F>,
) -> usize
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut processed = 0;

    loop {
        // The lock is released before the handler runs.
        let next = queue.lock().await.recv().await;
        let Some(line) = next else {
            break;
        };
        handler(line).await;
        processed += 1;
    }

    debug!(worker = id, processed, "worker finished");
    processed
}
