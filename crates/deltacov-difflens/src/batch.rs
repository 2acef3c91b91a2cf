//! Chunked, parallel classification.

use deltacov_core::{ClassInfo, DeltacovError, Diagnostic};
use rayon::prelude::*;

use crate::classifier::{classify, MaterializedEntry, Outcome};
use crate::filter::SkippedFile;

/// Upper bound on classification threads for one run.
const MAX_WORKERS: usize = 32;

/// Merged results of classifying a list of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    /// Changed classes, in input order.
    pub classes: Vec<ClassInfo>,
    /// Files with nothing coverable.
    pub dropped: Vec<SkippedFile>,
    /// Files that failed to decode or parse.
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchOutput {
    fn push(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Class(class) => self.classes.push(class),
            Outcome::Dropped(skipped) => self.dropped.push(skipped),
            Outcome::Failed(diagnostic) => self.diagnostics.push(diagnostic),
        }
    }
}

/// Classify `entries` in chunks of `chunk_size` on a dedicated thread pool.
///
/// The pool gets one thread per chunk (capped) and is torn down before
/// returning. Chunk results are merged by chunk index, so the output is
/// identical to [`classify_sequential`] for every chunk size.
///
/// # Errors
///
/// Returns [`DeltacovError::Config`] if `chunk_size` is zero, or
/// [`DeltacovError::WorkerPool`] if the pool cannot be started.
///
/// # Examples
///
/// ```
/// use deltacov_difflens::batch::classify_batch;
///
/// let output = classify_batch(&[], 100).unwrap();
/// assert!(output.classes.is_empty());
/// ```
pub fn classify_batch(
    entries: &[MaterializedEntry],
    chunk_size: usize,
) -> Result<BatchOutput, DeltacovError> {
    if chunk_size == 0 {
        return Err(DeltacovError::Config("chunk size must be at least 1".into()));
    }
    if entries.is_empty() {
        return Ok(BatchOutput::default());
    }

    let chunks = entries.len().div_ceil(chunk_size);
    let workers = chunks.min(MAX_WORKERS);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("deltacov-classify-{i}"))
        .build()
        .map_err(|e| DeltacovError::WorkerPool(format!("failed to start classifier pool: {e}")))?;

    tracing::info!(files = entries.len(), chunks, workers, "classifying changed files");

    let per_chunk: Vec<Vec<Outcome>> = pool.install(|| {
        entries
            .par_chunks(chunk_size)
            .map(|chunk| chunk.iter().map(classify).collect())
            .collect()
    });
    drop(pool);

    let mut output = BatchOutput::default();
    for outcome in per_chunk.into_iter().flatten() {
        output.push(outcome);
    }
    Ok(output)
}

/// Classify `entries` one by one on the calling thread.
pub fn classify_sequential(entries: &[MaterializedEntry]) -> BatchOutput {
    let mut output = BatchOutput::default();
    for outcome in entries.iter().map(classify) {
        output.push(outcome);
    }
    output
}
