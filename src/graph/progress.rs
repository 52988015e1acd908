/// One progress observation: outer row `index` of `total` has finished.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
    pub ratio: f64,
}

impl Progress {
    pub fn new(index: usize, total: usize) -> Self {
        let ratio = if total == 0 { 1.0 } else { index as f64 / total as f64 };
        Self { index, total, ratio }
    }
}

/// Receives progress observations from scan workers.
///
/// Called concurrently from every worker thread, in row completion order. The return
/// value is ignored, and nothing an observer does changes the scan.
pub trait ProgressObserver: Sync {
    fn observe(&self, progress: Progress);
}

impl<F> ProgressObserver for F
where
    F: Fn(Progress) + Sync,
{
    fn observe(&self, progress: Progress) { self(progress) }
}

/// Discards every observation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn observe(&self, _: Progress) {}
}

/// Logs observations through `tracing`: about one `info` event per percent of rows,
/// `trace` for the rest.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn observe(&self, progress: Progress) {
        let step = (progress.total / 100).max(1);
        if progress.index % step == 0 {
            tracing::info!(
                index = progress.index,
                total = progress.total,
                percent = progress.ratio * 100.0,
                "scan progress"
            );
        } else {
            tracing::trace!(index = progress.index, total = progress.total, "row finished");
        }
    }
}
