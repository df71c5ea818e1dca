use tracing::info;

/// Receives a label before each pipeline stage and a final completion call.
pub trait Progress: Send + Sync {
    fn describe(&self, label: &str);

    fn finish(&self);
}

/// Reports stages as `info` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn describe(&self, label: &str) {
        info!(stage = label, "reconciliation stage started");
    }

    fn finish(&self) {
        info!("reconciliation finished");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn describe(&self, _label: &str) {}

    fn finish(&self) {}
}
