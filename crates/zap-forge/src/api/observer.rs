/// Notification emitted while an export runs. Fire-and-forget: observers
/// cannot influence the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    /// Human-readable phase message ("Scanning document", ...).
    Status(String),
    /// One GameObject of `level` finished building.
    Progress { level: String, done: usize, total: usize },
    /// A structural warning, forwarded as soon as its object completes.
    Warning(String),
    /// The run failed; no document will be produced.
    Error(String),
}

impl ExportEvent {
    /// Short discriminator used by hosts that receive events as plain values.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportEvent::Status(_) => "status",
            ExportEvent::Progress { .. } => "progress",
            ExportEvent::Warning(_) => "warning",
            ExportEvent::Error(_) => "error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ExportEvent::Status(msg) | ExportEvent::Warning(msg) | ExportEvent::Error(msg) => {
                msg.clone()
            }
            ExportEvent::Progress { level, done, total } => {
                format!("{}: {}/{}", level, done, total)
            }
        }
    }
}

/// Receiver of [`ExportEvent`]s. Also the per-object yield point: hosts
/// that must stay responsive can do their bookkeeping in `on_event`.
pub trait ExportObserver {
    fn on_event(&mut self, event: &ExportEvent);
}

impl<F: FnMut(&ExportEvent)> ExportObserver for F {
    fn on_event(&mut self, event: &ExportEvent) {
        self(event)
    }
}

/// Ignores everything.
impl ExportObserver for () {
    fn on_event(&mut self, _event: &ExportEvent) {}
}
