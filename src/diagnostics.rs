/// Best-effort sink for engine diagnostics. Nothing written here may affect
/// a count's result.
pub trait DiagnosticSink {
    fn emit(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, message: &str) {
        tracing::debug!(target: "ranked_stv", "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _message: &str) {}
}
