//! ID generator port for invocation identifiers.

/// Generates unique identifiers.
///
/// Each reconciliation pass is tagged with one ID so its log lines can be
/// correlated. Replay substitutes a recorded sequence.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier string.
    fn generate_id(&self) -> String;
}
