//! Logging setup shared by every Aurora binary.

/// Initialize process-wide logging with `info` as the fallback filter.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init("info");
}

/// Initialize logging with an explicit fallback filter.
pub fn init_with_level(default_level: &str) {
    tracing::init(default_level);
}

/// Tracing subscriber configuration (filters, layers).
pub mod tracing;
