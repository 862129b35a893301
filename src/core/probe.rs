// Hardware capability probe.
//
// Answers one question: can the two-stage scanner run its 256-bit vector
// stage here? Probed once on first use and memoized for the process.

use std::sync::OnceLock;

static VECTOR_PATH: OnceLock<bool> = OnceLock::new();

/// True when the executing CPU supports the vector Stage-1 implementation.
///
/// Thread-safe; the detection runs at most once per process. Targets without
/// the required ISA always report false, wiring the two-stage scanner to its
/// scalar fallback.
pub fn vector_path_available() -> bool {
    *VECTOR_PATH.get_or_init(detect)
}

#[cfg(target_arch = "x86_64")]
fn detect() -> bool {
    is_x86_feature_detected!("avx2")
}

#[cfg(not(target_arch = "x86_64"))]
fn detect() -> bool {
    false
}
