//! Portable scalar backend

use super::DspBackend;

/// Per-sample loops for every operation
///
/// Uses the trait's default bodies unchanged. Always available and the
/// default unless the `vectorized` feature is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarBackend;

impl DspBackend for ScalarBackend {}
