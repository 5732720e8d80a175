//! Which fetch failures are worth another attempt.

use crate::error::HarvestError;

/// Throttling, 5xx answers and connection-level curl failures are transient.
/// Parse, archive and disk errors never are.
pub fn is_transient(e: &HarvestError) -> bool {
    match e {
        HarvestError::FetchStatus { status, .. } => matches!(*status, 429 | 500..=599),
        HarvestError::FetchNetwork { source, .. } => transient_curl(source),
        _ => false,
    }
}

fn transient_curl(e: &curl::Error) -> bool {
    e.is_operation_timedout()
        || e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
}
