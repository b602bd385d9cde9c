use tracing::warn;

use shared_database::Store;
use shared_models::NewAuditEntry;

/// Best-effort audit write. A failed audit insert is logged and swallowed so
/// it never aborts the operation it describes.
pub async fn record(store: &dyn Store, entry: NewAuditEntry) {
    let action = entry.action.clone();
    if let Err(err) = store.append_audit(entry).await {
        warn!("Failed to write audit entry '{}': {}", action, err);
    }
}
