use async_trait::async_trait;

use crate::error::PlayheadResult;
use crate::models::ProgressRecord;

/// Persistence contract the tracker writes through.
///
/// The backing store (HTTP API, local database) is an external collaborator;
/// this core only requires success or failure. Implementations must be cheap
/// to call repeatedly since the tracker already rate-limits writes.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn save_progress(&self, record: &ProgressRecord) -> PlayheadResult<()>;
}
