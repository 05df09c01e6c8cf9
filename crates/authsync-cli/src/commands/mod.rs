pub mod lifecycle;
pub mod show;

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use authsync_reconciler::AuthMethodResource;

/// Everything a lifecycle command needs.
pub struct Session {
    pub resource: AuthMethodResource,
    pub cancel: CancellationToken,
    pub state_path: PathBuf,
}
