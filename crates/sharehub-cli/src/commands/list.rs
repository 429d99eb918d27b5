//! `sharehub list`

use sharehub_core::error::AppError;
use sharehub_service::ShareAdminService;

use super::ShareRow;
use crate::output::{self, OutputFormat};

/// Print every share, flagging targets that no longer exist.
pub async fn execute(admin: &ShareAdminService, format: OutputFormat) -> Result<(), AppError> {
    let rows: Vec<ShareRow> = admin
        .list()
        .await
        .iter()
        .map(|share| ShareRow::new(&share.record, share.target_exists))
        .collect();
    output::print_list(&rows, format);
    Ok(())
}
