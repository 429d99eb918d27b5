//! `sharehub edit`

use clap::Args;

use sharehub_core::error::AppError;
use sharehub_service::ShareAdminService;
use sharehub_service::share::EditShare;

use super::{ShareRow, parse_uses};
use crate::output::{self, OutputFormat};

/// Arguments for `edit`
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Share token
    pub token: String,
    /// Move the share to a new token
    #[arg(long)]
    pub rename: Option<String>,
    /// New number of downloads allowed (-1 = unlimited)
    #[arg(short, long, allow_negative_numbers = true)]
    pub uses: Option<i64>,
    /// New expiration relative to now, or never
    #[arg(short, long)]
    pub expires: Option<String>,
    /// Accept uploads into the shared directory
    #[arg(long)]
    pub allow_upload: Option<bool>,
}

impl EditArgs {
    fn to_edit(&self) -> Result<EditShare, AppError> {
        Ok(EditShare {
            rename: self.rename.clone(),
            uses: self.uses.map(parse_uses).transpose()?,
            expires: self.expires.clone(),
            allow_upload: self.allow_upload,
        })
    }
}

/// Apply an edit to a share.
pub async fn execute(
    admin: &ShareAdminService,
    args: &EditArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let record = admin.edit(&args.token, args.to_edit()?).await?;
    if format == OutputFormat::Table {
        output::print_success(&format!("Updated share '{}'", record.token));
    }
    let exists = tokio::fs::try_exists(&record.target_path).await.unwrap_or(false);
    output::print_item(&ShareRow::new(&record, exists), format);
    Ok(())
}
