//! `sharehub add` and `sharehub add-random`

use std::path::PathBuf;

use clap::Args;

use sharehub_core::error::AppError;
use sharehub_service::ShareAdminService;
use sharehub_service::share::AddShare;

use super::{ShareRow, parse_uses};
use crate::output::{self, OutputFormat};

/// Options shared by both add commands
#[derive(Debug, Args)]
pub struct ShareOptions {
    /// Number of downloads allowed (-1 = unlimited)
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    pub uses: i64,
    /// Expire after a duration: 12h, 3d, 2w, 1m, 1y or never
    #[arg(short, long)]
    pub expires: Option<String>,
    /// Accept uploads into the shared directory
    #[arg(long)]
    pub allow_upload: bool,
}

/// Arguments for `add`
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Share token
    pub token: String,
    /// File or directory to publish
    pub path: PathBuf,
    #[command(flatten)]
    pub options: ShareOptions,
}

/// Arguments for `add-random`
#[derive(Debug, Args)]
pub struct AddRandomArgs {
    /// File or directory to publish
    pub path: PathBuf,
    #[command(flatten)]
    pub options: ShareOptions,
}

/// Publish a path under the given token.
pub async fn execute(
    admin: &ShareAdminService,
    args: &AddArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    publish(admin, Some(args.token.clone()), &args.path, &args.options, format).await
}

/// Publish a path under a freshly drawn token.
pub async fn execute_random(
    admin: &ShareAdminService,
    args: &AddRandomArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    publish(admin, None, &args.path, &args.options, format).await
}

async fn publish(
    admin: &ShareAdminService,
    token: Option<String>,
    path: &std::path::Path,
    options: &ShareOptions,
    format: OutputFormat,
) -> Result<(), AppError> {
    let record = admin
        .add(AddShare {
            token,
            path: path.to_path_buf(),
            uses: parse_uses(options.uses)?,
            expires: options.expires.clone(),
            allow_upload: options.allow_upload,
        })
        .await?;

    if format == OutputFormat::Table {
        output::print_success(&format!("Shared '{}'", record.target_path.display()));
    }
    output::print_item(&ShareRow::new(&record, true), format);
    Ok(())
}
