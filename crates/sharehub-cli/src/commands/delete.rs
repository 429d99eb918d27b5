//! `sharehub delete`

use clap::Args;
use dialoguer::Confirm;

use sharehub_core::error::AppError;
use sharehub_service::ShareAdminService;

use crate::output;

/// Arguments for `delete`
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Share token
    pub token: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Remove a share after confirmation.
pub async fn execute(admin: &ShareAdminService, args: &DeleteArgs) -> Result<(), AppError> {
    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete share '{}'?", args.token))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Prompt failed: {e}")))?;
        if !confirmed {
            output::print_warning("Cancelled");
            return Ok(());
        }
    }

    let record = admin.delete(&args.token).await?;
    output::print_success(&format!(
        "Deleted share '{}' ({})",
        record.token,
        record.target_path.display()
    ));
    Ok(())
}
