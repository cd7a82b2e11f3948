//! `xray image` command handler

use xray_discovery::images_from_args;

use crate::cli::ImageArgs;
use crate::error::CliError;

/// Execute the `image` command.
pub async fn execute(args: ImageArgs, verbosity: u8) -> Result<(), CliError> {
    let images = images_from_args(&args.images);
    if images.is_empty() {
        return Err(CliError::Command(
            "no image references given".to_owned(),
        ));
    }
    super::run_scan(images, &args.scan, verbosity).await
}
