//! `xray yaml` command handler

use tracing::info;
use xray_core::DiscoveryError;
use xray_discovery::{dedup_preserving_order, yaml::images_from_file};

use crate::cli::YamlArgs;
use crate::error::CliError;

/// Execute the `yaml` command.
pub async fn execute(args: YamlArgs, verbosity: u8) -> Result<(), CliError> {
    let images = dedup_preserving_order(images_from_file(&args.file)?);
    if images.is_empty() {
        return Err(CliError::Discovery(DiscoveryError::NoImagesFound {
            source_kind: "yaml".to_owned(),
            target: args.file.display().to_string(),
        }));
    }
    info!(file = %args.file.display(), count = images.len(), "collected manifest images");
    super::run_scan(images, &args.scan, verbosity).await
}
