//! `xray helm` command handler

use tracing::info;
use xray_core::DiscoveryError;
use xray_discovery::{dedup_preserving_order, helm::images_from_chart};

use crate::cli::HelmArgs;
use crate::error::CliError;

/// Execute the `helm` command.
///
/// 차트를 로컬에서 렌더링해 참조된 이미지를 모아 스캔합니다.
pub async fn execute(args: HelmArgs, verbosity: u8) -> Result<(), CliError> {
    let images = dedup_preserving_order(images_from_chart(&args.chart).await?);
    if images.is_empty() {
        return Err(CliError::Discovery(DiscoveryError::NoImagesFound {
            source_kind: "chart".to_owned(),
            target: args.chart.clone(),
        }));
    }
    info!(chart = %args.chart, count = images.len(), "collected chart images");
    super::run_scan(images, &args.scan, verbosity).await
}
