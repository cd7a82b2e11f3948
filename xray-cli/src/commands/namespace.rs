//! `xray namespace` command handler

use tracing::info;
use xray_discovery::KubeClient;

use crate::cli::NamespaceArgs;
use crate::error::CliError;

/// Execute the `namespace` command.
///
/// 네임스페이스의 파드 이미지를 모아 하나의 배치로 스캔합니다.
pub async fn execute(args: NamespaceArgs, verbosity: u8) -> Result<(), CliError> {
    let client = KubeClient::connect().await?;
    let images = client.images_from_namespace(&args.namespace).await?;
    info!(
        namespace = %args.namespace,
        count = images.len(),
        "collected pod images"
    );
    super::run_scan(images, &args.scan, verbosity).await
}
