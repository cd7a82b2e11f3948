//! Command handlers -- one module per subcommand

pub mod helm;
pub mod image;
pub mod namespace;
pub mod version;
pub mod yaml;

use std::sync::Arc;

use tracing::{debug, info};
use xray_core::{ImageRef, ScanConfig};
use xray_scanner::{RegistryVersionClient, ScanBatchBuilder, ScannerConfig};

use crate::cli::ScanFlags;
use crate::error::CliError;

/// 수집된 이미지 목록으로 스캔 배치를 구성해 끝까지 실행합니다.
///
/// 모든 스캔 서브커맨드가 공유하는 경로입니다. ctrl-c는 배치의
/// 취소 토큰으로 전파되어 실행 중인 워커를 중단시킵니다.
pub(crate) async fn run_scan(
    images: Vec<String>,
    flags: &ScanFlags,
    verbosity: u8,
) -> Result<(), CliError> {
    let core = ScanConfig {
        offline_mode: flags.offline_mode,
        server_url: flags.server_url.clone(),
        api_token: flags.api_token.clone(),
        project_name: flags.project_name.clone(),
        cleanup_services: flags.cleanup,
    };
    core.validate()?;

    let mut config = ScannerConfig::from_core(&core);
    // trace 수준에서는 스캐너 출력을 버퍼링하지 않고 바로 흘린다
    config.stream_output = verbosity >= 2;
    config.lookup_latest_versions = flags.lookup_versions;

    let refs = images
        .iter()
        .map(|raw| ImageRef::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = refs.len(), "resolved scan targets");

    let batch = ScanBatchBuilder::new(config)
        .version_lookup(Arc::new(RegistryVersionClient::new()))
        .build()?;

    let cancel = batch.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling scan batch");
            cancel.cancel();
        }
    });

    let summary = batch.run(refs).await?;
    debug!(
        dispatched = summary.dispatched,
        rendered = summary.rendered,
        "scan batch finished"
    );
    Ok(())
}
