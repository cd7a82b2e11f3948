//! helm 차트에서 이미지 참조 수집
//!
//! `helm template` 으로 차트를 로컬 렌더링한 뒤, 결과 매니페스트를
//! [`crate::yaml`]로 긁습니다. 클러스터 접근은 필요하지 않습니다.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;
use xray_core::DiscoveryError;

/// helm template에 쓰는 임시 릴리스 이름
const TEMPLATE_RELEASE_NAME: &str = "temp";

/// 차트를 렌더링해 이미지 참조를 모읍니다.
///
/// # Errors
///
/// helm 실행 실패 또는 0이 아닌 종료 시 [`DiscoveryError::HelmTemplate`].
pub async fn images_from_chart(chart: &str) -> Result<Vec<String>, DiscoveryError> {
    let manifest = template_chart_with(Path::new("helm"), chart).await?;
    Ok(crate::yaml::images_from_str(&manifest))
}

/// `helm template temp <chart>`를 실행해 렌더링된 매니페스트를 받습니다.
///
/// helm 프로그램 경로는 테스트 주입을 위해 인자로 받습니다.
pub(crate) async fn template_chart_with(
    helm: &Path,
    chart: &str,
) -> Result<String, DiscoveryError> {
    debug!(%chart, "rendering helm chart");
    let output = Command::new(helm)
        .arg("template")
        .arg(TEMPLATE_RELEASE_NAME)
        .arg(chart)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| DiscoveryError::HelmTemplate {
            chart: chart.to_owned(),
            reason: format!("failed to run helm: {e}"),
        })?;

    if !output.status.success() {
        return Err(DiscoveryError::HelmTemplate {
            chart: chart.to_owned(),
            reason: format!(
                "helm exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
