//! 스캐너 스크립트 준비
//!
//! 설정된 경로에 스캐너 스크립트가 없으면 다운로드 URL에서 받아
//! 실행 권한을 부여합니다. 이미 있으면 그대로 사용합니다.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};
use xray_core::ScanError;

use crate::config::ScannerConfig;

/// 재시도 사이 대기 시간
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// 스캐너 스크립트가 경로에 존재하고 실행 가능하도록 보장합니다.
///
/// 파일이 이미 있으면 다운로드를 건너뜁니다. 없으면 설정된 URL에서
/// 받아 기록하고 실행 권한을 세웁니다. 다운로드는 설정된 횟수만큼
/// 재시도합니다.
///
/// # Errors
///
/// 모든 재시도가 소진되거나 파일 기록에 실패하면
/// [`ScanError::SetupFailed`]를 반환합니다.
pub async fn ensure_scanner_present(config: &ScannerConfig) -> Result<(), ScanError> {
    if config.detect_path.exists() {
        debug!(path = %config.detect_path.display(), "scanner script already present");
        return mark_executable(&config.detect_path).await;
    }

    if let Some(parent) = config.detect_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScanError::SetupFailed(format!(
                    "failed to create directory for scanner script: {e}"
                )))?;
        }
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()
        .map_err(|e| ScanError::SetupFailed(format!("failed to build http client: {e}")))?;

    let attempts = config.download_retries.max(1);
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        info!(
            url = %config.detect_url,
            attempt,
            attempts,
            "downloading scanner script"
        );
        match download_once(&client, &config.detect_url).await {
            Ok(body) => {
                tokio::fs::write(&config.detect_path, &body)
                    .await
                    .map_err(|e| ScanError::SetupFailed(format!(
                        "failed to write scanner script to {}: {e}",
                        config.detect_path.display()
                    )))?;
                mark_executable(&config.detect_path).await?;
                info!(path = %config.detect_path.display(), "scanner script ready");
                return Ok(());
            }
            Err(reason) => {
                warn!(attempt, attempts, %reason, "scanner download failed");
                last_error = reason;
                if attempt < attempts {
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
    }

    Err(ScanError::SetupFailed(format!(
        "failed to download scanner script from {} after {attempts} attempts: {last_error}",
        config.detect_url
    )))
}

async fn download_once(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("unexpected http status: {status}"));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| format!("failed to read response body: {e}"))?;
    Ok(body.to_vec())
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> Result<(), ScanError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ScanError::SetupFailed(format!("failed to stat scanner script: {e}")))?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(0o755);
    tokio::fs::set_permissions(path, permissions)
        .await
        .map_err(|e| ScanError::SetupFailed(format!(
            "failed to set executable bit on scanner script: {e}"
        )))
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> Result<(), ScanError> {
    Ok(())
}
