//! 상주 이미지 인스펙터 서비스 수명주기 관리
//!
//! 스캔마다 인스펙터 컨테이너를 새로 띄우는 대신, 배치 시작 시 호스트에
//! 인스펙터 서비스 컨테이너를 한 번 띄워 두고 모든 스캔이 공유합니다.
//! 배치가 끝나면 (성공이든 취소든) 정확히 한 번만 정리합니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};
use xray_core::ScanError;

use crate::config::{DEFAULT_INSPECTOR_SERVICE_URL, ScannerConfig};
use crate::exec::CommandRunner;

const INSPECTOR_IMAGE_VERSION: &str = "5.1.0";
const INSPECTOR_CONTAINER_PORT: u16 = 8081;

/// 호스트에 띄우는 인스펙터 서비스 컨테이너 (배포 OS별 하나씩)
const INSPECTOR_SERVICES: [(&str, &str, u16); 3] = [
    ("blackduck-imageinspector-alpine", "alpine", 9000),
    ("blackduck-imageinspector-centos", "centos", 9001),
    ("blackduck-imageinspector-ubuntu", "ubuntu", 9002),
];

/// 공유 인스펙터 서비스 핸들
///
/// [`start`](Self::start)는 배치당 한 번 호출되고,
/// [`stop`](Self::stop)은 몇 번 호출되어도 실제 정리는 최대 한 번만
/// 수행됩니다. 부분적으로만 시작된 상태에서도 안전합니다 — 실제로
/// 시작된 컨테이너만 정리 대상입니다.
pub struct InspectorServices<R: CommandRunner> {
    runner: Arc<R>,
    shared_dir: PathBuf,
    stopped: AtomicBool,
    started: Mutex<Vec<String>>,
}

impl<R: CommandRunner> InspectorServices<R> {
    pub fn new(runner: Arc<R>, config: &ScannerConfig) -> Self {
        Self {
            runner,
            shared_dir: config.output_root.join("shared"),
            stopped: AtomicBool::new(false),
            started: Mutex::new(Vec::new()),
        }
    }

    /// 스캐너가 접속할 인스펙터 서비스 URL
    pub fn service_url(&self) -> &'static str {
        DEFAULT_INSPECTOR_SERVICE_URL
    }

    /// 인스펙터 서비스 컨테이너들을 호스트에 띄웁니다.
    ///
    /// 하나라도 실패하면 에러를 반환합니다. 이미 시작된 컨테이너는
    /// 기록되어 있으므로 이후 [`stop`](Self::stop)에서 정리됩니다.
    ///
    /// # Errors
    ///
    /// 공유 디렉토리 생성 또는 컨테이너 기동 실패 시
    /// [`ScanError::SetupFailed`].
    pub async fn start(&self) -> Result<(), ScanError> {
        tokio::fs::create_dir_all(&self.shared_dir)
            .await
            .map_err(|e| ScanError::SetupFailed(format!(
                "failed to create shared inspector directory {}: {e}",
                self.shared_dir.display()
            )))?;

        for (name, os, host_port) in INSPECTOR_SERVICES {
            info!(container = name, port = host_port, "starting inspector service");
            let args = vec![
                "run".to_owned(),
                "-d".to_owned(),
                "--name".to_owned(),
                name.to_owned(),
                "-p".to_owned(),
                format!("{host_port}:{INSPECTOR_CONTAINER_PORT}"),
                "-v".to_owned(),
                format!("{}:/opt/blackduck/shared", self.shared_dir.display()),
                format!("blackducksoftware/blackduck-imageinspector-{os}:{INSPECTOR_IMAGE_VERSION}"),
            ];
            let output = self
                .runner
                .run(Path::new("docker"), &args, None, false)
                .await
                .map_err(|e| ScanError::SetupFailed(format!(
                    "failed to spawn docker for inspector service {name}: {e}"
                )))?;
            if !output.success() {
                return Err(ScanError::SetupFailed(format!(
                    "inspector service {name} failed to start (exit {:?}): {}",
                    output.status_code,
                    output.stderr.trim()
                )));
            }
            self.started.lock().unwrap_or_else(|e| e.into_inner()).push(name.to_owned());
        }
        Ok(())
    }

    /// 시작된 인스펙터 서비스 컨테이너들을 정리합니다.
    ///
    /// 최대 한 번만 실제 정리를 수행하며, 이후 호출은 즉시 반환됩니다.
    /// 개별 컨테이너의 정리 실패는 로그만 남기고 계속 진행합니다.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            debug!("inspector services already stopped");
            return;
        }
        let started = std::mem::take(
            &mut *self.started.lock().unwrap_or_else(|e| e.into_inner()),
        );
        for name in started {
            info!(container = %name, "stopping inspector service");
            for action in ["stop", "rm"] {
                let args = vec![action.to_owned(), name.clone()];
                match self.runner.run(Path::new("docker"), &args, None, false).await {
                    Ok(output) if output.success() => {}
                    Ok(output) => {
                        warn!(
                            container = %name,
                            action,
                            exit = ?output.status_code,
                            stderr = %output.stderr.trim(),
                            "inspector service cleanup command failed"
                        );
                    }
                    Err(e) => {
                        warn!(container = %name, action, error = %e, "inspector service cleanup failed");
                    }
                }
            }
        }
    }
}
