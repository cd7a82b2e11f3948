//! 스캐너 설정
//!
//! [`ScannerConfig`]는 core의 [`ScanConfig`](xray_core::ScanConfig)를
//! 기반으로 스캐너 엔진 전용 설정(바이너리 경로, 출력 루트, 서비스
//! 사용 여부 등)을 더한 것입니다.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use xray_core::error::ConfigError;

/// 스캐너 바이너리 기본 다운로드 URL
pub const DEFAULT_DETECT_URL: &str = "https://detect.synopsys.com/detect.sh";
/// 스캐너 바이너리 기본 설치 경로
pub const DEFAULT_DETECT_PATH: &str = "./detect.sh";
/// 공유 이미지 인스펙터 서비스의 로컬 URL
pub const DEFAULT_INSPECTOR_SERVICE_URL: &str = "http://localhost:9002";

/// 설정 상한값 상수
const MAX_DOWNLOAD_RETRIES: u32 = 10;
const MAX_DOWNLOAD_TIMEOUT_SECS: u64 = 3600;

/// 스캐너 엔진 설정
///
/// 배치 하나를 구성할 때 한 번 만들어지며 이후 읽기 전용입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// 외부 스캐너 스크립트 경로
    pub detect_path: PathBuf,
    /// 스캐너 스크립트 다운로드 URL
    pub detect_url: String,
    /// 스캔 출력 루트 디렉토리 (이 아래에 스캔별 고유 디렉토리 생성)
    pub output_root: PathBuf,
    /// 스캐너 도구 캐시 디렉토리
    pub tools_dir: PathBuf,
    /// 오프라인 스캔 모드
    pub offline_mode: bool,
    /// 스캔 서버 URL (비어 있으면 전달하지 않음)
    pub server_url: String,
    /// 스캔 서버 API 토큰 (비어 있으면 전달하지 않음)
    pub api_token: String,
    /// 프로젝트명 재정의
    pub project_name: Option<String>,
    /// 공유 이미지 인스펙터 서비스 사용 여부
    pub use_inspector_services: bool,
    /// 배치 종료 시 인스펙터 서비스 정리 여부
    pub cleanup_services: bool,
    /// 자식 프로세스 출력을 실시간 스트리밍할지 여부 (trace 레벨)
    pub stream_output: bool,
    /// 이미지별 최신 버전 조회 컬럼 활성화 여부
    pub lookup_latest_versions: bool,
    /// 바이너리 다운로드 재시도 횟수
    pub download_retries: u32,
    /// 바이너리 다운로드 타임아웃 (초)
    pub download_timeout_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_owned());
        Self {
            detect_path: PathBuf::from(DEFAULT_DETECT_PATH),
            detect_url: DEFAULT_DETECT_URL.to_owned(),
            output_root: PathBuf::from(format!("{home}/blackduck")),
            tools_dir: PathBuf::from(format!("{home}/blackduck/tools")),
            offline_mode: false,
            server_url: String::new(),
            api_token: String::new(),
            project_name: None,
            use_inspector_services: true,
            cleanup_services: true,
            stream_output: false,
            lookup_latest_versions: false,
            download_retries: 3,
            download_timeout_secs: 180,
        }
    }
}

impl ScannerConfig {
    /// core의 `ScanConfig`에서 스캐너 설정을 생성합니다.
    ///
    /// core 설정에 없는 엔진 전용 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &xray_core::ScanConfig) -> Self {
        Self {
            offline_mode: core.offline_mode,
            server_url: core.server_url.clone(),
            api_token: core.api_token.clone(),
            project_name: core.project_name.clone(),
            cleanup_services: core.cleanup_services,
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detect_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "detect_url".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output_root".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.download_retries > MAX_DOWNLOAD_RETRIES {
            return Err(ConfigError::InvalidValue {
                field: "download_retries".to_owned(),
                reason: format!("must be 0-{MAX_DOWNLOAD_RETRIES}"),
            });
        }

        if self.download_timeout_secs == 0 || self.download_timeout_secs > MAX_DOWNLOAD_TIMEOUT_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "download_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_DOWNLOAD_TIMEOUT_SECS}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ScannerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_detect_url() {
        let config = ScannerConfig {
            detect_url: String::new(),
            ..ScannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_download_timeout() {
        let config = ScannerConfig {
            download_timeout_secs: 0,
            ..ScannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_excessive_retries() {
        let config = ScannerConfig {
            download_retries: 100,
            ..ScannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_core_carries_batch_options() {
        let core = xray_core::ScanConfig {
            offline_mode: true,
            server_url: "https://bd.example".to_owned(),
            api_token: "t".to_owned(),
            project_name: Some("my-project".to_owned()),
            cleanup_services: false,
        };
        let config = ScannerConfig::from_core(&core);
        assert!(config.offline_mode);
        assert_eq!(config.server_url, "https://bd.example");
        assert_eq!(config.project_name.as_deref(), Some("my-project"));
        assert!(!config.cleanup_services);
        // 엔진 전용 필드는 기본값
        assert_eq!(config.detect_url, DEFAULT_DETECT_URL);
    }
}
