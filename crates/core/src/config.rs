//! 배치 공통 스캔 설정
//!
//! [`ScanConfig`]는 한 번의 호출에서 모든 워커가 공유하는 읽기 전용
//! 옵션입니다. CLI 입력에서 한 번 구성되고 이후 변경되지 않습니다.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 배치 내 모든 스캔에 전달되는 공통 옵션
///
/// 각 필드는 외부 스캐너의 passthrough 플래그로 매핑됩니다.
/// 옵션명 → 효과 매핑은 scanner 크레이트의 커맨드 빌더가
/// 명시적으로 열거합니다 (런타임 타입 단언 없음).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// 오프라인 스캔 모드 (서버 업로드 없음)
    pub offline_mode: bool,
    /// 스캔 서버 URL
    pub server_url: String,
    /// 스캔 서버 API 토큰
    pub api_token: String,
    /// 프로젝트명 재정의 (없으면 이미지 이름 사용)
    pub project_name: Option<String>,
    /// 배치 종료 시 공유 인스펙터 서비스 정리 여부
    pub cleanup_services: bool,
}

impl ScanConfig {
    /// 설정값의 유효성을 검증합니다.
    ///
    /// 오프라인 모드가 아니면 서버 URL이 필요하고,
    /// 서버 URL이 지정되면 API 토큰도 함께 있어야 합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.offline_mode && self.server_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server_url".to_owned(),
                reason: "required unless offline_mode is enabled".to_owned(),
            });
        }

        if !self.server_url.is_empty() && self.api_token.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_token".to_owned(),
                reason: "required when server_url is set".to_owned(),
            });
        }

        if let Some(name) = &self.project_name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "project_name".to_owned(),
                    reason: "override must not be blank".to_owned(),
                });
            }
        }

        Ok(())
    }
}
