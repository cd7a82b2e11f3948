//! 에러 타입 — 도메인별 에러 정의
//!
//! # 에러 분류
//!
//! - **SetupFailed**: 스캐너 바이너리/공유 서비스 준비 실패. 배치 전체에
//!   치명적이며 워커는 하나도 디스패치되지 않습니다.
//! - **ArtifactNotFound / ArtifactParse / ProcessExecution**: 워커 단위의
//!   하드 실패. fail-fast 정책에 따라 배치 전체 취소를 유발합니다.
//! - **Cancelled**: 다른 워커의 실패로 취소를 관측한 워커에 전달됩니다.
//!   실제 스캔 실패와 구분되므로 로그에서 혼동되지 않습니다.
//!
//! 업로드 위치가 없는 스캔(오프라인 모드)은 에러가 아니라
//! `location: None`인 정상 결과로 취급합니다.

/// xray 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum XrayError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 실행 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// 이미지 참조 수집 에러
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

/// 스캔 실행 도메인 에러
///
/// 워커 단위 에러는 전부 대상 이미지 참조를 함께 담아
/// 어떤 스캔에서 발생했는지 추적할 수 있게 합니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 이미지 참조 파싱 실패
    #[error("malformed image reference '{image}': {reason}")]
    MalformedImageRef {
        /// 원본 이미지 문자열
        image: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 배치 준비 실패 (스캐너 바이너리 다운로드, 공유 서비스 기동)
    #[error("scan setup failed: {0}")]
    SetupFailed(String),

    /// 외부 스캐너 프로세스가 0이 아닌 코드로 종료됨
    #[error("scanner process failed for '{image}': {reason}")]
    ProcessExecution {
        /// 스캔 대상 이미지
        image: String,
        /// 종료 상태와 캡처된 출력 요약
        reason: String,
    },

    /// 프로세스는 성공했으나 결과 아티팩트를 찾지 못함
    #[error("scan status file not found under '{search_root}' for '{image}'")]
    ArtifactNotFound {
        /// 스캔 대상 이미지
        image: String,
        /// 탐색을 시작한 출력 디렉토리
        search_root: String,
    },

    /// 결과 아티팩트 파싱 실패
    #[error("failed to parse scan status file '{path}' for '{image}': {reason}")]
    ArtifactParse {
        /// 스캔 대상 이미지
        image: String,
        /// 아티팩트 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 배치 취소를 관측하고 중단된 워커
    #[error("scan cancelled for '{image}'")]
    Cancelled {
        /// 스캔 대상 이미지
        image: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl ScanError {
    /// 배치 전체 취소를 유발하는 하드 실패인지 반환합니다.
    ///
    /// `Cancelled`는 취소의 결과이지 원인이 아니므로 하드 실패가 아닙니다.
    pub fn is_hard_failure(&self) -> bool {
        !matches!(self, Self::Cancelled { .. })
    }
}

/// 이미지 참조 수집 에러
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Kubernetes API 접근 실패
    #[error("kubernetes error: {0}")]
    Kube(String),

    /// helm 차트 렌더링 실패
    #[error("helm template failed for chart '{chart}': {reason}")]
    HelmTemplate {
        /// 차트 URL 또는 경로
        chart: String,
        /// 실패 사유
        reason: String,
    },

    /// YAML 파일 읽기 실패
    #[error("failed to read yaml '{path}': {source}")]
    YamlRead {
        /// 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 수집 결과가 비어 있음
    #[error("no image references found in {source_kind} '{target}'")]
    NoImagesFound {
        /// 대상 종류 (namespace, chart, yaml)
        source_kind: String,
        /// 대상 이름
        target: String,
    },
}
