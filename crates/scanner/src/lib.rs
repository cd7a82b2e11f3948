//! xray-scanner — 스캔 오케스트레이션 엔진
//!
//! 컨테이너 이미지 배치를 받아 이미지당 워커를 띄우고, 외부 스캐너
//! 프로세스를 실행한 뒤 결과 location을 테이블로 모아 출력합니다.
//!
//! # Module Structure
//!
//! - [`config`]: 스캐너 설정 (`ScannerConfig`)
//! - [`detect`]: 스캐너 스크립트 준비 (다운로드, 실행 권한)
//! - [`command`]: 스캔 호출 인자 빌더 (`ScanInvocation`)
//! - [`exec`]: 프로세스 실행 추상화 (`CommandRunner` 트레이트)
//! - [`services`]: 공유 이미지 인스펙터 서비스 수명주기
//! - [`status`]: 스캔 산출물(status.json) 탐색과 파싱
//! - [`worker`]: 이미지 하나의 스캔 워커
//! - [`table`]: 결과 테이블 렌더러
//! - [`version`]: 최신 버전 권고 조회
//! - [`batch`]: 배치 오케스트레이터 (`ScanBatch`)
//!
//! # Architecture
//!
//! ```text
//! images --> ScanBatch --+--> worker --> CommandRunner --> status.json
//!                        |      │
//!                        |      └--> ScanResult ──mpsc──> renderer
//!                        |                                   │
//!                        +--> VersionLookup ──mpsc──────────>┤
//!                        |                                   │
//!                        |              done(oneshot) <──────┘
//!                        +--> InspectorServices (start / stop once)
//! ```

pub mod batch;
pub mod command;
pub mod config;
pub mod detect;
pub mod exec;
pub mod services;
pub mod status;
pub mod table;
pub mod version;
pub mod worker;

// --- Public API Re-exports ---

// Orchestrator
pub use batch::{BatchState, BatchSummary, ScanBatch, ScanBatchBuilder};

// Configuration
pub use config::ScannerConfig;

// Process execution
pub use exec::{CommandOutput, CommandRunner, TokioCommandRunner};

// Version advisories
pub use version::{ImageAdvisory, RegistryVersionClient, VersionLookup};
