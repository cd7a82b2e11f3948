//! xray-core — 공통 타입, 에러, 설정
//!
//! 모든 크레이트가 공유하는 도메인 타입을 정의합니다.
//!
//! - [`types`]: [`ImageRef`], [`ScanResult`], 문자열 정규화
//! - [`error`]: [`XrayError`]와 도메인별 하위 에러
//! - [`config`]: 배치 공통 [`ScanConfig`]

pub mod config;
pub mod error;
pub mod types;

pub use config::ScanConfig;
pub use error::{ConfigError, DiscoveryError, ScanError, XrayError};
pub use types::{ImageRef, ScanResult, sanitize};
