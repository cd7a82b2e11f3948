//! xray-discovery — 스캔 대상 이미지 수집
//!
//! 스캔할 이미지 목록을 여러 수집원에서 만들어 냅니다.
//!
//! - [`kube`]: 쿠버네티스 네임스페이스의 파드 이미지
//! - [`helm`]: `helm template`으로 렌더링한 차트의 이미지
//! - [`yaml`]: YAML 매니페스트 파일의 이미지
//!
//! 모든 수집원은 첫 등장 순서를 유지한 채 중복을 제거한 이미지
//! 참조 문자열 목록을 돌려줍니다. 파싱과 검증은 수집이 아니라
//! 스캔 쪽의 몫입니다.

use std::collections::HashSet;

pub mod helm;
pub mod kube;
pub mod yaml;

pub use kube::KubeClient;

/// 첫 등장 순서를 유지하며 중복을 제거합니다.
pub fn dedup_preserving_order(images: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    images
        .into_iter()
        .filter(|image| seen.insert(image.clone()))
        .collect()
}

/// 커맨드라인 인자로 받은 이미지 목록을 정리합니다.
///
/// 공백 항목을 버리고 중복을 제거합니다. 파싱 검증은 하지 않습니다.
pub fn images_from_args(args: &[String]) -> Vec<String> {
    let trimmed = args
        .iter()
        .map(|a| a.trim().to_owned())
        .filter(|a| !a.is_empty())
        .collect();
    dedup_preserving_order(trimmed)
}
