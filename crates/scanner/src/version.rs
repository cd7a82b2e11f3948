//! 이미지 최신 버전 조회 (권고 정보)
//!
//! 스캔 결과와 별개로, 각 이미지의 레지스트리 태그 중 가장 높은
//! 릴리스 버전을 찾아 테이블에 권고로 덧붙입니다. 전부 best-effort —
//! 조회 실패는 스캔 결과에 영향을 주지 않습니다.

use std::future::Future;

use serde::Deserialize;
use tracing::debug;
use xray_core::types::ImageRef;

/// 기본 태그 조회 API (도커 허브)
const DEFAULT_REGISTRY_API: &str = "https://hub.docker.com";
const TAGS_PAGE_SIZE: u32 = 100;
/// 태그 조회 요청 타임아웃. 권고 조회가 배치 완료를 붙잡지 않도록
/// 짧게 제한합니다.
const LOOKUP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// 이미지 하나에 대한 최신 버전 권고
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAdvisory {
    /// 대상 이미지의 전체 참조 문자열
    pub image: String,
    /// 레지스트리에서 찾은 가장 높은 릴리스 버전
    pub latest_version: String,
}

/// 레지스트리 버전 조회 트레이트
///
/// 조회 실패는 `None`입니다. 에러 타입이 없는 것은 의도된 설계로,
/// 권고 조회는 어떤 경우에도 배치를 실패시키지 않습니다.
pub trait VersionLookup: Send + Sync + 'static {
    fn latest_version(&self, image: &ImageRef) -> impl Future<Output = Option<String>> + Send;
}

/// 도커 허브 태그 API 기반 구현
pub struct RegistryVersionClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TagsPage {
    results: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

impl RegistryVersionClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_REGISTRY_API.to_owned())
    }

    /// 테스트나 사설 미러용으로 API 주소를 바꿔 생성합니다.
    pub fn with_base_url(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    fn tags_url(&self, image: &ImageRef) -> String {
        // 레지스트리 없는 단일 이름은 허브의 library 네임스페이스
        let repository = match &image.repository {
            Some(repo) => format!("{repo}/{}", image.name),
            None => format!("library/{}", image.name),
        };
        format!(
            "{}/v2/repositories/{repository}/tags?page_size={TAGS_PAGE_SIZE}",
            self.base_url
        )
    }
}

impl Default for RegistryVersionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionLookup for RegistryVersionClient {
    async fn latest_version(&self, image: &ImageRef) -> Option<String> {
        // 허브 API는 사설 레지스트리 이미지를 모른다
        if image.registry.is_some() {
            debug!(image = %image, "skipping version lookup for non-default registry");
            return None;
        }
        let url = self.tags_url(image);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(image = %image, error = %e, "tag listing request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(image = %image, status = %response.status(), "tag listing rejected");
            return None;
        }
        let page: TagsPage = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                debug!(image = %image, error = %e, "tag listing parse failed");
                return None;
            }
        };
        let tags: Vec<String> = page.results.into_iter().map(|t| t.name).collect();
        find_highest_version(&tags, false)
    }
}

/// 이미지의 최신 버전 권고를 만듭니다. 실패하면 `None`.
pub async fn lookup_advisory<L: VersionLookup>(
    lookup: &L,
    image: &ImageRef,
) -> Option<ImageAdvisory> {
    let latest = lookup.latest_version(image).await?;
    Some(ImageAdvisory {
        image: image.as_str().to_owned(),
        latest_version: latest,
    })
}

/// 태그 목록에서 가장 높은 버전을 찾습니다.
///
/// 점이 없는 태그(`latest` 등)는 건너뜁니다. `allow_prereleases`가
/// false면 릴리스 버전(`v` 접두사 허용, 숫자와 점만)만 비교합니다.
/// 유효한 버전이 하나도 없으면 `None`.
pub fn find_highest_version(tags: &[String], allow_prereleases: bool) -> Option<String> {
    let mut highest: Option<(semver::Version, &str)> = None;
    for tag in tags {
        if !tag.contains('.') {
            continue;
        }
        let Some(parsed) = parse_lenient(tag, allow_prereleases) else {
            continue;
        };
        let replace = match &highest {
            Some((best, _)) => parsed > *best,
            None => true,
        };
        if replace {
            highest = Some((parsed, tag));
        }
    }
    highest.map(|(_, tag)| tag.to_owned())
}

/// 느슨한 버전 파싱: `v` 접두사와 1~3개의 숫자 컴포넌트를 허용하고,
/// 빠진 컴포넌트는 0으로 채웁니다.
fn parse_lenient(tag: &str, allow_prereleases: bool) -> Option<semver::Version> {
    let trimmed = tag.strip_prefix('v').unwrap_or(tag);
    let (core, pre) = match trimmed.split_once('-') {
        Some((core, pre)) => {
            if !allow_prereleases {
                return None;
            }
            (core, Some(pre))
        }
        None => (trimmed, None),
    };

    let mut parts = [0u64; 3];
    let components: Vec<&str> = core.split('.').collect();
    if components.is_empty() || components.len() > 3 {
        return None;
    }
    for (i, component) in components.iter().enumerate() {
        parts[i] = component.parse().ok()?;
    }

    let mut version = semver::Version::new(parts[0], parts[1], parts[2]);
    if let Some(pre) = pre {
        version.pre = semver::Prerelease::new(pre).ok()?;
    }
    Some(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn highest_release_version_wins() {
        let result = find_highest_version(
            &tags(&["latest", "3.17", "3.18.4", "3.18", "edge", "2.9.9"]),
            false,
        );
        assert_eq!(result.as_deref(), Some("3.18.4"));
    }

    #[test]
    fn v_prefix_is_accepted() {
        let result = find_highest_version(&tags(&["v1.2.3", "1.2.2"]), false);
        assert_eq!(result.as_deref(), Some("v1.2.3"));
    }

    #[test]
    fn prereleases_excluded_by_default() {
        let result = find_highest_version(&tags(&["2.0.0-rc.1", "1.9.0"]), false);
        assert_eq!(result.as_deref(), Some("1.9.0"));
    }

    #[test]
    fn prereleases_included_when_allowed() {
        let result = find_highest_version(&tags(&["2.0.0-rc.1", "1.9.0"]), true);
        assert_eq!(result.as_deref(), Some("2.0.0-rc.1"));
    }

    #[test]
    fn prerelease_orders_below_release() {
        let result = find_highest_version(&tags(&["2.0.0-rc.1", "2.0.0"]), true);
        assert_eq!(result.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn no_valid_versions_is_none() {
        assert!(find_highest_version(&tags(&["latest", "edge", "stable"]), false).is_none());
        assert!(find_highest_version(&[], false).is_none());
    }

    #[test]
    fn garbage_tags_are_skipped() {
        let result = find_highest_version(
            &tags(&["3.18.x", "3.18.4.1", "sha256.deadbeef", "3.2"]),
            false,
        );
        assert_eq!(result.as_deref(), Some("3.2"));
    }

    #[test]
    fn tags_url_uses_library_namespace_for_bare_names() {
        let client = RegistryVersionClient::with_base_url("http://localhost:9999".to_owned());
        let image = ImageRef::parse("alpine:3.18").unwrap();
        assert_eq!(
            client.tags_url(&image),
            "http://localhost:9999/v2/repositories/library/alpine/tags?page_size=100"
        );
    }

    #[test]
    fn tags_url_keeps_explicit_repository() {
        let client = RegistryVersionClient::with_base_url("http://localhost:9999".to_owned());
        let image = ImageRef::parse("grafana/loki:2.9.0").unwrap();
        assert_eq!(
            client.tags_url(&image),
            "http://localhost:9999/v2/repositories/grafana/loki/tags?page_size=100"
        );
    }

    #[tokio::test]
    async fn lookup_skips_private_registries() {
        let client = RegistryVersionClient::with_base_url("http://localhost:9999".to_owned());
        let image = ImageRef::parse("registry.example.com/team/app:1.0").unwrap();
        assert!(client.latest_version(&image).await.is_none());
    }
}
