//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 이미지 참조([`ImageRef`])와 스캔 결과 레코드([`ScanResult`])를 정의합니다.
//! 두 타입 모두 생성 이후 불변이며, 모듈 간에는 값으로만 전달됩니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// 컨테이너 이미지 참조
///
/// `registry/repository/name:tag` 형식의 문자열을 구성 요소로 분해합니다.
/// 레지스트리와 중간 리포지토리 경로는 없을 수 있습니다
/// (`alpine:3.18`, `quay.io/prometheus/node-exporter:v1.8.0` 모두 유효).
///
/// 원본 문자열은 `Display`로 그대로 복원됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    /// 레지스트리 호스트 (예: `quay.io`), 없으면 None
    pub registry: Option<String>,
    /// 중간 리포지토리 경로 (예: `prometheus`), 없으면 None
    pub repository: Option<String>,
    /// 이미지 이름 (예: `node-exporter`)
    pub name: String,
    /// 태그, 생략 시 `latest`
    pub tag: String,
    /// 사용자가 입력한 원본 문자열
    original: String,
}

impl ImageRef {
    /// 이미지 참조 문자열을 파싱합니다.
    ///
    /// 첫 경로 세그먼트에 `.`, `:`이 포함되거나 `localhost`인 경우에만
    /// 레지스트리로 취급합니다 (docker CLI와 동일한 규칙).
    ///
    /// # Errors
    ///
    /// 이름 또는 태그가 비어 있으면 [`ScanError::MalformedImageRef`]를 반환합니다.
    pub fn parse(raw: &str) -> Result<Self, ScanError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ScanError::MalformedImageRef {
                image: raw.to_owned(),
                reason: "empty image reference".to_owned(),
            });
        }

        // 태그 분리: 마지막 '/' 이후에 있는 ':'만 태그 구분자로 취급
        let (path, tag) = match raw.rfind(':') {
            Some(idx) if idx > raw.rfind('/').unwrap_or(0) => {
                (&raw[..idx], raw[idx + 1..].to_owned())
            }
            _ => (raw, "latest".to_owned()),
        };

        if tag.is_empty() {
            return Err(ScanError::MalformedImageRef {
                image: raw.to_owned(),
                reason: "empty tag".to_owned(),
            });
        }

        let mut segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ScanError::MalformedImageRef {
                image: raw.to_owned(),
                reason: "empty path segment".to_owned(),
            });
        }

        let registry = if segments.len() > 1 {
            let first = segments[0];
            if first.contains('.') || first.contains(':') || first == "localhost" {
                Some(segments.remove(0).to_owned())
            } else {
                None
            }
        } else {
            None
        };

        let name = match segments.pop() {
            Some(n) if !n.is_empty() => n.to_owned(),
            _ => {
                return Err(ScanError::MalformedImageRef {
                    image: raw.to_owned(),
                    reason: "empty image name".to_owned(),
                });
            }
        };

        let repository = if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        };

        Ok(Self {
            registry,
            repository,
            name,
            tag,
            original: raw.to_owned(),
        })
    }

    /// 사용자가 입력한 원본 참조 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// 스캔 결과 레코드
///
/// 워커가 스캔 하나를 끝낼 때마다 정확히 하나 생성되어
/// 결과 채널을 통해 렌더러로 전달됩니다. 생성 이후 불변입니다.
///
/// `location`이 `None`이면 오프라인 모드 등으로 업로드 위치가 없는
/// 정상 결과입니다 (실패가 아님).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// 스캔 대상 이미지
    pub image: ImageRef,
    /// 스캔 결과가 업로드된 위치 (오프라인 스캔이면 None)
    pub location: Option<String>,
}

impl ScanResult {
    /// 업로드 위치가 있는 결과를 생성합니다.
    pub fn with_location(image: ImageRef, location: impl Into<String>) -> Self {
        Self {
            image,
            location: Some(location.into()),
        }
    }

    /// 업로드 위치가 없는 (오프라인) 결과를 생성합니다.
    pub fn without_location(image: ImageRef) -> Self {
        Self {
            image,
            location: None,
        }
    }
}

/// 영문자/숫자 이외의 문자를 전부 `_`로 치환합니다.
///
/// 프로젝트 버전명(`{name}_{tag}`) 등 외부 도구에 넘기는 식별자를
/// 만들 때 사용합니다 (`3.18` → `3_18`).
pub fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name() {
        let r = ImageRef::parse("alpine").unwrap();
        assert_eq!(r.name, "alpine");
        assert_eq!(r.tag, "latest");
        assert_eq!(r.registry, None);
        assert_eq!(r.repository, None);
    }

    #[test]
    fn parses_name_and_tag() {
        let r = ImageRef::parse("alpine:3.18").unwrap();
        assert_eq!(r.name, "alpine");
        assert_eq!(r.tag, "3.18");
    }

    #[test]
    fn parses_registry_repository_name_tag() {
        let r = ImageRef::parse("quay.io/prometheus/node-exporter:v1.8.0").unwrap();
        assert_eq!(r.registry.as_deref(), Some("quay.io"));
        assert_eq!(r.repository.as_deref(), Some("prometheus"));
        assert_eq!(r.name, "node-exporter");
        assert_eq!(r.tag, "v1.8.0");
    }

    #[test]
    fn parses_registry_with_port() {
        let r = ImageRef::parse("localhost:5000/myimage:dev").unwrap();
        assert_eq!(r.registry.as_deref(), Some("localhost:5000"));
        assert_eq!(r.name, "myimage");
        assert_eq!(r.tag, "dev");
    }

    #[test]
    fn dockerhub_org_is_repository_not_registry() {
        let r = ImageRef::parse("library/busybox:1.36").unwrap();
        assert_eq!(r.registry, None);
        assert_eq!(r.repository.as_deref(), Some("library"));
        assert_eq!(r.name, "busybox");
    }

    #[test]
    fn display_round_trips_original() {
        let raw = "quay.io/prometheus/node-exporter:v1.8.0";
        let r = ImageRef::parse(raw).unwrap();
        assert_eq!(r.to_string(), raw);
    }

    #[test]
    fn rejects_empty_reference() {
        assert!(ImageRef::parse("").is_err());
        assert!(ImageRef::parse("   ").is_err());
    }

    #[test]
    fn rejects_empty_tag() {
        assert!(ImageRef::parse("alpine:").is_err());
    }

    #[test]
    fn rejects_empty_path_segment() {
        assert!(ImageRef::parse("quay.io//nginx:1").is_err());
    }

    #[test]
    fn sanitize_replaces_punctuation() {
        assert_eq!(sanitize("alpine_3.18"), "alpine_3_18");
        assert_eq!(sanitize("node-exporter:v1.8.0"), "node_exporter_v1_8_0");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn scan_result_constructors() {
        let image = ImageRef::parse("alpine:3.18").unwrap();
        let ok = ScanResult::with_location(image.clone(), "https://bd.example/alpine");
        assert_eq!(ok.location.as_deref(), Some("https://bd.example/alpine"));

        let offline = ScanResult::without_location(image);
        assert_eq!(offline.location, None);
    }
}
