//! YAML 매니페스트에서 이미지 참조 수집
//!
//! 매니페스트를 구조적으로 파싱하지 않고 `image:` 키가 있는 라인만
//! 긁어냅니다. 중첩 구조나 템플릿 문법에 휘둘리지 않는 가장 단순한
//! 방법이고, 파드 스펙의 이미지 필드에는 충분합니다.

use std::path::Path;

use xray_core::DiscoveryError;

/// 한 라인에서 `image:` 값을 뽑아냅니다.
fn image_from_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix("- image:").or_else(|| trimmed.strip_prefix("image:"))?;
    let value = rest.trim().trim_matches('"').trim_matches('\'').trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_owned())
}

/// 렌더링된 매니페스트 문자열에서 이미지 참조를 순서대로 모읍니다.
///
/// 중복은 제거하지 않습니다. 호출자가 수집원 전체에 대해 한 번에
/// 중복을 제거합니다.
pub fn images_from_str(manifest: &str) -> Vec<String> {
    manifest.lines().filter_map(image_from_line).collect()
}

/// YAML 파일에서 이미지 참조를 모읍니다.
///
/// # Errors
///
/// 파일을 읽지 못하면 [`DiscoveryError::YamlRead`].
pub fn images_from_file(path: &Path) -> Result<Vec<String>, DiscoveryError> {
    let contents = std::fs::read_to_string(path).map_err(|source| DiscoveryError::YamlRead {
        path: path.display().to_string(),
        source,
    })?;
    Ok(images_from_str(&contents))
}
