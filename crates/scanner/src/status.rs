//! 스캔 산출물(status.json) 탐색 및 파싱
//!
//! 외부 스캐너는 실행마다 출력 디렉토리 아래 어딘가에 status.json을
//! 남깁니다. 정확한 깊이는 스캐너 버전에 따라 달라서, 출력 루트부터
//! 디렉토리를 재귀 탐색해 첫 번째 status.json을 찾습니다.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// status.json 읽기/파싱 에러
///
/// 이미지 문맥은 호출자(워커)가 보태어 상위 에러로 감쌉니다.
#[derive(Debug, Error)]
pub enum StatusFileError {
    #[error("failed to read status file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse status file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 스캐너가 남기는 status.json 문서
///
/// 알 수 없는 필드는 무시하고, 빠진 필드는 기본값으로 채웁니다.
/// 스캐너 버전마다 부가 필드가 들쭉날쭉하기 때문입니다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusDocument {
    pub format_version: String,
    pub detect_version: String,
    pub project_name: String,
    pub project_version: String,
    pub status: Vec<StatusEntry>,
    pub results: Vec<ResultEntry>,
    pub code_locations: Vec<CodeLocationEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusEntry {
    pub key: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultEntry {
    pub location: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeLocationEntry {
    pub code_location_name: String,
}

impl StatusDocument {
    /// results에서 비어 있지 않은 location 값을 순서대로 모읍니다.
    ///
    /// 빈 벡터는 정상입니다. 일부 스캔(예: 오프라인 모드)은 결과
    /// location 없이 성공적으로 끝납니다.
    pub fn locations(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.location.is_empty())
            .map(|r| r.location.clone())
            .collect()
    }
}

/// 루트부터 깊이 우선으로 내려가며 첫 번째 status.json 경로를 찾습니다.
///
/// 각 디렉토리에서 파일을 먼저 확인한 뒤 하위 디렉토리로 내려갑니다.
/// 찾지 못하면 `Ok(None)`입니다.
pub fn find_status_file(root: &Path) -> Result<Option<PathBuf>, std::io::Error> {
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_file() && entry.file_name() == "status.json" {
            return Ok(Some(entry.path()));
        }
        if file_type.is_dir() {
            subdirs.push(entry.path());
        }
    }
    // 파일명 순으로 정렬해 탐색 순서를 결정적으로 만듭니다.
    subdirs.sort();
    for dir in subdirs {
        if let Some(found) = find_status_file(&dir)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// status.json 파일을 읽어 파싱합니다.
pub fn load_status_document(path: &Path) -> Result<StatusDocument, StatusFileError> {
    let raw = fs::read_to_string(path)?;
    let document = serde_json::from_str(&raw)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "formatVersion": "0.4.0",
        "detectVersion": "7.0.0",
        "projectName": "alpine",
        "projectVersion": "3.18",
        "status": [{"key": "DOCKER", "status": "SUCCESS"}],
        "results": [
            {"location": "https://bd.example/ui/versions/123/components", "message": ""},
            {"location": "", "message": "offline result"}
        ],
        "codeLocations": [{"codeLocationName": "alpine/3.18 scan"}]
    }"#;

    #[test]
    fn parses_sample_document() {
        let doc: StatusDocument = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(doc.project_name, "alpine");
        assert_eq!(doc.project_version, "3.18");
        assert_eq!(doc.status.len(), 1);
        assert_eq!(doc.status[0].status, "SUCCESS");
        assert_eq!(doc.code_locations[0].code_location_name, "alpine/3.18 scan");
    }

    #[test]
    fn locations_skips_empty_entries() {
        let doc: StatusDocument = serde_json::from_str(SAMPLE).unwrap();
        let locations = doc.locations();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0], "https://bd.example/ui/versions/123/components");
    }

    #[test]
    fn tolerates_unknown_and_missing_fields() {
        let doc: StatusDocument =
            serde_json::from_str(r#"{"projectName": "x", "detectors": [1, 2]}"#).unwrap();
        assert_eq!(doc.project_name, "x");
        assert!(doc.results.is_empty());
        assert!(doc.locations().is_empty());
    }

    #[test]
    fn finds_status_file_in_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("runs").join("2024-01-01");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("status.json"), SAMPLE).unwrap();

        let found = find_status_file(tmp.path()).unwrap();
        assert_eq!(found, Some(nested.join("status.json")));
    }

    #[test]
    fn prefers_file_in_current_directory_over_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("deeper");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("status.json"), "{}").unwrap();
        fs::write(tmp.path().join("status.json"), SAMPLE).unwrap();

        let found = find_status_file(tmp.path()).unwrap().unwrap();
        assert_eq!(found, tmp.path().join("status.json"));
    }

    #[test]
    fn returns_none_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("empty")).unwrap();
        assert!(find_status_file(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn load_reports_parse_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("status.json");
        fs::write(&path, "not json").unwrap();
        let err = load_status_document(&path).unwrap_err();
        assert!(matches!(err, StatusFileError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_status_document(Path::new("/nonexistent/status.json")).unwrap_err();
        assert!(matches!(err, StatusFileError::Io(_)));
    }
}
