//! 스캔 커맨드 빌더 — 설정을 외부 스캐너 인자 목록으로 매핑
//!
//! 순수 함수 계층입니다. 공유 상태를 변경하지 않으며, 에러는
//! 이미지 참조 파싱 실패에서만 발생합니다.
//!
//! 옵션명 → 플래그 매핑은 아래에 명시적으로 열거되어 있습니다.
//! passthrough 플래그는 값이 비어 있으면 전달하지 않습니다.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use xray_core::types::{ImageRef, sanitize};

use crate::config::{DEFAULT_INSPECTOR_SERVICE_URL, ScannerConfig};

/// 외부 스캐너 passthrough 플래그명
const OFFLINE_MODE_FLAG: &str = "blackduck.offline.mode";
const SERVER_URL_FLAG: &str = "blackduck.url";
const API_TOKEN_FLAG: &str = "blackduck.api.token";
const PROJECT_NAME_FLAG: &str = "detect.project.name";
const PROJECT_VERSION_FLAG: &str = "detect.project.version.name";

/// 스캔 하나의 전체 호출 인자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanInvocation {
    /// 실행할 프로그램 (스캐너 스크립트 경로)
    pub program: PathBuf,
    /// 인자 목록
    pub args: Vec<String>,
}

/// 스캔별 고유 출력 디렉토리 경로를 만듭니다.
///
/// `<output_root>/<sanitized image>_<epoch millis>_<uuid 앞 8자>` 형태로,
/// 동일한 이미지를 동시에 두 번 스캔해도 충돌하지 않습니다.
pub fn unique_output_dir(output_root: &Path, image: &ImageRef) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let dir_name = format!(
        "{}_{}_{}",
        sanitize(image.as_str()),
        millis,
        &suffix[..8]
    );
    output_root.join(dir_name)
}

/// 프로젝트명과 프로젝트 버전명을 도출합니다.
///
/// 재정의가 있으면 프로젝트명은 그대로 사용하고 버전명은
/// `{이미지명}_{태그}`를 정규화한 값, 없으면 프로젝트명 = 이미지명,
/// 버전명 = 태그입니다.
pub fn project_names(image: &ImageRef, override_name: Option<&str>) -> (String, String) {
    match override_name {
        Some(name) => (
            name.to_owned(),
            sanitize(&format!("{}_{}", image.name, image.tag)),
        ),
        None => (image.name.clone(), image.tag.clone()),
    }
}

/// 이미지 하나에 대한 스캐너 호출 인자를 만듭니다.
///
/// 인자 순서: 전역 기본 플래그 → passthrough 플래그 → 프로젝트 플래그
/// → 인스펙터 서비스 플래그 → 스캔 대상 플래그.
pub fn build_scan_invocation(
    image: &ImageRef,
    config: &ScannerConfig,
    output_dir: &Path,
) -> ScanInvocation {
    let mut args = Vec::new();

    // 전역 기본 플래그: status.json 유지를 위해 cleanup은 항상 끔
    args.push("--detect.cleanup=false".to_owned());
    args.push("--blackduck.trust.cert=true".to_owned());
    args.push(format!(
        "--detect.tools.output.path={}",
        config.tools_dir.display()
    ));
    args.push(format!("--detect.output.path={}", output_dir.display()));

    // passthrough 플래그 (빈 값은 전달하지 않음)
    if config.offline_mode {
        args.push(format!("--{OFFLINE_MODE_FLAG}=true"));
    }
    if !config.server_url.is_empty() {
        args.push(format!("--{SERVER_URL_FLAG}={}", config.server_url));
    }
    if !config.api_token.is_empty() {
        args.push(format!("--{API_TOKEN_FLAG}={}", config.api_token));
    }

    // 프로젝트 식별 플래그
    let (project, version) = project_names(image, config.project_name.as_deref());
    args.push(format!("--{PROJECT_NAME_FLAG}={project}"));
    args.push(format!("--{PROJECT_VERSION_FLAG}={version}"));

    // 호스트에 상주하는 이미지 인스펙터 서비스에 접속
    if config.use_inspector_services {
        args.push("--detect.docker.path.required=false".to_owned());
        args.push(format!(
            "--detect.docker.passthrough.imageinspector.service.url={DEFAULT_INSPECTOR_SERVICE_URL}"
        ));
        args.push("--detect.docker.passthrough.imageinspector.service.start=false".to_owned());
        args.push(format!(
            "--detect.docker.passthrough.shared.dir.path.local={}/shared",
            config.output_root.display()
        ));
    }

    // 스캔 대상
    args.push(format!("--detect.docker.image={}", image.as_str()));

    ScanInvocation {
        program: config.detect_path.clone(),
        args,
    }
}
