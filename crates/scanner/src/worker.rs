//! 이미지 하나를 스캔하는 워커
//!
//! 워커는 공유 상태를 갖지 않습니다. 고유 출력 디렉토리를 만들고,
//! 스캐너 프로세스를 실행한 뒤, 산출물에서 결과 location을 추출해
//! [`ScanResult`] 하나를 반환합니다. 취소 토큰이 당겨지면 실행 중인
//! 프로세스를 내리고 취소 에러로 끝납니다.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use xray_core::types::{ImageRef, ScanResult};
use xray_core::ScanError;

use crate::command::{build_scan_invocation, unique_output_dir};
use crate::config::ScannerConfig;
use crate::exec::{CommandOutput, CommandRunner};
use crate::status::{find_status_file, load_status_document, StatusFileError};

/// 에러 사유에 담을 스캐너 출력 꼬리 라인 수
const OUTPUT_TAIL_LINES: usize = 5;

/// 이미지 하나를 스캔합니다.
///
/// 프로세스 기동 전과 완료 후 각각 취소를 확인하고, 실행 중에는
/// 취소 토큰과 경합시킵니다. 취소로 실행 future가 drop되면 자식
/// 프로세스도 함께 종료됩니다 (`kill_on_drop`).
///
/// 결과 location이 없는 스캔은 에러가 아니라 location 없는 결과입니다.
/// 오프라인 스캔이 대표적인 경우입니다.
///
/// # Errors
///
/// - [`ScanError::Cancelled`] — 취소 토큰 관측
/// - [`ScanError::ProcessExecution`] — 스캐너가 0이 아닌 코드로 종료
/// - [`ScanError::ArtifactNotFound`] / [`ScanError::ArtifactParse`] —
///   산출물 탐색/파싱 실패
pub async fn scan_image<R: CommandRunner>(
    runner: &R,
    config: &ScannerConfig,
    image: &ImageRef,
    cancel: &CancellationToken,
) -> Result<ScanResult, ScanError> {
    let output_dir = unique_output_dir(&config.output_root, image);
    scan_image_in(runner, config, image, cancel, &output_dir).await
}

/// 주어진 출력 디렉토리에서 스캔을 수행합니다.
async fn scan_image_in<R: CommandRunner>(
    runner: &R,
    config: &ScannerConfig,
    image: &ImageRef,
    cancel: &CancellationToken,
    output_dir: &Path,
) -> Result<ScanResult, ScanError> {
    if cancel.is_cancelled() {
        return Err(cancelled(image));
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| ScanError::Io {
            path: output_dir.display().to_string(),
            source,
        })?;
    debug!(image = %image, output_dir = %output_dir.display(), "scan output directory ready");

    let invocation = build_scan_invocation(image, config, output_dir);
    info!(image = %image, "starting scan");

    let output = tokio::select! {
        _ = cancel.cancelled() => return Err(cancelled(image)),
        result = runner.run(&invocation.program, &invocation.args, None, config.stream_output) => {
            result.map_err(|e| ScanError::ProcessExecution {
                image: image.as_str().to_owned(),
                reason: format!("failed to spawn scanner: {e}"),
            })?
        }
    };

    if cancel.is_cancelled() {
        return Err(cancelled(image));
    }

    if !output.success() {
        return Err(ScanError::ProcessExecution {
            image: image.as_str().to_owned(),
            reason: failure_reason(&output),
        });
    }

    debug!(image = %image, "locating scan status file");
    let status_path = find_status_file(output_dir)
        .map_err(|source| ScanError::Io {
            path: output_dir.display().to_string(),
            source,
        })?
        .ok_or_else(|| ScanError::ArtifactNotFound {
            image: image.as_str().to_owned(),
            search_root: output_dir.display().to_string(),
        })?;

    let document = load_status_document(&status_path).map_err(|e| match e {
        StatusFileError::Io(source) => ScanError::Io {
            path: status_path.display().to_string(),
            source,
        },
        StatusFileError::Parse(parse) => ScanError::ArtifactParse {
            image: image.as_str().to_owned(),
            path: status_path.display().to_string(),
            reason: parse.to_string(),
        },
    })?;

    let locations = document.locations();
    match locations.into_iter().next() {
        Some(location) => {
            info!(image = %image, %location, "scan finished");
            Ok(ScanResult::with_location(image.clone(), location))
        }
        None => {
            info!(image = %image, "scan finished without a result location");
            Ok(ScanResult::without_location(image.clone()))
        }
    }
}

fn cancelled(image: &ImageRef) -> ScanError {
    ScanError::Cancelled {
        image: image.as_str().to_owned(),
    }
}

/// 실패한 프로세스 출력에서 사람이 읽을 사유를 만듭니다.
fn failure_reason(output: &CommandOutput) -> String {
    let source = if output.stderr.trim().is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    let mut tail: Vec<&str> = source.lines().rev().take(OUTPUT_TAIL_LINES).collect();
    tail.reverse();
    match output.status_code {
        Some(code) => format!("exit code {code}: {}", tail.join(" | ")),
        None => format!("terminated by signal: {}", tail.join(" | ")),
    }
}

/// 배치 준비 단계에서 출력 루트를 한 번 만들어 둡니다.
pub async fn ensure_output_root(root: &Path) -> Result<(), ScanError> {
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|source| ScanError::Io {
            path: root.display().to_string(),
            source,
        })
}
