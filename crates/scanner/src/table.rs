//! 스캔 결과 테이블 렌더러
//!
//! 렌더러 태스크가 모든 렌더링 상태를 단독 소유합니다. 결과가 하나
//! 도착할 때마다 지금까지의 전체 스냅샷을 다시 그리고, 결과 채널이
//! 닫히면 최종 테이블을 출력한 뒤 렌더링한 행 수를 done 신호로
//! 보냅니다. done 신호는 단 한 번만 발생합니다.

use std::collections::BTreeMap;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use xray_core::types::ScanResult;

use crate::version::ImageAdvisory;

const IMAGE_HEADER: &str = "IMAGE";
const LOCATION_HEADER: &str = "RESULT LOCATION";
const LATEST_HEADER: &str = "LATEST VERSION";

/// location 없는 성공 스캔의 표시값
const NO_LOCATION: &str = "(no result location)";
const NOT_LOOKED_UP: &str = "-";

#[derive(Debug, Default, Clone)]
struct Row {
    location: Option<String>,
    latest_version: Option<String>,
}

/// 결과와 권고 채널을 모두 소진할 때까지 테이블을 그립니다.
///
/// 권고 채널은 선택적이며, 권고를 기다리느라 결과 출력이 막히는 일은
/// 없습니다. 두 채널이 모두 닫히면 최종 스냅샷을 한 번 더 출력하고
/// 렌더링된 행 수를 `done`으로 보냅니다.
pub async fn render_scan_table(
    mut results: mpsc::Receiver<ScanResult>,
    mut advisories: Option<mpsc::Receiver<ImageAdvisory>>,
    done: oneshot::Sender<usize>,
) {
    let mut rows: BTreeMap<String, Row> = BTreeMap::new();
    let mut results_open = true;

    while results_open || advisories.is_some() {
        tokio::select! {
            maybe = results.recv(), if results_open => match maybe {
                Some(result) => {
                    debug!(image = %result.image, "rendering scan result row");
                    let row = rows.entry(result.image.as_str().to_owned()).or_default();
                    row.location = Some(
                        result.location.unwrap_or_else(|| NO_LOCATION.to_owned()),
                    );
                    println!("{}", format_table(&rows));
                }
                None => results_open = false,
            },
            maybe = recv_advisory(&mut advisories), if advisories.is_some() => match maybe {
                Some(advisory) => {
                    debug!(image = %advisory.image, "rendering version advisory");
                    rows.entry(advisory.image)
                        .or_default()
                        .latest_version = Some(advisory.latest_version);
                    println!("{}", format_table(&rows));
                }
                None => advisories = None,
            },
        }
    }

    println!("{}", format_table(&rows));
    // 스캔 결과가 도착한 행만 센다. 권고만 있는 행은 결과가 아니다.
    let rendered = rows.values().filter(|r| r.location.is_some()).count();
    let _ = done.send(rendered);
}

async fn recv_advisory(
    rx: &mut Option<mpsc::Receiver<ImageAdvisory>>,
) -> Option<ImageAdvisory> {
    match rx {
        Some(rx) => rx.recv().await,
        None => None,
    }
}

/// 현재 스냅샷 전체를 고정폭 텍스트 테이블로 만듭니다.
fn format_table(rows: &BTreeMap<String, Row>) -> String {
    let mut image_width = IMAGE_HEADER.len();
    let mut location_width = LOCATION_HEADER.len();
    let mut latest_width = LATEST_HEADER.len();
    for (image, row) in rows {
        image_width = image_width.max(image.len());
        location_width = location_width.max(display_location(row).len());
        latest_width = latest_width.max(display_latest(row).len());
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{IMAGE_HEADER:<image_width$}  {LOCATION_HEADER:<location_width$}  {LATEST_HEADER:<latest_width$}\n"
    ));
    out.push_str(&format!(
        "{}  {}  {}\n",
        "-".repeat(image_width),
        "-".repeat(location_width),
        "-".repeat(latest_width),
    ));
    for (image, row) in rows {
        out.push_str(&format!(
            "{image:<image_width$}  {:<location_width$}  {:<latest_width$}\n",
            display_location(row),
            display_latest(row),
        ));
    }
    out
}

fn display_location(row: &Row) -> &str {
    row.location.as_deref().unwrap_or(NOT_LOOKED_UP)
}

fn display_latest(row: &Row) -> &str {
    row.latest_version.as_deref().unwrap_or(NOT_LOOKED_UP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xray_core::types::ImageRef;

    fn result(raw: &str, location: Option<&str>) -> ScanResult {
        let image = ImageRef::parse(raw).unwrap();
        match location {
            Some(l) => ScanResult::with_location(image, l.to_owned()),
            None => ScanResult::without_location(image),
        }
    }

    #[tokio::test]
    async fn done_fires_once_with_row_count() {
        let (result_tx, result_rx) = mpsc::channel(8);
        let (done_tx, done_rx) = oneshot::channel();
        let renderer = tokio::spawn(render_scan_table(result_rx, None, done_tx));

        result_tx
            .send(result("alpine:3.18", Some("https://bd/1")))
            .await
            .unwrap();
        result_tx.send(result("busybox:1.36", None)).await.unwrap();
        drop(result_tx);

        assert_eq!(done_rx.await.unwrap(), 2);
        renderer.await.unwrap();
    }

    #[tokio::test]
    async fn empty_batch_renders_zero_rows() {
        let (result_tx, result_rx) = mpsc::channel::<ScanResult>(1);
        let (done_tx, done_rx) = oneshot::channel();
        let renderer = tokio::spawn(render_scan_table(result_rx, None, done_tx));
        drop(result_tx);

        assert_eq!(done_rx.await.unwrap(), 0);
        renderer.await.unwrap();
    }

    #[tokio::test]
    async fn advisory_only_rows_are_not_counted_as_results() {
        let (result_tx, result_rx) = mpsc::channel(8);
        let (advisory_tx, advisory_rx) = mpsc::channel(8);
        let (done_tx, done_rx) = oneshot::channel();
        let renderer = tokio::spawn(render_scan_table(result_rx, Some(advisory_rx), done_tx));

        advisory_tx
            .send(ImageAdvisory {
                image: "alpine:3.18".to_owned(),
                latest_version: "3.20.1".to_owned(),
            })
            .await
            .unwrap();
        result_tx
            .send(result("busybox:1.36", Some("https://bd/2")))
            .await
            .unwrap();
        drop(result_tx);
        drop(advisory_tx);

        assert_eq!(done_rx.await.unwrap(), 1);
        renderer.await.unwrap();
    }

    #[tokio::test]
    async fn advisory_merges_into_existing_result_row() {
        let (result_tx, result_rx) = mpsc::channel(8);
        let (advisory_tx, advisory_rx) = mpsc::channel(8);
        let (done_tx, done_rx) = oneshot::channel();
        let renderer = tokio::spawn(render_scan_table(result_rx, Some(advisory_rx), done_tx));

        result_tx
            .send(result("alpine:3.18", Some("https://bd/1")))
            .await
            .unwrap();
        advisory_tx
            .send(ImageAdvisory {
                image: "alpine:3.18".to_owned(),
                latest_version: "3.20.1".to_owned(),
            })
            .await
            .unwrap();
        drop(result_tx);
        drop(advisory_tx);

        assert_eq!(done_rx.await.unwrap(), 1);
        renderer.await.unwrap();
    }

    #[test]
    fn format_table_aligns_columns_and_sorts_by_image() {
        let mut rows = BTreeMap::new();
        rows.insert(
            "zlib:1.3".to_owned(),
            Row {
                location: Some("https://bd/long-location-url".to_owned()),
                latest_version: None,
            },
        );
        rows.insert(
            "alpine:3.18".to_owned(),
            Row {
                location: None,
                latest_version: Some("3.20.1".to_owned()),
            },
        );

        let rendered = format_table(&rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with(IMAGE_HEADER));
        assert!(lines[2].starts_with("alpine:3.18"));
        assert!(lines[3].starts_with("zlib:1.3"));
        assert!(lines[2].contains("3.20.1"));
        assert!(lines[3].contains("https://bd/long-location-url"));
    }

    #[test]
    fn format_table_shows_placeholder_for_missing_location() {
        let mut rows = BTreeMap::new();
        rows.insert(
            "alpine:3.18".to_owned(),
            Row {
                location: Some(NO_LOCATION.to_owned()),
                latest_version: None,
            },
        );
        let rendered = format_table(&rows);
        assert!(rendered.contains(NO_LOCATION));
    }
}
