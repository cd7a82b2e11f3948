//! 스캔 배치 오케스트레이터
//!
//! 배치 하나의 전체 수명을 관리합니다: 스캐너 준비와 공유 서비스
//! 기동, 이미지당 워커 팬아웃, 결과 수집과 렌더링, 실패 시 일괄 취소,
//! 마지막으로 공유 서비스 정리까지.
//!
//! # 상태 전이
//!
//! ```text
//! Idle → ServicesStarting → Dispatching → Draining → Completed
//!                  │              │            │
//!                  └──────────────┴────────────┴──→ Cancelling → Completed
//! ```
//!
//! 첫 번째 하드 실패(취소가 아닌 에러)가 관측되면 공유 취소 토큰을
//! 당겨 나머지 워커를 중단시킵니다. 어떤 경로로 끝나든 공유 서비스
//! 정리는 정확히 한 번 수행됩니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use xray_core::types::ImageRef;
use xray_core::{ConfigError, ScanError};

use crate::config::ScannerConfig;
use crate::detect::ensure_scanner_present;
use crate::exec::{CommandRunner, TokioCommandRunner};
use crate::services::InspectorServices;
use crate::table::render_scan_table;
use crate::version::{ImageAdvisory, RegistryVersionClient, VersionLookup, lookup_advisory};
use crate::worker::{ensure_output_root, scan_image};

/// 워커가 모두 끝난 뒤 미완료 권고 조회에 허용하는 유예 시간
const ADVISORY_GRACE: Duration = Duration::from_secs(2);

/// 배치 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    ServicesStarting,
    Dispatching,
    Draining,
    Cancelling,
    Completed,
}

/// 완료된 배치의 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// 디스패치된 워커 수
    pub dispatched: usize,
    /// 렌더러가 실제로 출력한 결과 행 수
    pub rendered: usize,
}

/// [`ScanBatch`] 빌더
///
/// 기본값은 실제 프로세스 러너와 도커 허브 버전 조회입니다. 테스트는
/// [`runner`](Self::runner)로 mock을 주입합니다.
pub struct ScanBatchBuilder<R: CommandRunner, L: VersionLookup> {
    config: ScannerConfig,
    runner: Arc<R>,
    lookup: Option<Arc<L>>,
}

impl ScanBatchBuilder<TokioCommandRunner, RegistryVersionClient> {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            runner: Arc::new(TokioCommandRunner::new()),
            lookup: None,
        }
    }
}

impl<R: CommandRunner, L: VersionLookup> ScanBatchBuilder<R, L> {
    /// 외부 프로세스 러너를 교체합니다.
    pub fn runner<R2: CommandRunner>(self, runner: Arc<R2>) -> ScanBatchBuilder<R2, L> {
        ScanBatchBuilder {
            config: self.config,
            runner,
            lookup: self.lookup,
        }
    }

    /// 버전 권고 조회 구현을 지정합니다.
    ///
    /// 설정의 `lookup_latest_versions`가 꺼져 있으면 지정해도 쓰이지
    /// 않습니다.
    pub fn version_lookup<L2: VersionLookup>(self, lookup: Arc<L2>) -> ScanBatchBuilder<R, L2> {
        ScanBatchBuilder {
            config: self.config,
            runner: self.runner,
            lookup: Some(lookup),
        }
    }

    /// 설정을 검증하고 배치를 만듭니다.
    ///
    /// # Errors
    ///
    /// 설정 검증 실패 시 [`ConfigError`].
    pub fn build(self) -> Result<ScanBatch<R, L>, ConfigError> {
        self.config.validate()?;
        Ok(ScanBatch {
            config: Arc::new(self.config),
            runner: self.runner,
            lookup: self.lookup,
            cancel: CancellationToken::new(),
            state: BatchState::Idle,
        })
    }
}

/// 이미지 배치 하나를 스캔하는 오케스트레이터
pub struct ScanBatch<R: CommandRunner, L: VersionLookup> {
    config: Arc<ScannerConfig>,
    runner: Arc<R>,
    lookup: Option<Arc<L>>,
    cancel: CancellationToken,
    state: BatchState,
}

impl<R: CommandRunner, L: VersionLookup> ScanBatch<R, L> {
    /// 배치의 취소 토큰
    ///
    /// 외부에서 (예: ctrl-c 핸들러) 당기면 실행 중인 워커가 중단되고
    /// 배치는 취소 에러로 끝납니다.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    fn transition(&mut self, next: BatchState) {
        debug!(from = ?self.state, to = ?next, "batch state transition");
        self.state = next;
    }

    /// 배치를 끝까지 실행합니다.
    ///
    /// 이미지당 워커 하나를 띄우고, 결과를 렌더러로 모으고, 첫 하드
    /// 실패 시 나머지를 취소합니다. 반환 전에 렌더러의 done 신호를
    /// 기다리고 공유 서비스를 정리하므로, 반환 시점에는 모든 부수
    /// 작업이 끝나 있습니다.
    ///
    /// # Errors
    ///
    /// 준비 실패, 첫 번째 하드 워커 실패, 또는 전체 취소.
    pub async fn run(mut self, images: Vec<ImageRef>) -> Result<BatchSummary, ScanError> {
        self.transition(BatchState::ServicesStarting);

        ensure_scanner_present(&self.config).await?;
        ensure_output_root(&self.config.output_root).await?;

        let services = if self.config.use_inspector_services {
            let services = Arc::new(InspectorServices::new(
                Arc::clone(&self.runner),
                &self.config,
            ));
            if let Err(e) = services.start().await {
                // 부분적으로 시작된 컨테이너도 정리 대상
                if self.config.cleanup_services {
                    services.stop().await;
                }
                self.transition(BatchState::Completed);
                return Err(e);
            }
            Some(services)
        } else {
            None
        };

        let result = self.dispatch_and_drain(&images).await;

        if let Some(services) = services {
            if self.config.cleanup_services {
                services.stop().await;
            } else {
                info!("leaving inspector services running (cleanup disabled)");
            }
        }

        self.transition(BatchState::Completed);
        result
    }

    async fn dispatch_and_drain(
        &mut self,
        images: &[ImageRef],
    ) -> Result<BatchSummary, ScanError> {
        let dispatched = images.len();

        let (result_tx, result_rx) = mpsc::channel(dispatched.max(1));
        let (done_tx, done_rx) = oneshot::channel();

        let lookup = match &self.lookup {
            Some(lookup) if self.config.lookup_latest_versions => Some(Arc::clone(lookup)),
            _ => None,
        };
        let (advisory_tx, advisory_rx) = match &lookup {
            Some(_) => {
                let (tx, rx) = mpsc::channel::<ImageAdvisory>(dispatched.max(1));
                (Some(tx), Some(rx))
            }
            None => (None, None),
        };

        let renderer = tokio::spawn(render_scan_table(result_rx, advisory_rx, done_tx));

        self.transition(BatchState::Dispatching);
        let mut workers: JoinSet<Result<(), ScanError>> = JoinSet::new();
        for image in images {
            info!(image = %image, "dispatching scan worker");
            let runner = Arc::clone(&self.runner);
            let config = Arc::clone(&self.config);
            let token = self.cancel.clone();
            let tx = result_tx.clone();
            let image = image.clone();
            workers.spawn(async move {
                let result = scan_image(runner.as_ref(), &config, &image, &token).await?;
                tokio::select! {
                    _ = token.cancelled() => Err(ScanError::Cancelled {
                        image: image.as_str().to_owned(),
                    }),
                    sent = tx.send(result) => {
                        sent.map_err(|e| ScanError::Channel(format!("result channel closed: {e}")))
                    }
                }
            });
        }
        drop(result_tx);

        let mut advisory_tasks: JoinSet<()> = JoinSet::new();
        if let (Some(lookup), Some(advisory_tx)) = (lookup, advisory_tx) {
            for image in images {
                let lookup = Arc::clone(&lookup);
                let tx = advisory_tx.clone();
                let token = self.cancel.clone();
                let image = image.clone();
                advisory_tasks.spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        advisory = lookup_advisory(lookup.as_ref(), &image) => {
                            if let Some(advisory) = advisory {
                                let _ = tx.send(advisory).await;
                            }
                        }
                    }
                });
            }
        }

        self.transition(BatchState::Draining);
        let mut first_hard: Option<ScanError> = None;
        let mut first_cancelled: Option<ScanError> = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_hard_failure() => {
                    error!(error = %e, "scan worker failed");
                    if first_hard.is_none() {
                        first_hard = Some(e);
                        self.transition(BatchState::Cancelling);
                        self.cancel.cancel();
                    }
                }
                Ok(Err(e)) => {
                    debug!(error = %e, "scan worker cancelled");
                    if first_cancelled.is_none() {
                        first_cancelled = Some(e);
                    }
                }
                Err(join_error) => {
                    error!(error = %join_error, "scan worker panicked");
                    if first_hard.is_none() {
                        first_hard = Some(ScanError::Channel(format!(
                            "scan worker panicked: {join_error}"
                        )));
                        self.transition(BatchState::Cancelling);
                        self.cancel.cancel();
                    }
                }
            }
        }

        // 권고 태스크는 best-effort: 유예 시간 안에 끝나지 않으면 버린다.
        // 조회 하나가 멈춰 있어도 배치 완료를 막지 못한다.
        let drained = tokio::time::timeout(ADVISORY_GRACE, async {
            while let Some(joined) = advisory_tasks.join_next().await {
                if let Err(join_error) = joined {
                    warn!(error = %join_error, "version advisory task panicked");
                }
            }
        })
        .await;
        if drained.is_err() {
            debug!(
                remaining = advisory_tasks.len(),
                "abandoning unfinished version advisory lookups"
            );
            advisory_tasks.abort_all();
            while let Some(joined) = advisory_tasks.join_next().await {
                if let Err(join_error) = joined {
                    if !join_error.is_cancelled() {
                        warn!(error = %join_error, "version advisory task panicked");
                    }
                }
            }
        }

        let rendered = done_rx
            .await
            .map_err(|e| ScanError::Channel(format!("renderer exited early: {e}")))?;
        if let Err(join_error) = renderer.await {
            return Err(ScanError::Channel(format!(
                "renderer panicked: {join_error}"
            )));
        }

        // 외부 취소만 있었던 경우도 에러로 끝난다
        if self.cancel.is_cancelled() && first_hard.is_none() && first_cancelled.is_none() {
            first_cancelled = Some(ScanError::Cancelled {
                image: "(batch)".to_owned(),
            });
        }

        match first_hard.or(first_cancelled) {
            Some(e) => Err(e),
            None => Ok(BatchSummary {
                dispatched,
                rendered,
            }),
        }
    }
}
