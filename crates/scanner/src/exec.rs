//! 외부 프로세스 실행 추상화
//!
//! [`CommandRunner`] 트레이트는 프로세스 실행을 추상화하여, 프로덕션
//! 코드는 [`TokioCommandRunner`]를 쓰고 테스트는 `MockCommandRunner`로
//! 실제 스캐너 없이 검증할 수 있게 합니다.
//!
//! 두 가지 실행 모드를 지원합니다:
//! - 버퍼 모드: stdout/stderr을 모아 두었다가 실패 시에만 노출
//! - 스트리밍 모드: 실행 중 각 라인을 로그로 바로 흘려보냄 (trace 수준
//!   진단용)

#[cfg(test)]
use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
#[cfg(test)]
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// 프로세스 실행 결과
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// 표준 출력 전문
    pub stdout: String,
    /// 표준 에러 전문
    pub stderr: String,
    /// 종료 코드. 시그널로 종료되면 None.
    pub status_code: Option<i32>,
}

impl CommandOutput {
    /// 종료 코드 0으로 정상 종료했는지 여부
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }
}

/// 프로세스 실행 트레이트
///
/// 스캔 워커와 인스펙터 서비스가 이 트레이트를 통해서만 외부
/// 프로세스를 실행합니다. `Send + Sync + 'static` 바운드로 async 태스크
/// 간 안전한 공유가 가능합니다.
///
/// # Errors
///
/// 프로세스 spawn 자체가 실패한 경우에만 에러를 반환합니다. 프로세스가
/// 실행됐지만 0이 아닌 코드로 종료한 경우는 `Ok`이며, 호출자가
/// [`CommandOutput::success`]로 판정합니다.
pub trait CommandRunner: Send + Sync + 'static {
    /// 프로그램을 인자와 함께 실행하고 완료까지 기다립니다.
    ///
    /// `streamed`가 true면 stdout/stderr 각 라인을 실행 중 로그로
    /// 내보내면서 동시에 수집하고, false면 조용히 버퍼링만 합니다.
    fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
        streamed: bool,
    ) -> impl Future<Output = Result<CommandOutput, std::io::Error>> + Send;
}

/// tokio::process 기반 프로덕션 구현
///
/// 모든 자식 프로세스는 `kill_on_drop`으로 생성되어, 취소로 태스크가
/// drop되면 실행 중인 프로세스도 함께 종료됩니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
        streamed: bool,
    ) -> Result<CommandOutput, std::io::Error> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.kill_on_drop(true);

        if !streamed {
            let output = cmd.output().await?;
            return Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                status_code: output.status.code(),
            });
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        let mut child = cmd.spawn()?;

        let stdout_task = tokio::spawn(stream_lines(child.stdout.take(), false));
        let stderr_task = tokio::spawn(stream_lines(child.stderr.take(), true));

        let status = child.wait().await?;
        let stdout = stdout_task.await.map_err(std::io::Error::other)?;
        let stderr = stderr_task.await.map_err(std::io::Error::other)?;

        Ok(CommandOutput {
            stdout,
            stderr,
            status_code: status.code(),
        })
    }
}

/// 파이프에서 라인 단위로 읽어 로그로 흘리면서 전문을 수집합니다.
async fn stream_lines<R>(reader: Option<R>, is_stderr: bool) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        return String::new();
    };
    let mut lines = BufReader::new(reader).lines();
    let mut collected = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            tracing::warn!("{line}");
        } else {
            tracing::info!("{line}");
        }
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}

/// 테스트용 Mock 커맨드 러너
///
/// 큐에 쌓아 둔 응답을 순서대로 반환하고, 수신한 호출을 기록합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockCommandRunner {
    responses: std::sync::Mutex<VecDeque<Result<CommandOutput, String>>>,
    calls: std::sync::Mutex<Vec<RecordedCall>>,
}

/// Mock이 기록한 호출 하나
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub streamed: bool,
}

#[cfg(test)]
impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 정상 종료 응답을 큐에 추가합니다.
    pub fn push_success(&self, stdout: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(CommandOutput {
                stdout: stdout.to_owned(),
                stderr: String::new(),
                status_code: Some(0),
            }));
    }

    /// 0이 아닌 코드로 종료하는 응답을 큐에 추가합니다.
    pub fn push_exit(&self, code: i32, stderr: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_owned(),
                status_code: Some(code),
            }));
    }

    /// spawn 실패를 시뮬레이션하는 응답을 큐에 추가합니다.
    pub fn push_spawn_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_owned()));
    }

    /// 지금까지 기록된 호출 목록을 복사해 반환합니다.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl CommandRunner for MockCommandRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        _cwd: Option<&Path>,
        streamed: bool,
    ) -> Result<CommandOutput, std::io::Error> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_path_buf(),
            args: args.to_vec(),
            streamed,
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(std::io::Error::other(message)),
            // 큐가 비면 빈 출력으로 정상 종료한 것으로 처리
            None => Ok(CommandOutput {
                status_code: Some(0),
                ..CommandOutput::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_output_success_requires_zero_exit() {
        let ok = CommandOutput {
            status_code: Some(0),
            ..CommandOutput::default()
        };
        let failed = CommandOutput {
            status_code: Some(7),
            ..CommandOutput::default()
        };
        let killed = CommandOutput {
            status_code: None,
            ..CommandOutput::default()
        };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[tokio::test]
    async fn mock_runner_replays_queued_responses_in_order() {
        let runner = MockCommandRunner::new();
        runner.push_success("first");
        runner.push_exit(3, "boom");

        let out1 = runner
            .run(Path::new("/bin/scan"), &[], None, false)
            .await
            .unwrap();
        assert!(out1.success());
        assert_eq!(out1.stdout, "first");

        let out2 = runner
            .run(Path::new("/bin/scan"), &[], None, false)
            .await
            .unwrap();
        assert_eq!(out2.status_code, Some(3));
        assert_eq!(out2.stderr, "boom");
    }

    #[tokio::test]
    async fn mock_runner_records_calls() {
        let runner = MockCommandRunner::new();
        let args = vec!["--flag=1".to_owned()];
        runner
            .run(Path::new("/bin/scan"), &args, None, true)
            .await
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, PathBuf::from("/bin/scan"));
        assert_eq!(calls[0].args, args);
        assert!(calls[0].streamed);
    }

    #[tokio::test]
    async fn mock_runner_spawn_error() {
        let runner = MockCommandRunner::new();
        runner.push_spawn_error("no such file");
        let result = runner.run(Path::new("/bin/missing"), &[], None, false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn tokio_runner_buffered_captures_output() {
        let runner = TokioCommandRunner::new();
        let args = vec!["hello".to_owned()];
        let output = runner
            .run(Path::new("echo"), &args, None, false)
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn tokio_runner_streamed_collects_lines() {
        let runner = TokioCommandRunner::new();
        let output = runner
            .run(Path::new("printf"), &["one\ntwo\n".to_owned()], None, true)
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "one\ntwo\n");
    }

    #[tokio::test]
    async fn tokio_runner_nonzero_exit_is_ok_with_code() {
        let runner = TokioCommandRunner::new();
        let output = runner
            .run(Path::new("false"), &[], None, false)
            .await
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.status_code, Some(1));
    }
}
