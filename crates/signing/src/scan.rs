//! 스캔 엔진 실행
//!
//! [`ScanEngine`] 트레이트는 scorecard 바이너리를 추상화하여 바이너리 없이도
//! 드라이버를 테스트할 수 있게 합니다. [`ScanInvoker`]는 사용자 출력 설정
//! 그대로, 또는 JSON으로 강제한 파생 설정으로 엔진을 실행합니다.
//!
//! # 설정은 프로세스 상태가 아닌 값
//!
//! 출력 설정은 [`ScanSettings`]에 담겨 전달됩니다. JSON 재실행은
//! [`ScanSettings::forced_json`]이 만든 사본을 사용하고, 엔진은 자식 프로세스의
//! 인자와 환경 변수로만 설정을 넘깁니다. 부모 프로세스는 변경되지 않으므로
//! 재실행 성공 여부와 무관하게 복원할 상태가 없습니다.
//!
//! ```text
//! ActionConfig ──► ScanSettings ──► run_primary ──► results.sarif
//!                       │
//!                       └── forced_json() ──► run_json ──► results.json ──► Vec<u8>
//! ```

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use scorecard_action_core::config::ActionConfig;
use scorecard_action_core::error::ConfigError;
use scorecard_action_core::types::ResultsFormat;

use crate::error::ScanError;
use crate::redact::sanitize_tool_stderr;

/// JSON 재실행 결과 파일 이름
pub const JSON_RESULTS_FILE: &str = "results.json";

/// scorecard 바이너리가 GitHub 토큰을 읽는 환경 변수
const SCORECARD_TOKEN_ENV: &str = "GITHUB_AUTH_TOKEN";

/// 스캔 엔진 1회 실행의 출력 및 대상 설정
#[derive(Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// 스캔 엔진 실행 파일
    pub program: String,
    /// `owner/repo`. 비어 있으면 작업 디렉토리를 스캔
    pub repository: String,
    /// 결과 파일 경로
    pub results_file: PathBuf,
    /// 출력 형식
    pub format: ResultsFormat,
    /// 검사별 상세 정보 포함 여부
    pub show_details: bool,
    /// scorecard 정책 파일 (선택)
    pub policy_file: Option<PathBuf>,
    /// 엔진에 전달하는 토큰. 로그에 남기지 않음
    pub token: String,
}

impl ScanSettings {
    /// 사용자 설정에서 스캔 설정 생성
    pub fn from_config(config: &ActionConfig) -> Result<Self, ConfigError> {
        let policy_file = match config.scan.policy_file.trim() {
            "" => None,
            path => Some(PathBuf::from(path)),
        };

        Ok(Self {
            program: config.scan.program.clone(),
            repository: config.repository.name.clone(),
            results_file: PathBuf::from(&config.scan.results_file),
            format: config.scan.format()?,
            show_details: config.scan.show_details,
            policy_file,
            token: config.repository.token.clone(),
        })
    }

    /// `results_file`에 JSON을 쓰는 사본 반환
    pub fn forced_json(&self, results_file: impl Into<PathBuf>) -> Self {
        Self {
            results_file: results_file.into(),
            format: ResultsFormat::Json,
            ..self.clone()
        }
    }

    /// scorecard 바이너리 명령줄 인자
    pub fn engine_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(5);
        if self.repository.is_empty() {
            args.push("--local=.".to_owned());
        } else {
            args.push(format!("--repo=github.com/{}", self.repository));
        }
        args.push(format!("--format={}", self.format));
        if self.show_details {
            args.push("--show-details".to_owned());
        }
        if let Some(policy) = &self.policy_file {
            args.push(format!("--policy={}", policy.display()));
        }
        args
    }
}

impl fmt::Debug for ScanSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSettings")
            .field("program", &self.program)
            .field("repository", &self.repository)
            .field("results_file", &self.results_file)
            .field("format", &self.format)
            .field("show_details", &self.show_details)
            .field("policy_file", &self.policy_file)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// 주어진 설정으로 결과 파일을 만드는 스캔 엔진
///
/// 구현체는 `Ok(())`를 반환할 때 `settings.results_file`에 결과를 남겨야 합니다.
pub trait ScanEngine: Send + Sync {
    /// 스캔 1회를 끝까지 실행
    fn run(&self, settings: &ScanSettings) -> impl Future<Output = Result<(), ScanError>> + Send;
}

/// scorecard 바이너리를 자식 프로세스로 실행하는 엔진
///
/// 엔진의 stdout이 결과이며, 프로세스가 성공적으로 종료되면 결과 파일에 기록합니다.
#[derive(Debug, Clone, Default)]
pub struct CommandScanEngine;

impl CommandScanEngine {
    /// 새 엔진 생성
    pub fn new() -> Self {
        Self
    }
}

impl ScanEngine for CommandScanEngine {
    async fn run(&self, settings: &ScanSettings) -> Result<(), ScanError> {
        let args = settings.engine_args();
        debug!(program = %settings.program, ?args, "spawning scan engine");

        let mut cmd = Command::new(&settings.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !settings.token.is_empty() {
            cmd.env(SCORECARD_TOKEN_ENV, &settings.token);
        }

        let output = cmd.output().await.map_err(|source| ScanError::Spawn {
            program: settings.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(ScanError::Execution {
                status: output.status,
                stderr: sanitize_tool_stderr(&output.stderr),
            });
        }

        write_results(&settings.results_file, &output.stdout).await?;
        debug!(
            path = %settings.results_file.display(),
            bytes = output.stdout.len(),
            "scan results written"
        );
        Ok(())
    }
}

async fn write_results(path: &Path, contents: &[u8]) -> Result<(), ScanError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ScanError::WriteResults {
                path: path.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ScanError::WriteResults {
            path: path.to_path_buf(),
            source,
        })
}

/// JSON 재실행 결과
#[derive(Debug, Clone)]
pub struct JsonResults {
    /// JSON이 기록된 파일 (서명 대상)
    pub path: PathBuf,
    /// 파일 원본 내용
    pub payload: Vec<u8>,
}

/// 사용자 설정 또는 JSON 강제 사본으로 스캔 엔진을 실행
pub struct ScanInvoker<E> {
    engine: E,
    json_results_file: PathBuf,
}

impl<E: ScanEngine> ScanInvoker<E> {
    /// JSON 재실행 결과를 [`JSON_RESULTS_FILE`]에 쓰는 실행기 생성
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            json_results_file: PathBuf::from(JSON_RESULTS_FILE),
        }
    }

    /// JSON 재실행 결과 경로 변경
    pub fn with_json_results_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_results_file = path.into();
        self
    }

    /// 사용자 출력 설정 그대로 스캔 실행
    pub async fn run_primary(&self, settings: &ScanSettings) -> Result<(), ScanError> {
        info!(
            format = %settings.format,
            path = %settings.results_file.display(),
            "running scorecard"
        );
        self.engine.run(settings).await
    }

    /// JSON으로 강제하여 재실행하고 파일 내용을 반환
    ///
    /// `settings`는 읽기만 하며 재실행은 파생 사본을 사용합니다.
    pub async fn run_json(&self, settings: &ScanSettings) -> Result<JsonResults, ScanError> {
        let json_settings = settings.forced_json(&self.json_results_file);
        info!(
            path = %json_settings.results_file.display(),
            "re-running scorecard for json results"
        );

        self.engine.run(&json_settings).await?;

        let payload = tokio::fs::read(&json_settings.results_file)
            .await
            .map_err(|source| ScanError::ResultRetrieval {
                path: json_settings.results_file.clone(),
                source,
            })?;

        Ok(JsonResults {
            path: json_settings.results_file,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// 실행 시 받은 설정을 기록하고 고정된 출력을 씁니다.
    #[derive(Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<ScanSettings>>,
        fail: bool,
        skip_write: bool,
    }

    impl ScanEngine for RecordingEngine {
        async fn run(&self, settings: &ScanSettings) -> Result<(), ScanError> {
            self.calls.lock().unwrap().push(settings.clone());
            if self.fail {
                return Err(ScanError::Execution {
                    status: failing_status(),
                    stderr: "mock failure".to_owned(),
                });
            }
            if !self.skip_write {
                let body = format!("{{\"format\":\"{}\"}}", settings.format);
                tokio::fs::write(&settings.results_file, body).await.unwrap();
            }
            Ok(())
        }
    }

    #[cfg(unix)]
    fn failing_status() -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(1 << 8)
    }

    #[cfg(windows)]
    fn failing_status() -> std::process::ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(1)
    }

    fn sample_settings(dir: &Path) -> ScanSettings {
        ScanSettings {
            program: "scorecard".to_owned(),
            repository: "octo/repo".to_owned(),
            results_file: dir.join("results.sarif"),
            format: ResultsFormat::Sarif,
            show_details: true,
            policy_file: None,
            token: "ghs_secret".to_owned(),
        }
    }

    #[test]
    fn from_config_maps_fields() {
        let mut config = ActionConfig::default();
        config.repository.name = "octo/repo".to_owned();
        config.repository.token = "tok".to_owned();
        config.scan.results_format = "json".to_owned();
        config.scan.policy_file = "policy.yml".to_owned();

        let settings = ScanSettings::from_config(&config).unwrap();
        assert_eq!(settings.repository, "octo/repo");
        assert_eq!(settings.format, ResultsFormat::Json);
        assert_eq!(settings.policy_file, Some(PathBuf::from("policy.yml")));
        assert_eq!(settings.token, "tok");
    }

    #[test]
    fn from_config_rejects_unknown_format() {
        let mut config = ActionConfig::default();
        config.scan.results_format = "xml".to_owned();
        assert!(ScanSettings::from_config(&config).is_err());
    }

    #[test]
    fn forced_json_leaves_original_untouched() {
        let original = sample_settings(Path::new("out"));
        let snapshot = original.clone();

        let json = original.forced_json("results.json");

        assert_eq!(original, snapshot);
        assert_eq!(json.format, ResultsFormat::Json);
        assert_eq!(json.results_file, PathBuf::from("results.json"));
        assert_eq!(json.repository, original.repository);
        assert_eq!(json.token, original.token);
    }

    #[test]
    fn engine_args_for_remote_repository() {
        let settings = sample_settings(Path::new("."));
        assert_eq!(
            settings.engine_args(),
            vec![
                "--repo=github.com/octo/repo".to_owned(),
                "--format=sarif".to_owned(),
                "--show-details".to_owned(),
            ]
        );
    }

    #[test]
    fn engine_args_for_local_scan_with_policy() {
        let mut settings = sample_settings(Path::new("."));
        settings.repository.clear();
        settings.show_details = false;
        settings.policy_file = Some(PathBuf::from("policy.yml"));
        assert_eq!(
            settings.engine_args(),
            vec![
                "--local=.".to_owned(),
                "--format=sarif".to_owned(),
                "--policy=policy.yml".to_owned(),
            ]
        );
    }

    #[test]
    fn debug_redacts_token() {
        let settings = sample_settings(Path::new("."));
        let debug = format!("{settings:?}");
        assert!(!debug.contains("ghs_secret"));
    }

    #[tokio::test]
    async fn run_json_returns_payload_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ScanInvoker::new(RecordingEngine::default())
            .with_json_results_file(dir.path().join("results.json"));
        let settings = sample_settings(dir.path());

        let results = invoker.run_json(&settings).await.unwrap();

        assert_eq!(results.path, dir.path().join("results.json"));
        assert_eq!(results.payload, br#"{"format":"json"}"#.to_vec());
        let calls = invoker.engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].format, ResultsFormat::Json);
    }

    #[tokio::test]
    async fn run_json_failure_leaves_settings_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RecordingEngine {
            fail: true,
            ..Default::default()
        };
        let invoker =
            ScanInvoker::new(engine).with_json_results_file(dir.path().join("results.json"));
        let settings = sample_settings(dir.path());
        let snapshot = settings.clone();

        let err = invoker.run_json(&settings).await.unwrap_err();

        assert!(matches!(err, ScanError::Execution { .. }));
        assert_eq!(settings, snapshot);
    }

    #[tokio::test]
    async fn run_json_missing_file_is_retrieval_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RecordingEngine {
            skip_write: true,
            ..Default::default()
        };
        let invoker =
            ScanInvoker::new(engine).with_json_results_file(dir.path().join("results.json"));

        let err = invoker
            .run_json(&sample_settings(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::ResultRetrieval { .. }));
    }

    #[tokio::test]
    async fn run_primary_uses_user_settings() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ScanInvoker::new(RecordingEngine::default());
        let settings = sample_settings(dir.path());

        invoker.run_primary(&settings).await.unwrap();

        let calls = invoker.engine.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), std::slice::from_ref(&settings));
        assert!(settings.results_file.exists());
    }

    #[tokio::test]
    async fn write_results_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/results.sarif");
        write_results(&path, b"{}").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
    }
}
