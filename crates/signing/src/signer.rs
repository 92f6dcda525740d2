//! JSON 결과의 키리스(keyless) 서명
//!
//! 서명과 투명성 로그 기록은 `cosign sign-blob`에 위임합니다.
//! cosign은 CI 작업의 연합 신원으로 OIDC 토큰을 비대화식으로 얻고,
//! Fulcio에서 단기 인증서를 발급받아 파일에 서명한 뒤 Rekor에 기록합니다.
//! cosign이 출력하는 서명과 인증서는 버립니다. 검증 시에는 게시된
//! 페이로드와 투명성 로그로 모두 다시 구성합니다.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::SignError;
use crate::redact::sanitize_tool_stderr;

/// 기본 서명 인증서 발급 기관
pub const DEFAULT_FULCIO_URL: &str = "https://fulcio.sigstore.dev";
/// 기본 투명성 로그
pub const DEFAULT_REKOR_URL: &str = "https://rekor.sigstore.dev";
/// Fulcio용 신원 토큰을 얻는 기본 OIDC 제공자
pub const DEFAULT_OIDC_ISSUER: &str = "https://oauth2.sigstore.dev/auth";
/// 발급자에 제시하는 OIDC 클라이언트 ID
pub const DEFAULT_OIDC_CLIENT_ID: &str = "sigstore";
/// cosign 자체 기본 제한 시간과 동일
pub const DEFAULT_SIGN_TIMEOUT: Duration = Duration::from_secs(180);

/// 고정된 서명 서비스 좌표
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    /// Fulcio URL
    pub fulcio_url: String,
    /// Rekor URL
    pub rekor_url: String,
    /// OIDC 발급자 URL
    pub oidc_issuer: String,
    /// OIDC 클라이언트 ID
    pub oidc_client_id: String,
    /// 이 호출에 한해 cosign 실험적 키리스 모드 활성화
    pub experimental: bool,
    /// 서명 호출 전체 제한 시간
    pub timeout: Duration,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            fulcio_url: DEFAULT_FULCIO_URL.to_owned(),
            rekor_url: DEFAULT_REKOR_URL.to_owned(),
            oidc_issuer: DEFAULT_OIDC_ISSUER.to_owned(),
            oidc_client_id: DEFAULT_OIDC_CLIENT_ID.to_owned(),
            experimental: true,
            timeout: DEFAULT_SIGN_TIMEOUT,
        }
    }
}

impl SignOptions {
    /// `results_file`에 대한 `cosign sign-blob` 인자
    pub fn sign_blob_args(&self, results_file: &Path) -> Vec<String> {
        vec![
            "sign-blob".to_owned(),
            "--yes".to_owned(),
            format!("--fulcio-url={}", self.fulcio_url),
            format!("--rekor-url={}", self.rekor_url),
            format!("--oidc-issuer={}", self.oidc_issuer),
            format!("--oidc-client-id={}", self.oidc_client_id),
            format!("--timeout={}s", self.timeout.as_secs()),
            results_file.display().to_string(),
        ]
    }

    /// 서명 자식 프로세스에만 설정하는 환경 변수
    pub fn child_env(&self) -> Vec<(&'static str, &'static str)> {
        if self.experimental {
            vec![("COSIGN_EXPERIMENTAL", "1")]
        } else {
            Vec::new()
        }
    }
}

/// 파일에 대한 분리 서명과 투명성 로그 항목 생성
pub trait Signer: Send + Sync {
    /// `results_file` 서명. 성공 여부만 반환합니다.
    fn sign(&self, results_file: &Path) -> impl Future<Output = Result<(), SignError>> + Send;
}

/// `cosign sign-blob` 실행 기반 서명자
#[derive(Debug, Clone)]
pub struct CosignSigner {
    program: PathBuf,
    options: SignOptions,
}

impl Default for CosignSigner {
    fn default() -> Self {
        Self::new(SignOptions::default())
    }
}

impl CosignSigner {
    /// `PATH`의 `cosign`을 사용하는 서명자 생성
    pub fn new(options: SignOptions) -> Self {
        Self {
            program: PathBuf::from("cosign"),
            options,
        }
    }

    /// 지정한 cosign 실행 파일 사용
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl Signer for CosignSigner {
    async fn sign(&self, results_file: &Path) -> Result<(), SignError> {
        if !tokio::fs::try_exists(results_file).await.unwrap_or(false) {
            return Err(SignError::MissingInput {
                path: results_file.to_path_buf(),
            });
        }

        let args = self.options.sign_blob_args(results_file);
        debug!(program = %self.program.display(), ?args, "spawning signer");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .envs(self.options.child_env())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.options.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| SignError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?,
            Err(_) => {
                return Err(SignError::Timeout {
                    timeout: self.options.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(SignError::Failed {
                status: output.status,
                stderr: sanitize_tool_stderr(&output.stderr),
            });
        }

        info!(
            path = %results_file.display(),
            rekor = %self.options.rekor_url,
            "results signed and recorded in transparency log"
        );
        Ok(())
    }
}
