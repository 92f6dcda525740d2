//! 설정 관리: 액션 입력 환경변수 및 선택적 TOML 파일 파싱
//!
//! [`ActionConfig`]는 실행 한 번에 필요한 모든 설정을 담는 최상위 구조체입니다.
//! 각 단계(스캔, 서명, 게시)는 이 값을 참조로 전달받아 사용하며,
//! 실행 도중 프로세스 환경변수를 변경하지 않습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`INPUT_RESULTS_FORMAT=json` 형식, GitHub Actions 입력 규약)
//! 3. 설정 파일 (`scorecard-action.toml`, 선택)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), scorecard_action_core::error::ActionError> {
//! use scorecard_action_core::config::ActionConfig;
//!
//! // 환경변수만으로 로드
//! let config = ActionConfig::from_env()?;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ActionConfig::load("scorecard-action.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ActionConfig::parse("[publish]\nenabled = true")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ActionError, ConfigError};
use crate::types::{ResultsFormat, is_repo_slug};

// --- 환경변수 이름 ---

/// 게시 활성화 플래그 (`"true"`일 때만 활성화)
pub const ENV_PUBLISH_RESULTS: &str = "INPUT_PUBLISH_RESULTS";
/// `owner/repo` 형식의 저장소 이름
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
/// 대상 ref
pub const ENV_GITHUB_REF: &str = "GITHUB_REF";
/// 저장소 접근 토큰
pub const ENV_REPO_TOKEN: &str = "INPUT_REPO_TOKEN";
/// 결과 파일 경로
pub const ENV_RESULTS_FILE: &str = "INPUT_RESULTS_FILE";
/// 결과 출력 형식
pub const ENV_RESULTS_FORMAT: &str = "INPUT_RESULTS_FORMAT";
/// 게시 API 기본 URL
pub const ENV_PUBLISH_BASE_URL: &str = "INPUT_INTERNAL_PUBLISH_BASE_URL";
/// scorecard 정책 파일
pub const ENV_POLICY_FILE: &str = "INPUT_POLICY_FILE";
/// scorecard 실행 파일 경로
pub const ENV_SCORECARD_BIN: &str = "SCORECARD_BIN";
/// 로그 레벨
pub const ENV_LOG_LEVEL: &str = "SCORECARD_ACTION_LOG_LEVEL";
/// 로그 형식
pub const ENV_LOG_FORMAT: &str = "SCORECARD_ACTION_LOG_FORMAT";

/// 기본 게시 API 주소
pub const DEFAULT_PUBLISH_BASE_URL: &str = "https://api.securityscorecards.dev";

/// scorecard-action 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 설정
    #[serde(default)]
    pub scan: ScanConfig,
    /// 대상 저장소 정보
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// 게시 설정
    #[serde(default)]
    pub publish: PublishConfig,
}

impl ActionConfig {
    /// 기본값에 환경변수 오버라이드를 적용하고 검증합니다.
    ///
    /// GitHub Actions 안에서는 모든 입력이 환경변수로 전달되므로
    /// 설정 파일 없이 이 경로가 일반적입니다.
    pub fn from_env() -> Result<Self, ActionError> {
        let mut config = Self::default();
        for warning in config.apply_env_overrides() {
            warning.log();
        }
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ActionError> {
        let mut config = Self::from_file(path).await?;
        for warning in config.apply_env_overrides() {
            warning.log();
        }
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ActionError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ActionError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ActionError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ActionError> {
        toml::from_str(toml_str).map_err(|e| {
            ActionError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 프로세스 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 반환된 경고는 로깅이 초기화된 뒤 호출자가 기록합니다.
    pub fn apply_env_overrides(&mut self) -> Vec<OverrideWarning> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정값을 오버라이드합니다.
    ///
    /// 조회 결과가 `None`인 키는 기존 값을 유지합니다. 해석할 수 없는 값은
    /// 기본 해석을 적용하고 [`OverrideWarning`]으로 돌려줍니다.
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<OverrideWarning> {
        let mut warnings = Vec::new();

        // General
        override_string(&mut self.general.log_level, ENV_LOG_LEVEL, &lookup);
        override_string(&mut self.general.log_format, ENV_LOG_FORMAT, &lookup);

        // Scan
        override_string(&mut self.scan.program, ENV_SCORECARD_BIN, &lookup);
        override_string(&mut self.scan.results_file, ENV_RESULTS_FILE, &lookup);
        override_string(&mut self.scan.results_format, ENV_RESULTS_FORMAT, &lookup);
        override_string(&mut self.scan.policy_file, ENV_POLICY_FILE, &lookup);

        // Repository
        override_string(&mut self.repository.name, ENV_GITHUB_REPOSITORY, &lookup);
        override_string(&mut self.repository.git_ref, ENV_GITHUB_REF, &lookup);
        override_string(&mut self.repository.token, ENV_REPO_TOKEN, &lookup);

        // Publish
        if let Some(warning) = override_flag(&mut self.publish.enabled, ENV_PUBLISH_RESULTS, &lookup)
        {
            warnings.push(warning);
        }
        override_string(&mut self.publish.base_url, ENV_PUBLISH_BASE_URL, &lookup);

        warnings
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 저장소 및 게시 관련 값은 게시가 활성화된 경우에만 검사합니다.
    pub fn validate(&self) -> Result<(), ActionError> {
        self.general.validate()?;

        if self.scan.program.trim().is_empty() {
            return Err(invalid("scan.program", "must not be empty".to_owned()));
        }

        if self.scan.results_file.trim().is_empty() {
            return Err(invalid("scan.results_file", "must not be empty".to_owned()));
        }

        self.scan.format()?;

        if self.publish.enabled {
            if !is_repo_slug(&self.repository.name) {
                return Err(invalid(
                    "repository.name",
                    format!(
                        "'{}' must be in owner/repo form when publishing is enabled",
                        self.repository.name
                    ),
                ));
            }

            if self.publish.base_url.trim().is_empty() {
                return Err(invalid(
                    "publish.base_url",
                    "must not be empty when publishing is enabled".to_owned(),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> ActionError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 환경변수 오버라이드 중 해석할 수 없었던 값
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideWarning {
    /// 환경변수 이름
    pub env_key: &'static str,
    /// 주어진 값
    pub value: String,
    /// 적용된 해석
    pub message: &'static str,
}

impl OverrideWarning {
    /// `warn` 레벨로 기록합니다.
    pub fn log(&self) {
        warn!(
            env_key = self.env_key,
            value = self.value.as_str(),
            "{}",
            self.message
        );
    }
}

impl fmt::Display for OverrideWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}: {}", self.env_key, self.value, self.message)
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

impl GeneralConfig {
    /// 로그 레벨과 형식을 검증합니다.
    pub fn validate(&self) -> Result<(), ActionError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}

/// 스캔 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// scorecard 실행 파일
    pub program: String,
    /// 결과 파일 경로
    pub results_file: String,
    /// 결과 출력 형식 (sarif, json, default)
    pub results_format: String,
    /// 체크별 상세 정보 포함 여부
    pub show_details: bool,
    /// scorecard 정책 파일 (비어 있으면 사용하지 않음)
    pub policy_file: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            program: "scorecard".to_owned(),
            results_file: "results.sarif".to_owned(),
            results_format: "sarif".to_owned(),
            show_details: true,
            policy_file: String::new(),
        }
    }
}

impl ScanConfig {
    /// 검증된 출력 형식을 반환합니다.
    pub fn format(&self) -> Result<ResultsFormat, ConfigError> {
        ResultsFormat::from_str_loose(&self.results_format).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "scan.results_format".to_owned(),
                reason: format!(
                    "'{}' must be one of: sarif, json, default",
                    self.results_format
                ),
            }
        })
    }
}

/// 대상 저장소 정보
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// `owner/repo` 형식의 저장소 이름
    pub name: String,
    /// 브랜치 또는 ref
    pub git_ref: String,
    /// 접근 토큰. 직렬화 시 제외됩니다.
    #[serde(skip_serializing)]
    pub token: String,
}

// 토큰이 로그에 남지 않도록 Debug를 직접 구현
impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() {
            "<empty>"
        } else {
            "<redacted>"
        };
        f.debug_struct("RepositoryConfig")
            .field("name", &self.name)
            .field("git_ref", &self.git_ref)
            .field("token", &token)
            .finish()
    }
}

/// 게시 설정
///
/// 요청 타임아웃은 10초로 고정되어 있어 설정 항목이 아닙니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// 게시 활성화 여부
    pub enabled: bool,
    /// 게시 API 기본 URL
    pub base_url: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: DEFAULT_PUBLISH_BASE_URL.to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str, lookup: &impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup(env_key) {
        *target = val;
    }
}

/// 액션 입력 규약: 정확히 `"true"`일 때만 참, 그 외 값은 모두 거짓
fn override_flag(
    target: &mut bool,
    env_key: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Option<OverrideWarning> {
    let val = lookup(env_key)?;
    *target = val == "true";
    if !*target && !val.is_empty() && val != "false" {
        return Some(OverrideWarning {
            env_key,
            value: val,
            message: "unrecognized flag value, treating as false",
        });
    }
    debug!(env_key, enabled = *target, "flag set from environment");
    None
}
