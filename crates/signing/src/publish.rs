//! Scorecard API로 서명된 결과 게시
//!
//! # 요청 형식
//!
//! ```text
//! POST {base_url}/projects/github.com/{owner}/{repo}
//! Content-Type: application/json
//!
//! {"result": "<raw json report>", "branch": "<ref>", "accessToken": "<token>"}
//! ```
//!
//! `201 Created`만 성공으로 취급합니다. 다른 2xx를 포함한 그 외 상태는
//! 응답 본문을 그대로 담은 에러가 됩니다. 재시도는 하지 않습니다.
//! 제한 시간은 [`DEFAULT_PUBLISH_TIMEOUT`]으로 고정되며 응답 본문 수신까지 포함합니다.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use scorecard_action_core::config::PublishConfig;

use crate::error::PublishError;

/// 요청당 제한 시간 (응답 본문 수신 포함)
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

/// 게시 엔드포인트로 보내는 요청 본문
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublishRequest {
    /// JSON 결과 원문
    pub result: String,
    /// 결과를 생성한 ref
    pub branch: String,
    /// 저장소 접근 토큰
    pub access_token: String,
}

impl PublishRequest {
    /// 요청 본문 생성. 페이로드는 유효한 UTF-8이어야 합니다.
    pub fn new(
        json_payload: &[u8],
        repo_ref: &str,
        access_token: &str,
    ) -> Result<Self, PublishError> {
        Ok(Self {
            result: String::from_utf8(json_payload.to_vec())?,
            branch: repo_ref.to_owned(),
            access_token: access_token.to_owned(),
        })
    }
}

impl fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishRequest")
            .field("result_len", &self.result.len())
            .field("branch", &self.branch)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// `repo_name`(`owner/repo`)의 게시 엔드포인트 생성
///
/// `base_url` 끝의 `/` 하나는 무시합니다.
pub fn endpoint(base_url: &str, repo_name: &str) -> Result<Url, PublishError> {
    let raw = format!(
        "{}/projects/github.com/{}",
        base_url.strip_suffix('/').unwrap_or(base_url),
        repo_name
    );
    Url::parse(&raw).map_err(|e| PublishError::Endpoint {
        url: raw,
        reason: e.to_string(),
    })
}

/// 게시 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    /// API 기본 URL
    pub base_url: String,
    /// 요청당 제한 시간
    pub timeout: Duration,
}

impl PublisherConfig {
    /// core 게시 섹션에서 설정을 만듭니다. 제한 시간은 항상 기본값입니다.
    pub fn from_core(core: &PublishConfig) -> Self {
        Self {
            base_url: core.base_url.clone(),
            timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self::from_core(&PublishConfig::default())
    }
}

/// 서명된 JSON 결과 업로드
pub trait ResultPublisher: Send + Sync {
    /// `repo_name`의 `repo_ref`에 대한 `json_payload` 게시
    fn publish(
        &self,
        json_payload: &[u8],
        repo_name: &str,
        repo_ref: &str,
        access_token: &str,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// `reqwest` 기반 HTTP 게시자
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    config: PublisherConfig,
}

impl HttpPublisher {
    /// `config.timeout`을 적용한 클라이언트로 게시자 생성
    pub fn new(config: PublisherConfig) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PublishError::Request)?;
        Ok(Self { client, config })
    }

    fn classify(&self, err: reqwest::Error) -> PublishError {
        if err.is_timeout() {
            PublishError::Timeout {
                timeout: self.config.timeout,
            }
        } else if err.is_builder() {
            PublishError::Request(err)
        } else {
            PublishError::Network(err)
        }
    }
}

impl ResultPublisher for HttpPublisher {
    async fn publish(
        &self,
        json_payload: &[u8],
        repo_name: &str,
        repo_ref: &str,
        access_token: &str,
    ) -> Result<(), PublishError> {
        let body = PublishRequest::new(json_payload, repo_ref, access_token)?;
        let body = serde_json::to_vec(&body)?;
        let url = endpoint(&self.config.base_url, repo_name)?;

        debug!(%url, bytes = body.len(), "posting results");
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.map_err(|e| {
                if e.is_timeout() {
                    PublishError::Timeout {
                        timeout: self.config.timeout,
                    }
                } else {
                    PublishError::ResponseBody(e)
                }
            })?;
            return Err(PublishError::UnexpectedStatus {
                code: status.as_u16(),
                status: status.to_string(),
                body,
            });
        }

        // 연결 정리를 위해 본문을 비웁니다.
        if let Err(e) = response.bytes().await {
            warn!(error = %e, "failed to drain publish response body");
        }

        info!(%url, "results published");
        Ok(())
    }
}
