//! 스캔, 서명, 게시 단계별 에러 타입
//!
//! 단계마다 별도의 열거형을 두어 드라이버가 어느 단계에서 실패했는지
//! 정확히 구분할 수 있게 합니다. 어떤 에러도 내부에서 복구하지 않습니다.
//!
//! # 에러 카테고리
//!
//! - **스캔**: `ScanError` (`Spawn`, `Execution`, `WriteResults`, `ResultRetrieval`)
//! - **서명**: `SignError` (`MissingInput`, `Spawn`, `Timeout`, `Failed`)
//! - **게시**: `PublishError` (페이로드 준비, 엔드포인트, 전송, 응답 검증)

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// 스캔 엔진 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 스캔 엔진 실행 파일을 시작할 수 없음
    #[error("scan execution error: failed to start '{program}': {source}")]
    Spawn {
        /// 시작에 실패한 실행 파일
        program: String,
        /// 원인 에러
        source: std::io::Error,
    },

    /// 스캔 엔진이 실패 상태로 종료됨
    #[error("scan execution error: scorecard exited with {status}: {stderr}")]
    Execution {
        /// 엔진 프로세스 종료 상태
        status: ExitStatus,
        /// 마스킹 및 길이 제한이 적용된 stderr
        stderr: String,
    },

    /// 엔진 출력을 결과 파일에 쓰지 못함
    #[error("scan execution error: writing results to {}: {source}", path.display())]
    WriteResults {
        /// 결과 파일 경로
        path: PathBuf,
        /// 원인 I/O 에러
        source: std::io::Error,
    },

    /// 실행 성공 후 결과 파일을 다시 읽지 못함
    #[error("result retrieval error: reading {}: {source}", path.display())]
    ResultRetrieval {
        /// 결과 파일 경로
        path: PathBuf,
        /// 원인 I/O 에러
        source: std::io::Error,
    },
}

/// 서명 에러. 항상 치명적이며 부분 서명은 남기지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// 서명할 파일이 존재하지 않음
    #[error("signing failure: results file {} not found", path.display())]
    MissingInput {
        /// 존재해야 하는 경로
        path: PathBuf,
    },

    /// 서명 도구를 시작할 수 없음
    #[error("signing failure: failed to start '{program}': {source}")]
    Spawn {
        /// 시작에 실패한 실행 파일
        program: String,
        /// 원인 에러
        source: std::io::Error,
    },

    /// 제한 시간 안에 서명이 끝나지 않음
    #[error("signing failure: signer timed out after {timeout:?}")]
    Timeout {
        /// 초과된 제한 시간
        timeout: Duration,
    },

    /// 서명 도구가 실패 상태로 종료됨
    #[error("signing failure: cosign exited with {status}: {stderr}")]
    Failed {
        /// 서명 프로세스 종료 상태
        status: ExitStatus,
        /// 마스킹 및 길이 제한이 적용된 stderr
        stderr: String,
    },
}

/// 게시 에러 (페이로드 준비부터 응답 검증까지)
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// 결과가 UTF-8이 아니어서 문자열로 담을 수 없음
    #[error("preparing payload: results are not valid UTF-8: {0}")]
    Payload(#[from] std::string::FromUtf8Error),

    /// 요청 본문 직렬화 실패
    #[error("marshalling json results: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 게시 엔드포인트 URL 형식 오류
    #[error("parsing publish endpoint '{url}': {reason}")]
    Endpoint {
        /// 파싱에 실패한 URL
        url: String,
        /// 파서 에러 메시지
        reason: String,
    },

    /// HTTP 클라이언트 또는 요청 생성 실패
    #[error("creating HTTP request: {0}")]
    Request(#[source] reqwest::Error),

    /// 제한 시간 안에 응답(본문 포함)을 받지 못함
    #[error("executing publish request: timed out after {timeout:?}")]
    Timeout {
        /// 초과된 제한 시간
        timeout: Duration,
    },

    /// 연결 또는 전송 실패
    #[error("executing publish request: {0}")]
    Network(#[source] reqwest::Error),

    /// 에러 응답 본문을 읽지 못함
    #[error("reading response body: {0}")]
    ResponseBody(#[source] reqwest::Error),

    /// 서버가 201 Created 이외의 상태로 응답함
    #[error("http response {code}, status: {status}, error: {body}")]
    UnexpectedStatus {
        /// 숫자 상태 코드
        code: u16,
        /// 상태 줄 (예: `400 Bad Request`)
        status: String,
        /// 응답 본문 원문
        body: String,
    },
}

impl PublishError {
    /// 제한 시간 초과로 실패했는지 여부
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
