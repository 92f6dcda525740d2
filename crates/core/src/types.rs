//! 도메인 타입: 크레이트 전역에서 공유하는 타입

use std::fmt;

use serde::{Deserialize, Serialize};

/// scorecard 결과 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultsFormat {
    /// GitHub code scanning 업로드용 SARIF
    Sarif,
    /// 기계 판독용 JSON (서명 및 게시 대상)
    Json,
    /// scorecard 기본 텍스트 출력
    Default,
}

impl fmt::Display for ResultsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sarif => write!(f, "sarif"),
            Self::Json => write!(f, "json"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResultsFormat {
    /// 문자열에서 출력 형식을 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sarif" => Some(Self::Sarif),
            "json" => Some(Self::Json),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

/// `owner/repo` 형식의 저장소 이름인지 확인합니다.
pub fn is_repo_slug(name: &str) -> bool {
    match name.split_once('/') {
        Some((owner, repo)) => {
            !owner.is_empty()
                && !repo.is_empty()
                && !repo.contains('/')
                && !name.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
