//! scorecard-action 공통 크레이트
//!
//! 모든 단계가 공유하는 설정([`config`]), 에러([`error`]), 도메인 타입([`types`])을 정의합니다.

pub mod config;
pub mod error;
pub mod types;

// --- 주요 타입 re-export ---

pub use config::{
    ActionConfig, GeneralConfig, OverrideWarning, PublishConfig, RepositoryConfig, ScanConfig,
};
pub use error::{ActionError, ConfigError};
pub use types::ResultsFormat;
