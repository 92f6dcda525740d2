//! Scorecard 결과 재실행, 키리스 서명, 게시
//!
//! # 모듈 구조
//!
//! - [`error`]: 단계별 에러 타입 (`ScanError`, `SignError`, `PublishError`)
//! - [`scan`]: 스캔 엔진 추상화와 JSON 재실행 (`ScanEngine`, `ScanInvoker`)
//! - [`signer`]: cosign 기반 키리스 서명 (`Signer`, `CosignSigner`, `SignOptions`)
//! - [`publish`]: Scorecard API 업로드 (`ResultPublisher`, `HttpPublisher`)
//! - [`redact`]: 외부 도구 stderr 길이 제한 및 비밀 값 마스킹
//!
//! # 처리 흐름
//!
//! ```text
//! ScanSettings --forced_json--> ScanEngine --> results.json
//!                                                  |
//!                                   +--------------+--------------+
//!                                   |                             |
//!                                Signer                      ResultPublisher
//!                         (Fulcio cert + Rekor)       POST /projects/github.com/{repo}
//! ```

pub mod error;
pub mod publish;
pub mod redact;
pub mod scan;
pub mod signer;

// --- Public API Re-exports ---

pub use error::{PublishError, ScanError, SignError};
pub use publish::{HttpPublisher, PublishRequest, PublisherConfig, ResultPublisher, endpoint};
pub use scan::{CommandScanEngine, JsonResults, ScanEngine, ScanInvoker, ScanSettings};
pub use signer::{CosignSigner, SignOptions, Signer};
