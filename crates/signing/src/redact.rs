//! 외부 도구 stderr 정리: 로그와 에러 메시지에 넣기 전 길이 제한 및 마스킹
//!
//! `scorecard`와 `cosign`은 저장소 토큰이나 OIDC 신원 토큰을 가진 채 실행되므로
//! stderr에서 자격 증명으로 보이는 값을 모두 가립니다.

use std::sync::LazyLock;

use regex::Regex;

/// 에러에 담는 도구 stderr 최대 크기
pub const MAX_TOOL_ERR_BYTES: usize = 8 * 1024;

static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)gh[pousr]_[A-Za-z0-9]{30,255}", "gh*_[REDACTED]"),
        (r"github_pat_[A-Za-z0-9_]{20,255}", "github_pat_[REDACTED]"),
        (
            r"eyJ[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]*",
            "[REDACTED_JWT]",
        ),
        (r"(?i)bearer\s+[a-z0-9\-_\.=]{1,500}", "bearer [REDACTED]"),
        (
            r"(?i)(password|token|secret)\s*[:=]\s*[^\s]+",
            "[REDACTED]=[REDACTED]",
        ),
        (
            r"(?i)BEGIN (RSA |EC |OPENSSH |ENCRYPTED )?PRIVATE KEY",
            "BEGIN [REDACTED] PRIVATE KEY",
        ),
    ]
    .into_iter()
    .filter_map(|(pat, repl)| Regex::new(pat).ok().map(|re| (re, repl)))
    .collect()
});

/// 도구 stderr를 잘라내고 비밀 값을 가립니다.
pub fn sanitize_tool_stderr(stderr: &[u8]) -> String {
    let mut s = String::from_utf8_lossy(stderr).into_owned();
    if s.len() > MAX_TOOL_ERR_BYTES {
        let mut cut = MAX_TOOL_ERR_BYTES;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("\n[TRUNCATED]");
    }

    for (re, repl) in SECRET_PATTERNS.iter() {
        s = re.replace_all(&s, *repl).into_owned();
    }

    s.trim().to_owned()
}
