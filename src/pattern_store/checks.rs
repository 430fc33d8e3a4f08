//! Regex-based code checks used by `PatternStore::check` (spec.md §4.3).

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFinding {
    pub rule: &'static str,
    pub message: &'static str,
    pub line: usize,
}

fn bash_arithmetic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(let|expr)\s+\S*[-+*/]").unwrap())
}

fn baked_credential_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(api[_-]?key|password|secret)\s*=\s*['\x22][^'\x22]+['\x22]").unwrap()
    })
}

fn set_e_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*set\s+-e\b").unwrap())
}

fn trap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*trap\b").unwrap())
}

fn unsafe_rm_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\brm\s+-rf?\s+(/\S*|\$\w+)\b").unwrap())
}

/// Scan `code` line by line for the four checks named in the spec: unguarded
/// bash arithmetic, credentials baked into source, `set -e` with no paired
/// `trap`, and an `rm -rf` on an absolute path or bare variable.
pub fn check(code: &str) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    let has_trap = code.lines().any(|l| trap_re().is_match(l));

    for (i, line) in code.lines().enumerate() {
        if bash_arithmetic_re().is_match(line) {
            findings.push(CheckFinding {
                rule: "bash-arithmetic",
                message: "use $(( )) instead of let/expr for arithmetic",
                line: i + 1,
            });
        }
        if baked_credential_re().is_match(line) {
            findings.push(CheckFinding {
                rule: "baked-credential",
                message: "credential literal found in source",
                line: i + 1,
            });
        }
        if set_e_re().is_match(line) && !has_trap {
            findings.push(CheckFinding {
                rule: "set-e-without-trap",
                message: "set -e without a paired trap handler",
                line: i + 1,
            });
        }
        if unsafe_rm_re().is_match(line) {
            findings.push(CheckFinding {
                rule: "unsafe-rm",
                message: "rm -rf on an absolute path or unguarded variable",
                line: i + 1,
            });
        }
    }
    findings
}
