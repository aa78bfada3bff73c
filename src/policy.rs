//! Allow-list policy: the compiled-in default and JSON policy files.
//!
//! ```json
//! {
//!   "allow": ["read", "write", "exit_group"],
//!   "default_action": { "errno": 1 },
//!   "report": false
//! }
//! ```
//!
//! Missing fields fall back to the compiled-in defaults.

use crate::action::Action;
use crate::error::{Error, Result};
use crate::filter::FilterProgram;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Policy files larger than this are refused unread.
const MAX_POLICY_BYTES: u64 = 64 * 1024;

/// Syscalls a Rust program needs to keep running and exit cleanly once
/// the filter is in place.
pub const DEFAULT_ALLOWLIST: &[&str] = &[
    // --- Core I/O ---
    "read",
    "write",
    "writev",
    "close",
    "fstat",
    "lseek",
    // --- Memory ---
    "mmap",
    "munmap",
    "mprotect",
    "mremap",
    "madvise",
    "brk",
    // --- Signals ---
    "rt_sigaction",
    "rt_sigprocmask",
    "rt_sigreturn",
    "sigaltstack",
    // --- Threads and time ---
    "futex",
    "sched_yield",
    "getrandom",
    "clock_gettime",
    "clock_nanosleep",
    "nanosleep",
    // --- Exit ---
    "exit",
    "exit_group",
];

/// Syscalls the SIGSYS reporter makes from its handler. They are added to
/// the allow-list whenever `report` is set.
pub const REPORTER_SYSCALLS: &[&str] = &["write", "exit_group"];

/// Which syscalls to allow, what to do with the rest, and whether to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    pub allow: Vec<String>,
    pub default_action: Action,
    /// Register the SIGSYS reporter and trap instead of killing.
    pub report: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow: DEFAULT_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
            default_action: Action::KillProcess,
            report: cfg!(feature = "diagnostics"),
        }
    }
}

impl Policy {
    /// Policy with the given allow-list and the default action and
    /// reporting setting of `Policy::default()`.
    pub fn with_allow<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            allow: names.iter().map(|s| s.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    /// Load a JSON policy file.
    pub fn load(path: &Path) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        if size > MAX_POLICY_BYTES {
            return Err(Error::Policy(format!(
                "{} is {} bytes, limit is {}",
                path.display(),
                size,
                MAX_POLICY_BYTES
            )));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Policy(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Policy(e.to_string()))
    }

    /// Action the compiled program falls back to. Reporting needs SIGSYS,
    /// so it overrides the configured action with `Trap`.
    pub fn effective_default_action(&self) -> Action {
        if self.report {
            Action::Trap
        } else {
            self.default_action
        }
    }

    /// Compile this policy. With `report` set, the reporter's own
    /// syscalls are appended so it can print and exit.
    pub fn build(&self) -> Result<FilterProgram> {
        let mut names: Vec<&str> = self.allow.iter().map(String::as_str).collect();
        if self.report {
            for name in REPORTER_SYSCALLS {
                if !names.contains(name) {
                    log::debug!("allowing {name} for the reporter");
                    names.push(*name);
                }
            }
        }
        FilterProgram::build(&names, self.effective_default_action())
    }
}
