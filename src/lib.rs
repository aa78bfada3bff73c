//! sysfence: restrict a process to an allow-list of syscalls with seccomp-bpf.
//!
//! ```no_run
//! use sysfence::{Policy, init};
//!
//! let installed = init(&Policy::with_allow(&["read", "write", "exit_group"]))?;
//! assert!(!installed.reporting);
//! # Ok::<(), sysfence::Error>(())
//! ```
//!
//! Raw BPF + prctl(2), no libseccomp. Once `init` succeeds the filter and
//! no-new-privileges stay in force until the process exits.

pub mod action;
pub mod arch;
pub mod bpf;
pub mod errno;
pub mod error;
pub mod filter;
pub mod install;
pub mod policy;
pub mod reporter;
pub mod syscalls;

pub use action::{Action, ACT_ALLOW, ACT_KILL};
pub use error::{Error, Result};
pub use filter::{build, FilterProgram};
pub use install::install;
pub use policy::{Policy, DEFAULT_ALLOWLIST};
pub use reporter::Reporter;

/// What `init` put in place.
#[derive(Debug)]
pub struct Installed {
    /// The SIGSYS reporter is registered and the filter traps.
    pub reporting: bool,
    pub instructions: usize,
    reporter: Option<Reporter>,
}

impl Installed {
    pub fn reporter(&self) -> Option<&Reporter> {
        self.reporter.as_ref()
    }
}

/// Build the policy's program, register the reporter if asked to, then
/// narrow privileges and install the filter.
///
/// A reporter registration failure stops everything before any narrowing.
pub fn init(policy: &Policy) -> Result<Installed> {
    let program = policy.build()?;
    log::debug!(
        "compiled {} syscalls into {} instructions for {}",
        program.allowed().len(),
        program.len(),
        arch::NAME
    );

    let reporter = if policy.report {
        if policy.default_action != Action::KillProcess {
            log::warn!(
                "reporting enabled: default action {} replaced by trap",
                policy.default_action
            );
        }
        Some(reporter::install()?)
    } else {
        None
    };

    install(&program)?;

    Ok(Installed {
        reporting: reporter.is_some(),
        instructions: program.len(),
        reporter,
    })
}
