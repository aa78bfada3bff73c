//! No-new-privileges and seccomp filter installation.
//!
//! Both steps are one-way. Once `PR_SET_NO_NEW_PRIVS` is set and a filter is
//! attached, nothing in this crate (or the kernel) can take them back.
//! Needs no root: NNP is what lets an unprivileged process load a filter.

use crate::error::{Error, Result};
use crate::filter::FilterProgram;
use nix::errno::Errno;
use nix::sys::prctl;

const SECCOMP_MODE_FILTER: libc::c_int = 2;

/// Where an `Installer` is in the narrowing sequence.
///
/// `Uninitialized -> PrivilegesNarrowed -> FilterInstalled`, or `Failed`
/// from either step. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    PrivilegesNarrowed,
    FilterInstalled,
    Failed,
}

/// Current seccomp mode of the calling thread (PR_GET_SECCOMP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Disabled,
    Strict,
    Filter,
}

/// Drives the two installation steps in order.
#[derive(Debug)]
pub struct Installer {
    stage: Stage,
}

impl Default for Installer {
    fn default() -> Self {
        Self::new()
    }
}

impl Installer {
    pub fn new() -> Self {
        Self {
            stage: Stage::Uninitialized,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Step 1: set no-new-privileges on the calling thread.
    pub fn narrow(&mut self) -> Result<()> {
        if self.stage != Stage::Uninitialized {
            return Err(Error::OutOfOrder(format!(
                "cannot narrow privileges from stage {:?}",
                self.stage
            )));
        }
        match narrow_privileges() {
            Ok(()) => {
                self.stage = Stage::PrivilegesNarrowed;
                log::debug!("PR_SET_NO_NEW_PRIVS set");
                Ok(())
            }
            Err(e) => {
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    /// Step 2: attach `program` as the thread's seccomp filter.
    pub fn load(&mut self, program: &FilterProgram) -> Result<()> {
        if self.stage != Stage::PrivilegesNarrowed {
            return Err(Error::OutOfOrder(format!(
                "cannot load a filter from stage {:?}",
                self.stage
            )));
        }
        match load_filter(program) {
            Ok(()) => {
                self.stage = Stage::FilterInstalled;
                log::info!(
                    "seccomp filter installed: {} instructions, {} syscalls allowed, default {}",
                    program.len(),
                    program.allowed().len(),
                    program.default_action()
                );
                Ok(())
            }
            Err(e) => {
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }
}

/// Narrow privileges, then install `program`.
///
/// A failure in the first step stops before the second. Nothing is retried;
/// the caller decides whether to carry on unfiltered.
///
/// Installing again over an active filter is left to the kernel: the
/// second call only succeeds if the active filter allows `prctl`, and the
/// new filter stacks on top of the old one.
pub fn install(program: &FilterProgram) -> Result<()> {
    let mut installer = Installer::new();
    installer.narrow()?;
    installer.load(program)
}

/// Set `PR_SET_NO_NEW_PRIVS` on the calling thread.
pub fn narrow_privileges() -> Result<()> {
    prctl::set_no_new_privs().map_err(Error::PermissionNarrowingFailed)
}

/// Query the calling thread's seccomp mode.
pub fn mode() -> Result<Mode> {
    // SAFETY: PR_GET_SECCOMP takes no pointer arguments.
    let ret = unsafe { libc::prctl(libc::PR_GET_SECCOMP) };
    match ret {
        0 => Ok(Mode::Disabled),
        1 => Ok(Mode::Strict),
        2 => Ok(Mode::Filter),
        -1 => match Errno::last() {
            Errno::EINVAL => Err(Error::UnsupportedFeature(
                "kernel built without CONFIG_SECCOMP".to_string(),
            )),
            errno => Err(Error::Io(errno.into())),
        },
        other => Err(Error::UnsupportedFeature(format!(
            "unexpected PR_GET_SECCOMP result {other}"
        ))),
    }
}

fn load_filter(program: &FilterProgram) -> Result<()> {
    let prog = program.as_fprog();

    // SAFETY: prog points into `program`, which outlives the call. The
    // kernel copies the instructions before returning.
    let ret = unsafe {
        libc::prctl(
            libc::PR_SET_SECCOMP,
            SECCOMP_MODE_FILTER,
            &prog as *const crate::bpf::SockFprog,
        )
    };
    if ret == 0 {
        return Ok(());
    }

    match Errno::last() {
        Errno::EINVAL => {
            if let Err(Error::UnsupportedFeature(why)) = mode() {
                return Err(Error::UnsupportedFeature(why));
            }
            Err(Error::InvalidProgram(format!(
                "kernel rejected {} instructions (EINVAL)",
                program.len()
            )))
        }
        Errno::EFAULT => Err(Error::InvalidProgram(
            "kernel could not read the filter (EFAULT)".to_string(),
        )),
        errno => Err(Error::Io(errno.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_installer_is_uninitialized() {
        assert_eq!(Installer::new().stage(), Stage::Uninitialized);
    }

    #[test]
    fn test_load_before_narrow_is_refused() {
        let program = crate::build(&["read"], crate::ACT_KILL).unwrap();
        let mut installer = Installer::new();
        let err = installer.load(&program).unwrap_err();
        assert!(matches!(err, Error::OutOfOrder(_)));
        assert!(err.to_string().contains("out of order"));
        assert_eq!(installer.stage(), Stage::Uninitialized);
    }

    #[test]
    fn test_mode_query() {
        // Containers may already run the harness under a filter.
        match mode() {
            Ok(m) => assert_ne!(m, Mode::Strict),
            Err(Error::UnsupportedFeature(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
