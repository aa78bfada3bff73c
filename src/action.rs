//! Filter return actions.

use serde::{Deserialize, Serialize};
use std::fmt;

// seccomp return values (linux/seccomp.h)
pub const SECCOMP_RET_KILL_PROCESS: u32 = 0x8000_0000;
pub const SECCOMP_RET_KILL_THREAD: u32 = 0x0000_0000;
pub const SECCOMP_RET_TRAP: u32 = 0x0003_0000;
pub const SECCOMP_RET_ERRNO: u32 = 0x0005_0000;
pub const SECCOMP_RET_LOG: u32 = 0x7ffc_0000;
pub const SECCOMP_RET_ALLOW: u32 = 0x7fff_0000;
pub const SECCOMP_RET_DATA: u32 = 0x0000_ffff;
pub const SECCOMP_RET_ACTION_FULL: u32 = 0xffff_0000;

/// Largest errno the kernel passes through (include/linux/err.h).
pub const MAX_ERRNO: u16 = 4095;

/// What the kernel does with a syscall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    /// Kill every thread in the process.
    #[serde(alias = "kill")]
    KillProcess,
    KillThread,
    /// Deliver SIGSYS with `si_code == SYS_SECCOMP`.
    Trap,
    /// Allow, but record the call in the audit log.
    Log,
    /// Fail the call with this errno.
    Errno(u16),
}

/// Unconditionally allow.
pub const ACT_ALLOW: Action = Action::Allow;

/// Unconditionally terminate the process.
pub const ACT_KILL: Action = Action::KillProcess;

impl Action {
    /// Build an errno-return action.
    ///
    /// Values that do not fit the 16-bit data field saturate to `u16::MAX`
    /// instead of wrapping, so the builder refuses them along with 0 and
    /// anything above `MAX_ERRNO`.
    pub const fn errno(errno: i32) -> Action {
        if errno < 0 || errno > u16::MAX as i32 {
            Action::Errno(u16::MAX)
        } else {
            Action::Errno(errno as u16)
        }
    }

    /// The `SECCOMP_RET_*` word returned by the filter.
    pub const fn to_ret(self) -> u32 {
        match self {
            Action::Allow => SECCOMP_RET_ALLOW,
            Action::KillProcess => SECCOMP_RET_KILL_PROCESS,
            Action::KillThread => SECCOMP_RET_KILL_THREAD,
            Action::Trap => SECCOMP_RET_TRAP,
            Action::Log => SECCOMP_RET_LOG,
            Action::Errno(errno) => SECCOMP_RET_ERRNO | errno as u32,
        }
    }

    /// Decode a `SECCOMP_RET_*` word. Actions this crate never emits
    /// (trace, user notification) yield `None`.
    pub const fn from_ret(ret: u32) -> Option<Action> {
        match ret & SECCOMP_RET_ACTION_FULL {
            SECCOMP_RET_ALLOW => Some(Action::Allow),
            SECCOMP_RET_KILL_PROCESS => Some(Action::KillProcess),
            SECCOMP_RET_KILL_THREAD => Some(Action::KillThread),
            SECCOMP_RET_TRAP => Some(Action::Trap),
            SECCOMP_RET_LOG => Some(Action::Log),
            SECCOMP_RET_ERRNO => Some(Action::Errno((ret & SECCOMP_RET_DATA) as u16)),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Allow => f.write_str("allow"),
            Action::KillProcess => f.write_str("kill_process"),
            Action::KillThread => f.write_str("kill_thread"),
            Action::Trap => f.write_str("trap"),
            Action::Log => f.write_str("log"),
            Action::Errno(errno) => match crate::errno::name(i32::from(*errno)) {
                Some(name) => write!(f, "errno({name})"),
                None => write!(f, "errno({errno})"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ret_words() {
        assert_eq!(ACT_ALLOW.to_ret(), 0x7fff_0000);
        assert_eq!(ACT_KILL.to_ret(), 0x8000_0000);
        assert_eq!(Action::Trap.to_ret(), 0x0003_0000);
        assert_eq!(Action::errno(libc::EPERM).to_ret(), 0x0005_0001);
    }

    #[test]
    fn test_from_ret() {
        for action in [ACT_ALLOW, ACT_KILL, Action::KillThread, Action::Trap, Action::Log, Action::errno(13)] {
            assert_eq!(Action::from_ret(action.to_ret()), Some(action));
        }
        assert_eq!(Action::from_ret(0x7ff0_0000), None);
    }

    #[test]
    fn test_errno_out_of_range_saturates() {
        assert_eq!(Action::errno(0x1_0005), Action::Errno(u16::MAX));
        assert_eq!(Action::errno(-1), Action::Errno(u16::MAX));
        assert_eq!(Action::errno(4095), Action::Errno(MAX_ERRNO));
    }

    #[test]
    fn test_display() {
        assert_eq!(Action::errno(libc::ENOSYS).to_string(), "errno(ENOSYS)");
        assert_eq!(Action::Errno(4000).to_string(), "errno(4000)");
        assert_eq!(ACT_KILL.to_string(), "kill_process");
    }

    #[test]
    fn test_deserialize() {
        let a: Action = serde_json::from_str("\"kill\"").unwrap();
        assert_eq!(a, Action::KillProcess);
        let a: Action = serde_json::from_str("{\"errno\": 38}").unwrap();
        assert_eq!(a, Action::Errno(38));
        let a: Action = serde_json::from_str("\"trap\"").unwrap();
        assert_eq!(a, Action::Trap);
    }
}
