//! SIGSYS reporter for diagnostic runs.
//!
//! With `Action::Trap` as the filter's default action, the kernel answers a
//! disallowed syscall with SIGSYS. The handler installed here names the
//! syscall on stdout and exits, so growing an allow-list is a matter of
//! re-running until the program stops dying:
//!
//! ```text
//! Looks like you also need syscall: openat(257)
//! ```
//!
//! Everything reachable from the handler is async-signal-safe: a fixed
//! stack buffer, a table scan, raw `write(2)` and `_exit(2)`.

use crate::arch;
use crate::error::{Error, Result};
use crate::syscalls;
use nix::sys::signal::{
    pthread_sigmask, sigaction, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal,
};

/// `si_code` the kernel sets on a seccomp SIGSYS (asm-generic/siginfo.h)
const SYS_SECCOMP: libc::c_int = 1;

pub const MESSAGE_PREFIX: &[u8] = b"Looks like you also need syscall: ";

/// Decimal digits in `u64::MAX`
const U64_DIGITS: usize = 20;

/// Size of the on-stack message buffer.
pub const MESSAGE_CAPACITY: usize = 128;

const _: () = assert!(
    MESSAGE_PREFIX.len() + syscalls::MAX_NAME_LEN + "()\n".len() + U64_DIGITS <= MESSAGE_CAPACITY
);

/// Exit status after a reported violation.
pub const EXIT_STATUS: libc::c_int = 1;

/// Proof that the SIGSYS reporter is registered on this process.
#[derive(Debug)]
pub struct Reporter {
    _registered: (),
}

/// Register the SIGSYS handler and unblock SIGSYS on the calling thread.
///
/// Must run before the filter is installed. The handler needs `write` and
/// `exit_group` on the allow-list (`Policy::build` adds them when `report`
/// is set); without `exit_group` the kernel kills the process with SIGSYS
/// once the message is out.
pub fn install() -> Result<Reporter> {
    let action = SigAction::new(
        SigHandler::SigAction(handle_sigsys),
        SaFlags::SA_SIGINFO,
        SigSet::empty(),
    );
    // SAFETY: the handler only calls async-signal-safe functions.
    unsafe { sigaction(Signal::SIGSYS, &action) }.map_err(Error::HandlerRegistrationFailed)?;

    let mut mask = SigSet::empty();
    mask.add(Signal::SIGSYS);
    pthread_sigmask(SigmaskHow::SIG_UNBLOCK, Some(&mask), None)
        .map_err(Error::HandlerRegistrationFailed)?;

    log::debug!("SIGSYS reporter registered");
    Ok(Reporter { _registered: () })
}

extern "C" fn handle_sigsys(
    signum: libc::c_int,
    info: *mut libc::siginfo_t,
    context: *mut libc::c_void,
) {
    if signum != libc::SIGSYS || info.is_null() || context.is_null() {
        return;
    }
    // SAFETY: the kernel hands SA_SIGINFO handlers a valid siginfo_t.
    if unsafe { (*info).si_code } != SYS_SECCOMP {
        return;
    }

    // SAFETY: context is the ucontext_t for this delivery.
    let nr = unsafe { arch::trapped_syscall(context) };

    let mut buf = [0u8; MESSAGE_CAPACITY];
    let len = render_message(nr, &mut buf);
    write_all(libc::STDOUT_FILENO, &buf[..len]);

    // SAFETY: _exit is async-signal-safe and never returns.
    unsafe { libc::_exit(EXIT_STATUS) };
}

/// Render the violation message for `nr` into `buf`, returning its length.
///
/// The symbolic name is omitted when the table has none.
pub fn render_message(nr: u64, buf: &mut [u8; MESSAGE_CAPACITY]) -> usize {
    let mut len = 0;
    len = push(buf, len, MESSAGE_PREFIX);
    if let Some(name) = i64::try_from(nr).ok().and_then(syscalls::name) {
        len = push(buf, len, name.as_bytes());
    }
    len = push(buf, len, b"(");

    let mut digits = [0u8; U64_DIGITS];
    if let Some(n) = format_decimal(nr, &mut digits) {
        len = push(buf, len, &digits[..n]);
    }

    push(buf, len, b")\n")
}

/// Write `value` in decimal to the start of `out`.
///
/// Returns the number of bytes written, or `None` (leaving `out` untouched)
/// when `out` is too short.
pub fn format_decimal(mut value: u64, out: &mut [u8]) -> Option<usize> {
    let mut scratch = [0u8; U64_DIGITS];
    let mut n = 0;
    loop {
        scratch[U64_DIGITS - 1 - n] = b'0' + (value % 10) as u8;
        n += 1;
        value /= 10;
        if value == 0 {
            break;
        }
    }

    if n > out.len() {
        return None;
    }
    let mut i = 0;
    while i < n {
        out[i] = scratch[U64_DIGITS - n + i];
        i += 1;
    }
    Some(n)
}

/// Append `bytes` at `at`, truncating at the end of `buf`.
fn push(buf: &mut [u8], at: usize, bytes: &[u8]) -> usize {
    let mut pos = at;
    for &b in bytes {
        match buf.get_mut(pos) {
            Some(slot) => *slot = b,
            None => break,
        }
        pos += 1;
    }
    pos
}

/// write(2) until done; gives up on any error other than EINTR.
fn write_all(fd: libc::c_int, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        // SAFETY: bytes is a live slice for the duration of the call.
        let ret = unsafe { libc::write(fd, bytes.as_ptr() as *const libc::c_void, bytes.len()) };
        if ret < 0 {
            if nix::errno::Errno::last() == nix::errno::Errno::EINTR {
                continue;
            }
            return;
        }
        if ret == 0 {
            return;
        }
        bytes = &bytes[ret as usize..];
    }
}
