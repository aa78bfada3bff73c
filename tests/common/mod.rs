//! Fork helpers for filter tests.
//!
//! A filter can never be removed, so every test that installs one does it
//! in a forked child and inspects the child's exit status and stdout.

#![allow(dead_code)]

use std::panic::{self, AssertUnwindSafe};

/// How a forked child ended and what it wrote to stdout.
pub struct Outcome {
    pub status: libc::c_int,
    pub stdout: Vec<u8>,
}

impl Outcome {
    pub fn exit_code(&self) -> Option<i32> {
        libc::WIFEXITED(self.status).then(|| libc::WEXITSTATUS(self.status))
    }

    pub fn signal(&self) -> Option<i32> {
        libc::WIFSIGNALED(self.status).then(|| libc::WTERMSIG(self.status))
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[track_caller]
    pub fn assert_exit(&self, code: i32) {
        assert_eq!(
            self.exit_code(),
            Some(code),
            "child status=0x{:x}, stdout={:?}",
            self.status,
            self.stdout()
        );
    }

    #[track_caller]
    pub fn assert_killed_by_sigsys(&self) {
        assert_eq!(
            self.signal(),
            Some(libc::SIGSYS),
            "child status=0x{:x}, stdout={:?}",
            self.status,
            self.stdout()
        );
    }
}

/// Run `child` in a forked process with stdout captured. Its return value
/// becomes the exit status; a panic exits with 101.
///
/// Build filter programs before calling this so the child does not need
/// to allocate.
pub fn in_child<F: FnOnce() -> i32>(child: F) -> Outcome {
    let mut fds = [0 as libc::c_int; 2];
    unsafe {
        assert_eq!(libc::pipe(fds.as_mut_ptr()), 0, "pipe failed");

        let pid = libc::fork();
        assert!(pid >= 0, "fork failed: {}", std::io::Error::last_os_error());

        if pid == 0 {
            libc::close(fds[0]);
            libc::dup2(fds[1], libc::STDOUT_FILENO);
            libc::close(fds[1]);

            let code = panic::catch_unwind(AssertUnwindSafe(child)).unwrap_or(101);
            libc::_exit(code);
        }

        libc::close(fds[1]);
        let mut stdout = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = libc::read(fds[0], buf.as_mut_ptr() as *mut libc::c_void, buf.len());
            if n <= 0 {
                break;
            }
            stdout.extend_from_slice(&buf[..n as usize]);
        }
        libc::close(fds[0]);

        let mut status: libc::c_int = 0;
        assert_eq!(libc::waitpid(pid, &mut status, 0), pid);
        Outcome { status, stdout }
    }
}

/// errno of the last failed libc call in this thread.
pub fn last_errno() -> i32 {
    nix::errno::Errno::last() as i32
}
