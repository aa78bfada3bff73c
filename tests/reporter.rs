//! SIGSYS reporter tests
//!
//! The reporter writes to stdout from inside the signal handler, so each
//! test runs in a forked child with stdout piped back to the parent.

mod common;

use common::in_child;
use sysfence::{build, init, install, reporter, Action, Policy, ACT_KILL};

#[cfg(target_arch = "x86_64")]
fn open_dev_null() {
    unsafe { libc::syscall(libc::SYS_open, b"/dev/null\0".as_ptr(), libc::O_RDONLY) };
}

// No open(2) here, only openat(2)
#[cfg(not(target_arch = "x86_64"))]
fn open_dev_null() {
    unsafe {
        libc::syscall(libc::SYS_openat, libc::AT_FDCWD, b"/dev/null\0".as_ptr(), libc::O_RDONLY)
    };
}

#[cfg(target_arch = "x86_64")]
#[test]
fn reports_open_and_exits() {
    let policy = Policy {
        allow: ["read", "write", "exit"].map(String::from).to_vec(),
        default_action: ACT_KILL,
        report: true,
    };

    let outcome = in_child(|| {
        let installed = match init(&policy) {
            Ok(installed) => installed,
            Err(_) => return 99,
        };
        if !installed.reporting || installed.reporter().is_none() {
            return 98;
        }
        open_dev_null();
        42
    });

    outcome.assert_exit(reporter::EXIT_STATUS);
    assert_eq!(
        outcome.stdout(),
        "Looks like you also need syscall: open(2)\n"
    );
}

#[test]
fn reports_name_and_number() {
    let program = build(&["write", "exit_group"], Action::Trap).unwrap();
    let expected = format!(
        "Looks like you also need syscall: getppid({})\n",
        libc::SYS_getppid
    );

    let outcome = in_child(|| {
        if reporter::install().is_err() || install(&program).is_err() {
            return 99;
        }
        unsafe { libc::syscall(libc::SYS_getppid) };
        42
    });

    outcome.assert_exit(reporter::EXIT_STATUS);
    assert_eq!(outcome.stdout(), expected);
}

#[test]
fn only_the_first_violation_is_reported() {
    let program = build(&["write", "exit_group"], Action::Trap).unwrap();

    let outcome = in_child(|| {
        if reporter::install().is_err() || install(&program).is_err() {
            return 99;
        }
        unsafe {
            libc::syscall(libc::SYS_getuid);
            libc::syscall(libc::SYS_getgid);
        }
        42
    });

    outcome.assert_exit(reporter::EXIT_STATUS);
    assert_eq!(outcome.stdout().lines().count(), 1);
    assert!(outcome.stdout().contains("getuid("));
}

#[test]
fn silent_kill_without_reporter() {
    let policy = Policy {
        allow: ["read", "write", "exit"].map(String::from).to_vec(),
        default_action: ACT_KILL,
        report: false,
    };

    let outcome = in_child(|| {
        match init(&policy) {
            Ok(installed) if !installed.reporting => {}
            _ => return 99,
        }
        open_dev_null();
        42
    });

    outcome.assert_killed_by_sigsys();
    assert!(outcome.stdout.is_empty());
}

#[test]
fn message_survives_missing_exit_group() {
    // Built without Policy, so exit_group is not added. The handler exits
    // through it, and the kernel takes the process down with SIGSYS after
    // the report is out.
    let program = build(&["read", "write", "exit"], Action::Trap).unwrap();

    let outcome = in_child(|| {
        if reporter::install().is_err() || install(&program).is_err() {
            return 99;
        }
        unsafe { libc::syscall(libc::SYS_getppid) };
        42
    });

    outcome.assert_killed_by_sigsys();
    assert!(outcome
        .stdout()
        .starts_with("Looks like you also need syscall: getppid("));
}

#[test]
fn ignores_sigsys_not_from_seccomp() {
    let outcome = in_child(|| {
        if reporter::install().is_err() {
            return 99;
        }
        // raise() delivers SIGSYS with si_code SI_TKILL
        unsafe { libc::raise(libc::SIGSYS) };
        0
    });

    outcome.assert_exit(0);
    assert!(outcome.stdout.is_empty());
}
