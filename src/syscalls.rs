//! Syscall name table for the compiled-for architecture.
//!
//! Numbers come from `libc::SYS_*`, so the table is correct by construction
//! for whichever target is being built. Lookups are plain slice scans with
//! no allocation, which keeps `name()` usable from the SIGSYS handler.

/// A numbered syscall and the `libc` identifier it was taken from.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub nr: i64,
    ident: &'static str,
}

impl Entry {
    /// Symbolic name without the `SYS_` prefix.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self.ident.strip_prefix("SYS_") {
            Some(name) => name,
            None => self.ident,
        }
    }
}

macro_rules! syscall_table {
    ($($sys:ident),* $(,)?) => {
        &[$(Entry { nr: libc::$sys as i64, ident: stringify!($sys) }),*]
    };
}

/// Syscalls every supported architecture has.
const COMMON: &[Entry] = syscall_table![
    // --- File I/O ---
    SYS_read, SYS_write, SYS_readv, SYS_writev, SYS_pread64, SYS_pwrite64,
    SYS_preadv, SYS_pwritev, SYS_preadv2, SYS_pwritev2, SYS_lseek,
    SYS_openat, SYS_openat2, SYS_close, SYS_close_range, SYS_fstat,
    SYS_statx, SYS_readlinkat, SYS_faccessat, SYS_faccessat2, SYS_getdents64,
    SYS_fcntl, SYS_ioctl, SYS_flock, SYS_dup, SYS_dup3, SYS_pipe2,
    SYS_fsync, SYS_fdatasync, SYS_sync, SYS_syncfs, SYS_sync_file_range,
    SYS_truncate, SYS_ftruncate, SYS_fallocate, SYS_fadvise64, SYS_readahead,
    SYS_sendfile, SYS_splice, SYS_tee, SYS_vmsplice, SYS_copy_file_range,
    SYS_statfs, SYS_fstatfs, SYS_utimensat,
    // --- Filesystem namespace ---
    SYS_getcwd, SYS_chdir, SYS_fchdir, SYS_chroot, SYS_mkdirat, SYS_mknodat,
    SYS_unlinkat, SYS_symlinkat, SYS_linkat, SYS_renameat2, SYS_fchmod,
    SYS_fchmodat, SYS_fchown, SYS_fchownat, SYS_umask, SYS_mount,
    SYS_umount2, SYS_pivot_root, SYS_open_tree, SYS_move_mount, SYS_fsopen,
    SYS_fsconfig, SYS_fsmount, SYS_fspick, SYS_mount_setattr,
    SYS_name_to_handle_at, SYS_open_by_handle_at,
    // --- Extended attributes ---
    SYS_setxattr, SYS_lsetxattr, SYS_fsetxattr, SYS_getxattr, SYS_lgetxattr,
    SYS_fgetxattr, SYS_listxattr, SYS_llistxattr, SYS_flistxattr,
    SYS_removexattr, SYS_lremovexattr, SYS_fremovexattr,
    // --- Memory ---
    SYS_brk, SYS_mmap, SYS_munmap, SYS_mremap, SYS_mprotect, SYS_msync,
    SYS_madvise, SYS_mincore, SYS_mlock, SYS_mlock2, SYS_munlock,
    SYS_mlockall, SYS_munlockall, SYS_remap_file_pages, SYS_mbind,
    SYS_get_mempolicy, SYS_set_mempolicy, SYS_migrate_pages, SYS_move_pages,
    SYS_memfd_create, SYS_membarrier, SYS_userfaultfd, SYS_process_madvise,
    // --- Processes ---
    SYS_clone, SYS_clone3, SYS_execve, SYS_execveat, SYS_exit,
    SYS_exit_group, SYS_wait4, SYS_waitid, SYS_set_tid_address, SYS_unshare,
    SYS_setns, SYS_prctl, SYS_personality, SYS_getpid, SYS_getppid,
    SYS_gettid, SYS_getpgid, SYS_setpgid, SYS_getsid, SYS_setsid,
    SYS_getpriority, SYS_setpriority, SYS_getrlimit, SYS_setrlimit,
    SYS_prlimit64, SYS_getrusage, SYS_times, SYS_ptrace, SYS_kcmp,
    SYS_process_vm_readv, SYS_process_vm_writev, SYS_pidfd_open,
    SYS_pidfd_getfd, SYS_pidfd_send_signal, SYS_rseq, SYS_restart_syscall,
    // --- Credentials ---
    SYS_getuid, SYS_geteuid, SYS_getgid, SYS_getegid, SYS_setuid,
    SYS_setgid, SYS_setreuid, SYS_setregid, SYS_setresuid, SYS_getresuid,
    SYS_setresgid, SYS_getresgid, SYS_setfsuid, SYS_setfsgid, SYS_getgroups,
    SYS_setgroups, SYS_capget, SYS_capset,
    // --- Scheduling ---
    SYS_sched_yield, SYS_sched_setparam, SYS_sched_getparam,
    SYS_sched_setscheduler, SYS_sched_getscheduler, SYS_sched_setaffinity,
    SYS_sched_getaffinity, SYS_sched_get_priority_max,
    SYS_sched_get_priority_min, SYS_sched_rr_get_interval,
    SYS_sched_setattr, SYS_sched_getattr, SYS_getcpu, SYS_ioprio_set,
    SYS_ioprio_get,
    // --- Signals ---
    SYS_kill, SYS_tkill, SYS_tgkill, SYS_sigaltstack, SYS_rt_sigaction,
    SYS_rt_sigprocmask, SYS_rt_sigreturn, SYS_rt_sigpending,
    SYS_rt_sigsuspend, SYS_rt_sigtimedwait, SYS_rt_sigqueueinfo,
    SYS_rt_tgsigqueueinfo, SYS_signalfd4,
    // --- Time ---
    SYS_nanosleep, SYS_clock_gettime, SYS_clock_settime, SYS_clock_getres,
    SYS_clock_nanosleep, SYS_clock_adjtime, SYS_gettimeofday,
    SYS_settimeofday, SYS_adjtimex, SYS_getitimer, SYS_setitimer,
    SYS_timer_create, SYS_timer_settime, SYS_timer_gettime,
    SYS_timer_getoverrun, SYS_timer_delete, SYS_timerfd_create,
    SYS_timerfd_settime, SYS_timerfd_gettime,
    // --- Synchronisation and events ---
    SYS_futex, SYS_set_robust_list, SYS_get_robust_list, SYS_eventfd2,
    SYS_epoll_create1, SYS_epoll_ctl, SYS_epoll_pwait, SYS_epoll_pwait2,
    SYS_pselect6, SYS_ppoll, SYS_inotify_init1, SYS_inotify_add_watch,
    SYS_inotify_rm_watch, SYS_fanotify_init, SYS_fanotify_mark,
    // --- Async I/O ---
    SYS_io_setup, SYS_io_destroy, SYS_io_submit, SYS_io_cancel,
    SYS_io_getevents, SYS_io_uring_setup,
    SYS_io_uring_enter, SYS_io_uring_register,
    // --- Sockets ---
    SYS_socket, SYS_socketpair, SYS_bind, SYS_listen, SYS_accept,
    SYS_accept4, SYS_connect, SYS_getsockname, SYS_getpeername, SYS_sendto,
    SYS_recvfrom, SYS_setsockopt, SYS_getsockopt, SYS_shutdown, SYS_sendmsg,
    SYS_recvmsg, SYS_sendmmsg, SYS_recvmmsg,
    // --- System V IPC and message queues ---
    SYS_msgget, SYS_msgctl, SYS_msgrcv, SYS_msgsnd, SYS_semget, SYS_semctl,
    SYS_semop, SYS_semtimedop, SYS_shmget, SYS_shmctl, SYS_shmat, SYS_shmdt,
    SYS_mq_open, SYS_mq_unlink, SYS_mq_timedsend, SYS_mq_timedreceive,
    SYS_mq_notify, SYS_mq_getsetattr,
    // --- System ---
    SYS_uname, SYS_sysinfo, SYS_syslog, SYS_sethostname, SYS_setdomainname,
    SYS_getrandom, SYS_reboot, SYS_acct, SYS_swapon, SYS_swapoff,
    SYS_quotactl, SYS_vhangup, SYS_lookup_dcookie, SYS_perf_event_open,
    SYS_init_module, SYS_finit_module, SYS_delete_module, SYS_kexec_load,
    SYS_kexec_file_load, SYS_add_key, SYS_request_key, SYS_keyctl,
    SYS_seccomp, SYS_bpf, SYS_landlock_create_ruleset,
    SYS_landlock_add_rule, SYS_landlock_restrict_self,
];

/// Pre-generic syscalls that only the x86_64 ABI still carries.
#[cfg(target_arch = "x86_64")]
const LEGACY: &[Entry] = syscall_table![
    SYS_open, SYS_creat, SYS_stat, SYS_lstat, SYS_newfstatat, SYS_access,
    SYS_poll, SYS_select, SYS_pipe, SYS_dup2, SYS_pause, SYS_alarm,
    SYS_fork, SYS_vfork, SYS_getdents, SYS_rename, SYS_renameat, SYS_mkdir,
    SYS_rmdir, SYS_link, SYS_unlink, SYS_symlink, SYS_readlink, SYS_chmod,
    SYS_chown, SYS_lchown, SYS_utime, SYS_utimes, SYS_futimesat, SYS_mknod,
    SYS_uselib, SYS_ustat, SYS_sysfs, SYS_getpgrp, SYS_time,
    SYS_epoll_create, SYS_epoll_wait, SYS_inotify_init, SYS_eventfd,
    SYS_signalfd, SYS_arch_prctl, SYS_modify_ldt, SYS_iopl, SYS_ioperm,
    SYS_set_thread_area, SYS_get_thread_area, SYS_pkey_mprotect,
    SYS_pkey_alloc, SYS_pkey_free,
];

#[cfg(not(target_arch = "x86_64"))]
const LEGACY: &[Entry] = &[];

const fn longest(entries: &[Entry]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < entries.len() {
        // every ident carries the 4-byte "SYS_" prefix
        let len = entries[i].ident.len() - 4;
        if len > max {
            max = len;
        }
        i += 1;
    }
    max
}

/// Length of the longest symbolic name in the table.
pub const MAX_NAME_LEN: usize = {
    let common = longest(COMMON);
    let legacy = longest(LEGACY);
    if common > legacy {
        common
    } else {
        legacy
    }
};

/// Iterate over every known syscall.
pub fn all() -> impl Iterator<Item = &'static Entry> {
    COMMON.iter().chain(LEGACY.iter())
}

/// Symbolic name for `nr`, if the table has one.
///
/// Async-signal-safe: no allocation, no locks.
pub fn name(nr: i64) -> Option<&'static str> {
    for entry in COMMON {
        if entry.nr == nr {
            return Some(entry.name());
        }
    }
    for entry in LEGACY {
        if entry.nr == nr {
            return Some(entry.name());
        }
    }
    None
}

/// Number for symbolic `name` on this architecture.
pub fn number(name: &str) -> Option<i64> {
    all().find(|e| e.name() == name).map(|e| e.nr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_core_names_resolve() {
        assert_eq!(number("read"), Some(libc::SYS_read));
        assert_eq!(number("write"), Some(libc::SYS_write));
        assert_eq!(number("exit_group"), Some(libc::SYS_exit_group));
        assert_eq!(number("no_such_syscall"), None);
    }

    #[test]
    fn test_async_io_names_resolve() {
        assert_eq!(number("io_getevents"), Some(libc::SYS_io_getevents));
        assert_eq!(number("io_uring_enter"), Some(libc::SYS_io_uring_enter));
        // only libc's musl targets define it
        assert_eq!(number("io_pgetevents"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(name(libc::SYS_openat), Some("openat"));
        assert_eq!(name(libc::SYS_rt_sigreturn), Some("rt_sigreturn"));
        assert_eq!(name(-1), None);
        assert_eq!(name(100_000), None);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_x86_64_numbers() {
        assert_eq!(number("read"), Some(0));
        assert_eq!(number("open"), Some(2));
        assert_eq!(name(60), Some("exit"));
        assert_eq!(name(231), Some("exit_group"));
    }

    #[test]
    fn test_numbers_and_names_unique() {
        let mut numbers = HashSet::new();
        let mut names = HashSet::new();
        for entry in all() {
            assert!(numbers.insert(entry.nr), "duplicate nr {}", entry.nr);
            assert!(names.insert(entry.name()), "duplicate {}", entry.name());
        }
    }

    #[test]
    fn test_max_name_len() {
        let observed = all().map(|e| e.name().len()).max().unwrap();
        assert_eq!(observed, MAX_NAME_LEN);
        assert!(MAX_NAME_LEN >= "landlock_create_ruleset".len());
    }
}
