//! Per-architecture constants for the compiled-for target.
//!
//! Exactly one architecture is supported per build.

#[cfg(not(target_os = "linux"))]
compile_error!("sysfence only supports Linux");

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("sysfence supports x86_64 and aarch64 only");

/// AUDIT_ARCH_X86_64 from linux/audit.h
#[cfg(target_arch = "x86_64")]
pub const AUDIT_ARCH: u32 = 0xc000003e;

/// AUDIT_ARCH_AARCH64 from linux/audit.h
#[cfg(target_arch = "aarch64")]
pub const AUDIT_ARCH: u32 = 0xc00000b7;

/// Architecture name as printed by the CLI.
#[cfg(target_arch = "x86_64")]
pub const NAME: &str = "x86_64";

#[cfg(target_arch = "aarch64")]
pub const NAME: &str = "aarch64";

/// Syscalls issued through the x32 ABI carry this bit in their number but
/// report the x86_64 audit token.
#[cfg(target_arch = "x86_64")]
pub const X32_SYSCALL_BIT: u32 = 0x4000_0000;

/// Recover the syscall number from the register snapshot handed to a
/// `SA_SIGINFO` handler.
///
/// # Safety
///
/// `context` must be the third argument the kernel passed to the handler.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub unsafe fn trapped_syscall(context: *const libc::c_void) -> u64 {
    let uc = context as *const libc::ucontext_t;
    (*uc).uc_mcontext.gregs[libc::REG_RAX as usize] as u64
}

/// Recover the syscall number from the register snapshot handed to a
/// `SA_SIGINFO` handler. aarch64 passes it in `x8`.
///
/// # Safety
///
/// `context` must be the third argument the kernel passed to the handler.
#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub unsafe fn trapped_syscall(context: *const libc::c_void) -> u64 {
    let uc = context as *const libc::ucontext_t;
    (*uc).uc_mcontext.regs[8] as u64
}
