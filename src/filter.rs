//! seccomp-bpf program builder.
//!
//! Layout of a built program:
//!
//! ```text
//!   ld  [arch]
//!   jeq AUDIT_ARCH jt 1 jf 0
//!   ret KILL_PROCESS                 ; wrong architecture
//!   ld  [nr]
//!   jge X32_SYSCALL_BIT jt 0 jf 1    ; x86_64 only
//!   ret KILL_PROCESS                 ; x32 ABI
//!   jeq <nr> jt 0 jf 1               ; one pair per allowed syscall
//!   ret ALLOW
//!   ...
//!   ret <default action>
//! ```
//!
//! Building has no side effects. Installation lives in `install`.

use crate::action::{Action, MAX_ERRNO, SECCOMP_RET_ALLOW, SECCOMP_RET_KILL_PROCESS};
use crate::arch;
use crate::bpf::{
    bpf_jump, bpf_stmt, SockFilter, SockFprog, BPF_ABS, BPF_JEQ, BPF_JGE, BPF_JMP, BPF_K,
    BPF_LD, BPF_MAXINSNS, BPF_RET, BPF_W, OFFSET_ARCH, OFFSET_NR, SECCOMP_DATA_LEN,
};
use crate::error::{Error, Result};
use crate::syscalls;
use std::fmt;

/// A compiled filter, ready to hand to `install`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterProgram {
    instructions: Vec<SockFilter>,
    allowed: Vec<i64>,
    default_action: Action,
}

/// Compile an allow-list of syscall names.
///
/// Every name must exist on the compiled-for architecture.
pub fn build(allow: &[&str], default_action: Action) -> Result<FilterProgram> {
    FilterProgram::build(allow, default_action)
}

/// Resolve syscall names to numbers, keeping first-seen order and dropping
/// repeats.
pub fn resolve(names: &[&str]) -> Result<Vec<i64>> {
    let mut codes = Vec::with_capacity(names.len());
    for name in names {
        let nr = syscalls::number(name).ok_or_else(|| Error::UnknownSyscall(name.to_string()))?;
        if !codes.contains(&nr) {
            codes.push(nr);
        }
    }
    Ok(codes)
}

impl FilterProgram {
    pub fn build(allow: &[&str], default_action: Action) -> Result<Self> {
        let codes = resolve(allow)?;
        Self::from_codes(&codes, default_action)
    }

    /// Compile already-resolved syscall numbers.
    pub fn from_codes(codes: &[i64], default_action: Action) -> Result<Self> {
        if let Action::Errno(errno) = default_action {
            // errno 0 makes the kernel skip the call and report success
            if errno == 0 || errno > MAX_ERRNO {
                return Err(Error::InvalidProgram(format!(
                    "errno {errno} outside 1..={MAX_ERRNO}"
                )));
            }
        }

        let mut allowed: Vec<i64> = Vec::with_capacity(codes.len());
        for &nr in codes {
            if nr < 0 || nr > i64::from(u32::MAX) {
                return Err(Error::InvalidProgram(format!(
                    "syscall number {nr} does not fit a BPF constant"
                )));
            }
            if !allowed.contains(&nr) {
                allowed.push(nr);
            }
        }

        let mut instructions = Vec::with_capacity(prologue_len() + 2 * allowed.len() + 1);

        // Load architecture, kill if it is not ours
        instructions.push(bpf_stmt(BPF_LD | BPF_W | BPF_ABS, OFFSET_ARCH));
        instructions.push(bpf_jump(BPF_JMP | BPF_JEQ | BPF_K, arch::AUDIT_ARCH, 1, 0));
        instructions.push(bpf_stmt(BPF_RET | BPF_K, SECCOMP_RET_KILL_PROCESS));

        // Load syscall number
        instructions.push(bpf_stmt(BPF_LD | BPF_W | BPF_ABS, OFFSET_NR));

        #[cfg(target_arch = "x86_64")]
        {
            instructions.push(bpf_jump(BPF_JMP | BPF_JGE | BPF_K, arch::X32_SYSCALL_BIT, 0, 1));
            instructions.push(bpf_stmt(BPF_RET | BPF_K, SECCOMP_RET_KILL_PROCESS));
        }

        for &nr in &allowed {
            instructions.push(bpf_jump(BPF_JMP | BPF_JEQ | BPF_K, nr as u32, 0, 1));
            instructions.push(bpf_stmt(BPF_RET | BPF_K, SECCOMP_RET_ALLOW));
        }

        instructions.push(bpf_stmt(BPF_RET | BPF_K, default_action.to_ret()));

        if instructions.len() > BPF_MAXINSNS {
            return Err(Error::InvalidProgram(format!(
                "{} instructions exceeds the kernel limit of {}",
                instructions.len(),
                BPF_MAXINSNS
            )));
        }

        Ok(Self {
            instructions,
            allowed,
            default_action,
        })
    }

    pub fn instructions(&self) -> &[SockFilter] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Allowed syscall numbers in program order.
    pub fn allowed(&self) -> &[i64] {
        &self.allowed
    }

    pub fn default_action(&self) -> Action {
        self.default_action
    }

    /// Borrow the program as the `struct sock_fprog` the kernel expects.
    /// The returned value points into `self` and must not outlive it.
    pub(crate) fn as_fprog(&self) -> SockFprog {
        SockFprog {
            len: self.instructions.len() as u16,
            filter: self.instructions.as_ptr(),
        }
    }

    /// Run the program against a synthetic `seccomp_data` holding only
    /// `arch` and `nr`, returning the `SECCOMP_RET_*` word.
    ///
    /// Anything the interpreter does not understand fails closed with
    /// `SECCOMP_RET_KILL_PROCESS`.
    pub fn evaluate(&self, arch: u32, nr: u32) -> u32 {
        let mut acc: u32 = 0;
        let mut pc: usize = 0;

        while let Some(insn) = self.instructions.get(pc) {
            match insn.code {
                c if c == BPF_LD | BPF_W | BPF_ABS => {
                    acc = match insn.k {
                        OFFSET_NR => nr,
                        OFFSET_ARCH => arch,
                        k if k < SECCOMP_DATA_LEN && k % 4 == 0 => 0,
                        _ => return SECCOMP_RET_KILL_PROCESS,
                    };
                    pc += 1;
                }
                c if c == BPF_JMP | BPF_JEQ | BPF_K => {
                    let hop = if acc == insn.k { insn.jt } else { insn.jf };
                    pc += 1 + hop as usize;
                }
                c if c == BPF_JMP | BPF_JGE | BPF_K => {
                    let hop = if acc >= insn.k { insn.jt } else { insn.jf };
                    pc += 1 + hop as usize;
                }
                c if c == BPF_RET | BPF_K => return insn.k,
                _ => return SECCOMP_RET_KILL_PROCESS,
            }
        }

        SECCOMP_RET_KILL_PROCESS
    }

    /// `evaluate` for the compiled-for architecture.
    pub fn evaluate_native(&self, nr: i64) -> u32 {
        self.evaluate(arch::AUDIT_ARCH, nr as u32)
    }
}

impl fmt::Display for FilterProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, insn) in self.instructions.iter().enumerate() {
            write!(f, "{i:4}: {insn}")?;
            if insn.code == BPF_JMP | BPF_JEQ | BPF_K && i >= prologue_len() {
                if let Some(name) = syscalls::name(i64::from(insn.k)) {
                    write!(f, "    ; {name}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Instructions emitted before the first allow-list comparison.
const fn prologue_len() -> usize {
    if cfg!(target_arch = "x86_64") {
        6
    } else {
        4
    }
}
