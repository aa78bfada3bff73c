//! Classic BPF instruction encoding, as consumed by seccomp.
//!
//! Only the subset the filter builder emits is defined here.

use std::fmt;

// BPF instruction classes
pub const BPF_LD: u16 = 0x00;
pub const BPF_JMP: u16 = 0x05;
pub const BPF_RET: u16 = 0x06;

// ld/ldx fields
pub const BPF_W: u16 = 0x00;
pub const BPF_ABS: u16 = 0x20;

// alu/jmp fields
pub const BPF_JEQ: u16 = 0x10;
pub const BPF_JGE: u16 = 0x30;
pub const BPF_K: u16 = 0x00;

/// Kernel limit on filter length (linux/bpf_common.h)
pub const BPF_MAXINSNS: usize = 4096;

// struct seccomp_data offsets
pub const OFFSET_NR: u32 = 0;
pub const OFFSET_ARCH: u32 = 4;
/// Size of struct seccomp_data; loads at or past it are rejected.
pub const SECCOMP_DATA_LEN: u32 = 64;

/// struct sock_filter
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SockFilter {
    pub code: u16,
    pub jt: u8,
    pub jf: u8,
    pub k: u32,
}

/// struct sock_fprog
#[repr(C)]
pub struct SockFprog {
    pub len: u16,
    pub filter: *const SockFilter,
}

pub const fn bpf_stmt(code: u16, k: u32) -> SockFilter {
    SockFilter { code, jt: 0, jf: 0, k }
}

pub const fn bpf_jump(code: u16, k: u32, jt: u8, jf: u8) -> SockFilter {
    SockFilter { code, jt, jf, k }
}

impl fmt::Display for SockFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            c if c == BPF_LD | BPF_W | BPF_ABS => write!(f, "ld  [{}]", self.k),
            c if c == BPF_JMP | BPF_JEQ | BPF_K => {
                write!(f, "jeq #{:#x} jt {} jf {}", self.k, self.jt, self.jf)
            }
            c if c == BPF_JMP | BPF_JGE | BPF_K => {
                write!(f, "jge #{:#x} jt {} jf {}", self.k, self.jt, self.jf)
            }
            c if c == BPF_RET | BPF_K => write!(f, "ret #{:#010x}", self.k),
            _ => write!(
                f,
                "{{ code: {:#06x}, jt: {}, jf: {}, k: {:#x} }}",
                self.code, self.jt, self.jf, self.k
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_kernel() {
        assert_eq!(std::mem::size_of::<SockFilter>(), 8);
        assert_eq!(
            std::mem::size_of::<SockFprog>(),
            std::mem::size_of::<libc::sock_fprog>()
        );
    }

    #[test]
    fn test_display() {
        let ld = bpf_stmt(BPF_LD | BPF_W | BPF_ABS, OFFSET_ARCH);
        assert_eq!(ld.to_string(), "ld  [4]");
        let jeq = bpf_jump(BPF_JMP | BPF_JEQ | BPF_K, 0x3c, 0, 1);
        assert_eq!(jeq.to_string(), "jeq #0x3c jt 0 jf 1");
        let ret = bpf_stmt(BPF_RET | BPF_K, 0x7fff0000);
        assert_eq!(ret.to_string(), "ret #0x7fff0000");
    }
}
