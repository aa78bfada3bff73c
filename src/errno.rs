//! Platform errno constants for building `Action::Errno` and for
//! interpreting the result of a denied call.
//!
//! One macro produces both the named constants and the `(name, value)`
//! table, so the values always follow the target `libc` was built for.

macro_rules! errno_table {
    ($($name:ident),* $(,)?) => {
        $(
            pub const $name: i32 = libc::$name;
        )*

        /// Every exported errno as `(name, value)`.
        pub const TABLE: &[(&str, i32)] = &[$((stringify!($name), libc::$name)),*];
    };
}

errno_table![
    EPERM, ENOENT, ESRCH, EINTR, EIO, ENXIO, E2BIG, ENOEXEC, EBADF, ECHILD,
    EAGAIN, ENOMEM, EACCES, EFAULT, ENOTBLK, EBUSY, EEXIST, EXDEV, ENODEV,
    ENOTDIR, EISDIR, EINVAL, ENFILE, EMFILE, ENOTTY, ETXTBSY, EFBIG, ENOSPC,
    ESPIPE, EROFS, EMLINK, EPIPE, EDOM, ERANGE, EDEADLK, ENAMETOOLONG,
    ENOLCK, ENOSYS, ENOTEMPTY, ELOOP, ENOMSG, EIDRM, ENOSTR, ENODATA, ETIME,
    ENOSR, ENOLINK, EPROTO, EBADMSG, EOVERFLOW, EILSEQ, EUSERS, ENOTSOCK,
    EDESTADDRREQ, EMSGSIZE, EPROTOTYPE, ENOPROTOOPT, EPROTONOSUPPORT,
    ESOCKTNOSUPPORT, EOPNOTSUPP, EPFNOSUPPORT, EAFNOSUPPORT, EADDRINUSE,
    EADDRNOTAVAIL, ENETDOWN, ENETUNREACH, ENETRESET, ECONNABORTED,
    ECONNRESET, ENOBUFS, EISCONN, ENOTCONN, ESHUTDOWN, ETOOMANYREFS,
    ETIMEDOUT, ECONNREFUSED, EHOSTDOWN, EHOSTUNREACH, EALREADY, EINPROGRESS,
    ESTALE, EDQUOT, ECANCELED, EOWNERDEAD, ENOTRECOVERABLE,
];

/// Resolve an errno given either its symbolic name (case-insensitive) or
/// its decimal value.
pub fn lookup(name: &str) -> Option<i32> {
    if let Ok(value) = name.parse::<i32>() {
        return Some(value);
    }
    TABLE
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, v)| v)
}

/// Symbolic name of `value`, if it is in the table.
pub fn name(value: i32) -> Option<&'static str> {
    TABLE.iter().find(|&&(_, v)| v == value).map(|&(n, _)| n)
}
