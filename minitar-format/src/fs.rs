//! Filesystem lookups needed to fill in a header: owner names and device numbers.

use std::ffi::CStr;

const INITIAL_BUF_LEN: usize = 1024;
const MAX_BUF_LEN: usize = 1 << 20;

/// Resolve a numeric user id to its login name.
pub(crate) fn user_name(uid: u32) -> Option<Vec<u8>> {
    let mut buf = vec![0 as libc::c_char; INITIAL_BUF_LEN];

    loop {
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let rc = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE && buf.len() < MAX_BUF_LEN {
            let len = buf.len() * 2;
            buf.resize(len, 0);
            continue;
        }

        if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
            return None;
        }

        let name = unsafe { CStr::from_ptr(pwd.pw_name) };
        return Some(name.to_bytes().to_vec());
    }
}

/// Resolve a numeric group id to its group name.
pub(crate) fn group_name(gid: u32) -> Option<Vec<u8>> {
    let mut buf = vec![0 as libc::c_char; INITIAL_BUF_LEN];

    loop {
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();

        let rc = unsafe {
            libc::getgrgid_r(
                gid as libc::gid_t,
                &mut grp,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE && buf.len() < MAX_BUF_LEN {
            let len = buf.len() * 2;
            buf.resize(len, 0);
            continue;
        }

        if rc != 0 || result.is_null() || grp.gr_name.is_null() {
            return None;
        }

        let name = unsafe { CStr::from_ptr(grp.gr_name) };
        return Some(name.to_bytes().to_vec());
    }
}

/// Split a `st_dev` value into its major and minor numbers.
#[allow(unused_unsafe)]
pub(crate) fn device_numbers(dev: u64) -> (u64, u64) {
    let dev = dev as libc::dev_t;
    let (major, minor) = unsafe { (libc::major(dev), libc::minor(dev)) };
    (major as u64, minor as u64)
}
