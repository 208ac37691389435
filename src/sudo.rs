//! Privilege handling
//!
//! stackform itself runs as root. The only privilege change is the other
//! direction: database commands run as the PostgreSQL account via
//! `sudo -u`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[error(
        "stackform must run as root (effective uid {euid}); rerun with sudo or pass --skip-root-check"
    )]
    NotRoot { euid: u32 },
}

/// Effective user id of this process
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() }
}

/// Whether the process runs with an effective uid of 0
pub fn is_root() -> bool {
    effective_uid() == 0
}

/// Fail unless running as root, or the check is skipped
pub fn require_root(skip: bool) -> Result<(), PrivilegeError> {
    if skip {
        log::warn!("Skipping root check");
        return Ok(());
    }
    let euid = effective_uid();
    if euid == 0 {
        Ok(())
    } else {
        Err(PrivilegeError::NotRoot { euid })
    }
}

/// Arguments for `sudo` to run `cmd args...` as `user`
pub fn as_user<'a>(user: &'a str, cmd: &'a str, args: &[&'a str]) -> Vec<&'a str> {
    let mut full = vec!["-u", user, cmd];
    full.extend_from_slice(args);
    full
}
