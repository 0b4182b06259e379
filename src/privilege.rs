//! Identity checks for state-changing actions
//!
//! Package changes are never attempted without elevated identity. The check
//! sits behind a trait so the provider can be driven without root.

/// Decides whether the current process may change packages.
pub trait PrivilegeCheck {
    fn is_privileged(&self) -> bool;
}

/// Checks the effective user id of the process.
pub struct EffectiveUid;

impl PrivilegeCheck for EffectiveUid {
    #[cfg(unix)]
    fn is_privileged(&self) -> bool {
        // geteuid cannot fail
        #[allow(unsafe_code)]
        let euid = unsafe { libc::geteuid() };
        log::debug!("Effective uid: {euid}");
        euid == 0
    }

    #[cfg(not(unix))]
    fn is_privileged(&self) -> bool {
        false
    }
}

/// Fixed answer
#[cfg(test)]
pub struct AssumePrivileged(pub bool);

#[cfg(test)]
impl PrivilegeCheck for AssumePrivileged {
    fn is_privileged(&self) -> bool {
        self.0
    }
}
