use derive_more::Display;

/// Terminal failures of a run.
///
/// A vehicle that never wakes up and an active trip mode are *not* here:
/// those are expected outcomes ([`crate::core::reconcile::Outcome`]), and the
/// process still exits with zero.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No concrete price exists in either fetched day, so there is nothing to
    /// decide. Also raised when the feed violates its 24-hourly-points
    /// contract.
    #[error("no usable price data is available")]
    DataUnavailable,

    /// The credentials were rejected. Carries the credential mode only, never
    /// the secret values.
    #[error("the {mode} credentials were rejected")]
    AuthFailure { mode: AuthMode },

    /// The charge-limit command failed even though the vehicle was confirmed
    /// online. Distinct from a reachability failure.
    #[error("failed to set the charge limit on a reachable vehicle")]
    ActuationFailure,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Display)]
pub enum AuthMode {
    #[display("access token")]
    Token,

    #[display("username and password")]
    Password,
}
