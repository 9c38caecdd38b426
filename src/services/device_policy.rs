//! Single-device binding for student accounts.

/// What a login attempt does to the account's device binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeviceDecision {
    /// No device bound yet; bind this one.
    Bind(String),
    /// The presented device matches the binding, or there is nothing to bind.
    Proceed,
    /// A device is bound and the attempt presented a different one or none.
    Mismatch,
}

pub(crate) fn evaluate(bound: Option<&str>, presented: Option<&str>) -> DeviceDecision {
    let presented = presented.map(str::trim).filter(|value| !value.is_empty());

    match (bound, presented) {
        (None, Some(device)) => DeviceDecision::Bind(device.to_string()),
        (None, None) => DeviceDecision::Proceed,
        (Some(bound), Some(device)) if bound == device => DeviceDecision::Proceed,
        (Some(_), _) => DeviceDecision::Mismatch,
    }
}

/// Whether a mismatch count reaches the configured auto-ban threshold. Zero disables auto-ban.
pub(crate) fn should_ban(mismatch_attempts: i32, threshold: u32) -> bool {
    threshold > 0 && i64::from(mismatch_attempts) >= i64::from(threshold)
}
