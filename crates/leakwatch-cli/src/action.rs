use strum::{Display, EnumString, VariantNames};

/// Lifecycle actions accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub(crate) enum Action {
    /// Detach and run the sensor watch loop.
    Start,
    /// Interrupt the running daemon.
    Stop,
    /// Stop, then start.
    Restart,
    /// Report whether the daemon is running.
    Status,
}

impl Action {
    /// Valid choices joined for operator messages.
    pub(crate) fn choices() -> String {
        Self::VARIANTS.join("|")
    }
}
