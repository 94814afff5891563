//! Fatal fault conditions.
//!
//! A miscounted axis in a motion system damages workpieces, so every fault
//! here halts the axis instead of running on with suspect state. The firmware
//! reacts to any of these by disabling the driver and stopping the control
//! loop; there is no local recovery.

/// Non-recoverable fault raised by the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shutdown {
    /// Closed-loop mode was requested while the servo was in a mode that
    /// cannot anchor the encoder offset (e.g. torque mode).
    PidModeTransition,
    /// The host sent a mode code outside the known set.
    UnknownServoMode,
    /// Encoder samples scattered by more than one full step while averaging
    /// the rest position during closed-loop initialization.
    EncoderVariance,
    /// A command referenced an object id with no configured instance.
    InvalidOid,
    /// An object id was configured twice or the registry is full.
    OidInUse,
}

impl Shutdown {
    /// Human-readable message reported to the host on shutdown.
    pub const fn message(&self) -> &'static str {
        match self {
            Shutdown::PidModeTransition => "PID mode must transition from open-loop",
            Shutdown::UnknownServoMode => "Unknown Servo Mode",
            Shutdown::EncoderVariance => "Encoder variance too large",
            Shutdown::InvalidOid => "Invalid oid",
            Shutdown::OidInUse => "Can't assign oid",
        }
    }
}

impl core::fmt::Display for Shutdown {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}
