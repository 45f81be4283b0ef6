//! Per-reading fault bitset
//!
//! Bit positions 0-2 mirror the thermocouple chip's own status bits so a
//! 32-bit frame's low nibble can be copied across unchanged.

use core::ops::{BitOr, BitOrAssign};

/// Fault bits attached to a single [`Reading`](super::Reading)
///
/// All bits are recomputed on every read of the channel they belong to,
/// so a fault latches only until the next clean read of that same channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultFlags(u16);

impl FaultFlags {
    /// Thermocouple open circuit (reported by the chip)
    pub const OPEN_CIRCUIT: Self = Self(1 << 0);
    /// Thermocouple shorted to ground (reported by the chip)
    pub const GND_SHORT: Self = Self(1 << 1);
    /// Thermocouple shorted to supply (reported by the chip)
    pub const VCC_SHORT: Self = Self(1 << 2);
    /// Chip fault-present bit set without a specific cause bit
    pub const CHIP_FAULT: Self = Self(1 << 3);
    /// All-zero frame: data line disconnected
    pub const ALL_ZEROS: Self = Self(1 << 4);
    /// All-ones frame: chip not responding to clock/select
    pub const ALL_ONES: Self = Self(1 << 5);
    /// Cold-junction temperature outside its plausible window
    pub const INTERNAL_RANGE: Self = Self(1 << 6);
    /// Thermocouple temperature outside its plausible window
    pub const EXTERNAL_RANGE: Self = Self(1 << 7);
    /// Bus not trusted (register readback mismatch or conversion timeout)
    pub const BUS: Self = Self(1 << 8);

    /// Probe faults reported by the chip itself
    pub const PROBE: Self = Self(0b1111);
    /// Frame integrity faults
    pub const FRAME_INTEGRITY: Self = Self(Self::ALL_ZEROS.0 | Self::ALL_ONES.0);
    /// Range faults, either kind
    pub const RANGE: Self = Self(Self::INTERNAL_RANGE.0 | Self::EXTERNAL_RANGE.0);

    /// No faults
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Construct from raw bits, dropping undefined positions
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & 0x01FF)
    }

    /// Raw bit pattern
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check if no fault bit is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if any bit of `other` is set
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Set the bits of `other`
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Set or clear the bits of `other`
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for FaultFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FaultFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
