//! Status to embed color mapping.

use crate::alert::GroupStatus;

/// `#D63232`, used while any alert in the group fires.
pub const COLOR_FIRING: u32 = 0xD6_32_32;
/// `#36A64F`, used once every alert is resolved.
pub const COLOR_RESOLVED: u32 = 0x36_A6_4F;
/// `#808080`, used for statuses with no dedicated color.
pub const COLOR_NEUTRAL: u32 = 0x80_80_80;

/// Returns the embed color for an aggregate group status.
pub fn color_for(status: GroupStatus) -> u32 {
    match status {
        GroupStatus::Firing | GroupStatus::Mixed => COLOR_FIRING,
        GroupStatus::Resolved => COLOR_RESOLVED,
        GroupStatus::Unknown => COLOR_NEUTRAL,
    }
}
