//! Device registry - known VPforce IDs and the FFB interface filter

/// VPforce vendor ID (pid.codes style open VID used by the firmware)
pub const VENDOR_ID: u16 = 0xFFFF;

/// Rhino FFB joystick
pub const RHINO_PID: u16 = 0x2055;

/// Known force-feedback product IDs
pub const FFB_PIDS: &[u16] = &[
    RHINO_PID, // Rhino stick base
];

/// Generic Desktop usage page
pub const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;

/// Joystick usage within the Generic Desktop page
pub const USAGE_JOYSTICK: u16 = 0x04;

/// Interface carrying the joystick + PID collections
pub const FFB_INTERFACE: i32 = 0;

/// Check if PID is a known FFB device
#[inline]
pub fn is_ffb_pid(pid: u16) -> bool {
    FFB_PIDS.contains(&pid)
}

/// Check if an enumerated collection is the top-level FFB joystick
///
/// The firmware exposes several collections; only interface 0 with the
/// joystick usage accepts PID output reports.
#[inline]
pub fn is_ffb_interface(interface_number: i32, usage_page: u16, usage: u16) -> bool {
    interface_number == FFB_INTERFACE
        && usage_page == USAGE_PAGE_GENERIC_DESKTOP
        && usage == USAGE_JOYSTICK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pids() {
        assert!(is_ffb_pid(0x2055));
        assert!(!is_ffb_pid(0x2056));
    }

    #[test]
    fn test_interface_filter() {
        assert!(is_ffb_interface(0, 0x01, 0x04));
        assert!(!is_ffb_interface(1, 0x01, 0x04)); // auxiliary interface
        assert!(!is_ffb_interface(0, 0x01, 0x05)); // gamepad usage
        assert!(!is_ffb_interface(0, 0xFF00, 0x04)); // vendor page
    }
}
