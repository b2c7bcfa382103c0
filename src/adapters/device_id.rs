//! Device identity derived from the factory MAC address.
//!
//! The collector keys readings by `chipId`: the last three MAC bytes read
//! as one 24-bit number.  Logs use the same bytes as a label `RL-XXYYZZ`.

use core::fmt::Write;

/// Printable device label: "RL-XXYYZZ".
pub type DeviceLabel = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// 24-bit chip identifier from the last three MAC bytes.
pub fn chip_id(mac: &MacAddress) -> u32 {
    u32::from_be_bytes([0, mac[3], mac[4], mac[5]])
}

/// Format: `RL-XXYYZZ` (e.g., `RL-EFCAFE`).
pub fn device_label(mac: &MacAddress) -> DeviceLabel {
    let mut id = DeviceLabel::new();
    let _ = write!(id, "RL-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}
