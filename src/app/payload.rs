//! JSON body of a delivery POST.
//!
//! The collector reads `chipId` and `distance`; periodic-mode bodies also
//! carry a greeting `message`.  `distance` is a JSON number printed with
//! exactly two decimals (`20.00`, `0.00` for an invalid reading), so it is
//! spliced in as a raw value instead of going through `f32` formatting.

use serde::Serialize;
use serde_json::value::RawValue;

use crate::sensors::RangeReading;

/// Fields of one delivery.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryPayload<'a> {
    pub message: Option<&'a str>,
    pub counter: u32,
    pub chip_id: u32,
    pub reading: RangeReading,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Wire<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    counter: u32,
    chip_id: u32,
    distance: Box<RawValue>,
}

impl DeliveryPayload<'_> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let distance = RawValue::from_string(format!("{:.2}", self.reading.centimetres()))?;
        serde_json::to_string(&Wire {
            message: self.message,
            counter: self.counter,
            chip_id: self.chip_id,
            distance,
        })
    }
}
