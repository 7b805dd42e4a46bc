// ── Domain model ──

mod count;
mod device;

pub use count::DeviceCount;
pub use device::{DeviceId, DevicePatch, DeviceRecord};
