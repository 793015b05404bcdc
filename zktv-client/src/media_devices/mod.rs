/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

mod media_device_list;

pub use media_device_list::{MediaDeviceList, SelectableDevices};

use crate::rtc::RtcError;
use async_trait::async_trait;
use std::fmt;

/// Labels that identify a software camera rather than a physical one.
const VIRTUAL_CAMERA_MARKERS: &[&str] = &[
    "obs",
    "virtual",
    "snap camera",
    "manycam",
    "xsplit",
    "droidcam",
    "epoccam",
    "ndi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Camera,
    Microphone,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Camera => write!(f, "camera"),
            DeviceKind::Microphone => write!(f, "microphone"),
        }
    }
}

/// One entry of the system's input device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub label: String,
    pub kind: DeviceKind,
}

impl MediaDeviceInfo {
    pub fn new(device_id: &str, label: &str, kind: DeviceKind) -> Self {
        Self {
            device_id: device_id.to_string(),
            label: label.to_string(),
            kind,
        }
    }

    pub fn is_virtual_camera(&self) -> bool {
        self.kind == DeviceKind::Camera && is_virtual_camera(&self.label)
    }
}

/// Whether a camera label belongs to broadcast software (OBS, ManyCam, ...).
pub fn is_virtual_camera(label: &str) -> bool {
    let label = label.to_lowercase();
    VIRTUAL_CAMERA_MARKERS
        .iter()
        .any(|marker| label.contains(marker))
}

/// Queries the system for the currently available input devices.
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, RtcError>;
}
