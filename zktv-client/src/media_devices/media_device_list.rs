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

use super::{DeviceEnumerator, DeviceKind, MediaDeviceInfo};
use crate::error::{LiveError, Result};
use log::{debug, warn};
use std::sync::Arc;
use zktv_types::Callback;

/// A list of [`MediaDeviceInfo`] items of one kind with a current selection.
#[derive(Debug, Default)]
pub struct SelectableDevices {
    devices: Vec<MediaDeviceInfo>,
    selected: Option<String>,

    /// Called as `callback(device_id)` whenever [`select`](Self::select)
    /// succeeds.
    pub on_selected: Callback<String>,
}

impl SelectableDevices {
    /// Select a device by id. Returns `false` and does nothing when the id
    /// is not in [`devices()`](Self::devices).
    ///
    /// Selecting here does *not* touch any track; `on_selected` is expected
    /// to forward the id to the track manager.
    pub fn select(&mut self, device_id: &str) -> bool {
        if !self.contains(device_id) {
            return false;
        }
        self.selected = Some(device_id.to_string());
        self.on_selected.emit(device_id.to_string());
        true
    }

    pub fn devices(&self) -> &[MediaDeviceInfo] {
        &self.devices
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.iter().any(|d| d.device_id == device_id)
    }

    /// The selected device id, or the first device's id, or "" if empty.
    pub fn selected(&self) -> String {
        match &self.selected {
            Some(selected) => selected.clone(),
            None => self
                .devices
                .first()
                .map(|d| d.device_id.clone())
                .unwrap_or_default(),
        }
    }

    pub fn virtual_devices(&self) -> impl Iterator<Item = &MediaDeviceInfo> {
        self.devices.iter().filter(|d| d.is_virtual_camera())
    }

    fn replace(&mut self, devices: Vec<MediaDeviceInfo>) {
        self.devices = devices;
        if let Some(selected) = &self.selected {
            if !self.contains(selected) {
                warn!("selected device {selected} disappeared");
                self.selected = None;
            }
        }
    }
}

/// Queries the system for the available cameras and microphones and keeps a
/// selection for each.
///
/// ```ignore
/// let mut devices = MediaDeviceList::new(enumerator);
/// devices.video_inputs.on_selected = Callback::from(|id| ...);
/// devices.load().await?;
/// let cameras = devices.video_inputs.devices();
/// devices.video_inputs.select(&cameras[0].device_id);
/// ```
pub struct MediaDeviceList {
    enumerator: Arc<dyn DeviceEnumerator>,

    /// Read-only outside this module, `pub` for access.
    pub audio_inputs: SelectableDevices,

    pub video_inputs: SelectableDevices,

    /// Called after every successful [`load()`](Self::load).
    pub on_loaded: Callback<()>,
}

impl MediaDeviceList {
    pub fn new(enumerator: Arc<dyn DeviceEnumerator>) -> Self {
        Self {
            enumerator,
            audio_inputs: SelectableDevices::default(),
            video_inputs: SelectableDevices::default(),
            on_loaded: Callback::noop(),
        }
    }

    /// Enumerate devices, then fire `on_loaded`. On the first load the first
    /// device of each kind is auto-selected.
    pub async fn load(&mut self) -> Result<()> {
        let first_load = self.audio_inputs.devices.is_empty() && self.video_inputs.devices.is_empty();
        let devices = self.enumerator.enumerate_devices().await?;
        let (cameras, microphones): (Vec<_>, Vec<_>) = devices
            .into_iter()
            .partition(|d| d.kind == DeviceKind::Camera);
        debug!(
            "enumerated {} camera(s), {} microphone(s)",
            cameras.len(),
            microphones.len()
        );
        self.video_inputs.replace(cameras);
        self.audio_inputs.replace(microphones);
        self.on_loaded.emit(());

        if first_load {
            if let Some(id) = self.audio_inputs.devices.first().map(|d| d.device_id.clone()) {
                self.audio_inputs.select(&id);
            }
            if let Some(id) = self.video_inputs.devices.first().map(|d| d.device_id.clone()) {
                self.video_inputs.select(&id);
            }
        }
        Ok(())
    }

    pub fn inputs(&self, kind: DeviceKind) -> &SelectableDevices {
        match kind {
            DeviceKind::Camera => &self.video_inputs,
            DeviceKind::Microphone => &self.audio_inputs,
        }
    }

    /// Re-enumerate and fail with `DeviceUnavailable` when `device_id` is
    /// gone. Never trusts a stale list.
    pub async fn ensure_available(&mut self, kind: DeviceKind, device_id: &str) -> Result<()> {
        self.load().await?;
        if self.inputs(kind).contains(device_id) {
            Ok(())
        } else {
            Err(LiveError::DeviceUnavailable {
                kind,
                device_id: device_id.to_string(),
            })
        }
    }
}
