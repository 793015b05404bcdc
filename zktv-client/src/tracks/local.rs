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

use crate::constants::DEFAULT_MIC_VOLUME;
use crate::error::{LiveError, Result};
use crate::media_devices::{DeviceEnumerator, DeviceKind, MediaDeviceList};
use crate::rtc::{DisplayCapture, EncoderConfig, LocalTrack, MediaFactory};
use log::{debug, info, warn};
use std::sync::Arc;
use zktv_types::FeatureFlags;

pub const DESKTOP_AUDIO_WORKAROUND: &str =
    "route desktop audio through external broadcast software such as OBS";

/// Owns the host's local tracks: at most one camera, one microphone and one
/// desktop-audio track.
///
/// A camera or microphone is an exclusive OS handle, so the previous track of
/// a kind is always stopped and closed before its replacement is created.
pub struct LocalTrackManager {
    factory: Arc<dyn MediaFactory>,
    devices: MediaDeviceList,
    encoder: EncoderConfig,
    camera: Option<Arc<dyn LocalTrack>>,
    microphone: Option<Arc<dyn LocalTrack>>,
    desktop_audio: Option<Arc<dyn LocalTrack>>,
    desktop_capture: Option<DisplayCapture>,
    mic_volume: u8,
    desktop_audio_allowed: bool,
}

impl LocalTrackManager {
    pub fn new(factory: Arc<dyn MediaFactory>, enumerator: Arc<dyn DeviceEnumerator>) -> Self {
        Self {
            factory,
            devices: MediaDeviceList::new(enumerator),
            encoder: EncoderConfig::default(),
            camera: None,
            microphone: None,
            desktop_audio: None,
            desktop_capture: None,
            mic_volume: DEFAULT_MIC_VOLUME,
            desktop_audio_allowed: FeatureFlags::desktop_audio_enabled(),
        }
    }

    /// Override the `FEATURE_DESKTOP_AUDIO` flag for this manager.
    pub fn with_desktop_audio(mut self, allowed: bool) -> Self {
        self.desktop_audio_allowed = allowed;
        self
    }

    pub fn devices(&self) -> &MediaDeviceList {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut MediaDeviceList {
        &mut self.devices
    }

    pub fn camera(&self) -> Option<Arc<dyn LocalTrack>> {
        self.camera.clone()
    }

    pub fn microphone(&self) -> Option<Arc<dyn LocalTrack>> {
        self.microphone.clone()
    }

    pub fn desktop_audio(&self) -> Option<Arc<dyn LocalTrack>> {
        self.desktop_audio.clone()
    }

    /// Every held track in publish order: camera, microphone, desktop audio.
    pub fn held_tracks(&self) -> Vec<Arc<dyn LocalTrack>> {
        [&self.camera, &self.microphone, &self.desktop_audio]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn microphone_volume(&self) -> u8 {
        self.mic_volume
    }

    pub async fn create_video_track(
        &mut self,
        device_id: &str,
        encoder: EncoderConfig,
    ) -> Result<Arc<dyn LocalTrack>> {
        self.devices
            .ensure_available(DeviceKind::Camera, device_id)
            .await?;
        release(self.camera.take());
        let track = self
            .factory
            .create_camera_track(device_id, &encoder)
            .await?;
        info!(
            "camera track {} created on {device_id} ({}x{}@{})",
            track.track_id(),
            encoder.width,
            encoder.height,
            encoder.frame_rate
        );
        self.encoder = encoder;
        self.camera = Some(track.clone());
        Ok(track)
    }

    pub async fn create_audio_track(&mut self, device_id: &str) -> Result<Arc<dyn LocalTrack>> {
        self.devices
            .ensure_available(DeviceKind::Microphone, device_id)
            .await?;
        release(self.microphone.take());
        let track = self.factory.create_microphone_track(device_id).await?;
        track.set_volume(self.mic_volume);
        info!("microphone track {} created on {device_id}", track.track_id());
        self.microphone = Some(track.clone());
        Ok(track)
    }

    /// Set the microphone volume, clamped to 0..=100. Applies to the live
    /// track and to every microphone track created later.
    pub fn set_microphone_volume(&mut self, volume: u32) -> u8 {
        self.mic_volume = volume.min(100) as u8;
        if let Some(track) = &self.microphone {
            track.set_volume(self.mic_volume);
        }
        self.mic_volume
    }

    /// Move a track to another device. A published track is hot-swapped in
    /// place; a preview track is torn down and recreated.
    pub async fn switch_device(
        &mut self,
        kind: DeviceKind,
        device_id: &str,
        streaming: bool,
    ) -> Result<Arc<dyn LocalTrack>> {
        let current = match kind {
            DeviceKind::Camera => self.camera.clone(),
            DeviceKind::Microphone => self.microphone.clone(),
        };
        match current {
            Some(track) if streaming => {
                self.devices.ensure_available(kind, device_id).await?;
                track.set_device(device_id).await?;
                debug!("hot-swapped {kind} to {device_id}");
                Ok(track)
            }
            _ => match kind {
                DeviceKind::Camera => {
                    let encoder = self.encoder;
                    self.create_video_track(device_id, encoder).await
                }
                DeviceKind::Microphone => self.create_audio_track(device_id).await,
            },
        }
    }

    /// Capture system audio and wrap it as a publishable track.
    pub async fn start_desktop_audio(&mut self) -> Result<Arc<dyn LocalTrack>> {
        if !self.desktop_audio_allowed || !self.factory.supports_custom_audio_track() {
            return Err(LiveError::unsupported(
                "Desktop audio capture",
                DESKTOP_AUDIO_WORKAROUND,
            ));
        }
        self.stop_desktop_audio();

        let capture = self.factory.capture_display().await?;
        if capture.audio_track_ids.is_empty() {
            self.factory.release_capture(&capture);
            return Err(LiveError::NoAudioTrackSelected);
        }
        let track = match self.factory.create_custom_audio_track(&capture).await {
            Ok(track) => track,
            Err(e) => {
                self.factory.release_capture(&capture);
                return Err(e.into());
            }
        };
        info!("desktop audio track {} created", track.track_id());
        self.desktop_audio = Some(track.clone());
        self.desktop_capture = Some(capture);
        Ok(track)
    }

    pub fn stop_desktop_audio(&mut self) {
        release(self.desktop_audio.take());
        if let Some(capture) = self.desktop_capture.take() {
            self.factory.release_capture(&capture);
        }
    }

    /// Stop then close desktop audio, microphone and camera, in that order.
    pub fn teardown(&mut self) {
        self.stop_desktop_audio();
        release(self.microphone.take());
        release(self.camera.take());
    }
}

impl Drop for LocalTrackManager {
    fn drop(&mut self) {
        if !self.held_tracks().is_empty() {
            warn!("local track manager dropped with live tracks, releasing");
            self.teardown();
        }
    }
}

fn release(track: Option<Arc<dyn LocalTrack>>) {
    if let Some(track) = track {
        debug!("releasing {} track {}", track.kind(), track.track_id());
        track.stop();
        track.close();
    }
}
