use wordgame_core::capture::{CaptureDevice, CaptureResult, Recording};
use wordgame_core::error::GameError;
use wordgame_core::speech::CapturedAudio;
use wordgame_native_utils::recorder::{ActiveRecording, Recorder};

/// `CaptureDevice` backed by the system microphone.
///
/// The input device is opened on every `start`, so a microphone plugged in
/// or permitted after launch is picked up on the next attempt.
pub struct Microphone {
    device_name: Option<String>,
}

impl Microphone {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl CaptureDevice for Microphone {
    fn start(&self) -> CaptureResult<Box<dyn Recording>> {
        let recorder = Recorder::new(self.device_name.as_deref())
            .map_err(|e| GameError::CaptureDeviceUnavailable(format!("{e:#}")))?;
        let active = recorder
            .start()
            .map_err(|e| GameError::CaptureDeviceUnavailable(format!("{e:#}")))?;
        tracing::debug!("Microphone opened");
        Ok(Box::new(MicrophoneRecording { active }))
    }
}

struct MicrophoneRecording {
    active: ActiveRecording,
}

impl Recording for MicrophoneRecording {
    fn finish(self: Box<Self>) -> CaptureResult<CapturedAudio> {
        let recorded = self
            .active
            .finish()
            .map_err(|e| GameError::CaptureDeviceUnavailable(format!("{e:#}")))?;
        if recorded.samples.is_empty() {
            return Err(GameError::CaptureDeviceUnavailable(
                "no audio was captured".to_string(),
            ));
        }
        tracing::info!("Recorded {:.1}s of audio", recorded.duration_secs());
        let bytes = recorded
            .to_wav()
            .map_err(|e| GameError::CaptureDeviceUnavailable(format!("{e:#}")))?;
        Ok(CapturedAudio {
            bytes,
            mime_type: "audio/wav".to_string(),
        })
    }
}
