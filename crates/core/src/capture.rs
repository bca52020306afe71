use crate::error::GameError;
use crate::speech::CapturedAudio;

pub type CaptureResult<T> = Result<T, GameError>;

/// An open microphone.
///
/// The device stays acquired for as long as the value lives. Dropping it
/// without calling `finish` releases the device and discards the audio.
pub trait Recording {
    /// Stops the capture, releases the device and returns what was recorded.
    fn finish(self: Box<Self>) -> CaptureResult<CapturedAudio>;
}

/// Something that can open a `Recording`.
pub trait CaptureDevice {
    /// Fails with `CaptureDeviceUnavailable` on permission or device errors.
    fn start(&self) -> CaptureResult<Box<dyn Recording>>;
}
