use crate::audio;
use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, StreamConfig};
use std::sync::{Arc, Mutex};

/// Microphone capture into memory.
pub struct Recorder {
    device: Device,
}

impl Recorder {
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = crate::device::get_or_default_input(device_name)
            .context("Failed to get audio input device")?;
        tracing::info!("Using input device: {:?}", device.name()?);
        Ok(Self { device })
    }

    /// Opens and starts an input stream. Capture continues until the
    /// returned recording is finished or dropped.
    pub fn start(&self) -> Result<ActiveRecording> {
        let default_config = self
            .device
            .default_input_config()
            .context("Failed to get default input config")?;
        let config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: default_config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        let channel_count = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        tracing::debug!("Input stream config: {:?}", &config);

        let samples = Arc::new(Mutex::new(Vec::<f32>::new()));
        let sink = Arc::clone(&samples);
        let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let mono = audio::downmix(data, channel_count);
            match sink.lock() {
                Ok(mut buffer) => buffer.extend_from_slice(&mono),
                Err(e) => tracing::warn!("Dropping input audio, buffer poisoned: {}", e),
            }
        };

        let stream = self
            .device
            .build_input_stream(
                &config,
                input_data_fn,
                move |err| tracing::error!("An error occurred on input stream: {}", err),
                None,
            )
            .context("Failed to build input stream")?;
        stream.play().context("Failed to start input stream")?;

        Ok(ActiveRecording {
            stream,
            samples,
            sample_rate,
        })
    }
}

/// A running capture. Dropping it stops the stream and discards the audio.
pub struct ActiveRecording {
    stream: cpal::Stream,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
}

impl ActiveRecording {
    /// Stops the stream and returns everything captured so far.
    pub fn finish(self) -> Result<RecordedAudio> {
        if let Err(e) = self.stream.pause() {
            tracing::debug!("Failed to pause input stream: {}", e);
        }
        drop(self.stream);

        let samples = self
            .samples
            .lock()
            .map_err(|e| anyhow!("Recording buffer poisoned: {}", e))?
            .split_off(0);
        tracing::debug!(
            "Captured {} samples at {} Hz",
            samples.len(),
            self.sample_rate
        );
        Ok(RecordedAudio {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

/// Mono samples captured from the microphone.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl RecordedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn to_wav(&self) -> Result<Vec<u8>> {
        audio::encode_wav(&self.samples, self.sample_rate)
    }
}
