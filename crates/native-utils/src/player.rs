use crate::audio;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use ringbuf::HeapProd;
use ringbuf::traits::{Consumer, Producer, Split};

/// Seconds of audio the output buffer can hold.
const OUTPUT_BUFFER_SECS: usize = 30;

/// Speaker output fed from a ring buffer.
pub struct AudioPlayer {
    _stream: cpal::Stream,
    producer: HeapProd<f32>,
    sample_rate: u32,
}

impl AudioPlayer {
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let output = crate::device::get_or_default_output(device_name)
            .context("Failed to get audio output device")?;
        tracing::info!("Using output device: {:?}", output.name()?);

        let default_config = output
            .default_output_config()
            .context("Failed to get default output config")?;
        let config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: default_config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        let channel_count = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        tracing::debug!("Output stream config: {:?}", &config);

        let buffer = audio::shared_buffer(sample_rate as usize * OUTPUT_BUFFER_SECS);
        let (producer, mut consumer) = buffer.split();

        // Same sample on every channel; silence when the buffer runs dry.
        let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channel_count.max(1)) {
                let sample = consumer.try_pop().unwrap_or(0.0);
                frame.fill(sample);
            }
        };

        let stream = output
            .build_output_stream(
                &config,
                output_data_fn,
                move |err| tracing::error!("An error occurred on output stream: {}", err),
                None,
            )
            .context("Failed to build output stream")?;
        stream.play().context("Failed to start output stream")?;

        Ok(Self {
            _stream: stream,
            producer,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Queues little-endian mono PCM16 audio recorded at `source_rate`.
    /// Returns the number of device samples queued.
    pub fn play_pcm16(&mut self, bytes: &[u8], source_rate: u32) -> Result<usize> {
        let samples = audio::pcm16_le_to_f32(bytes);
        let samples = audio::resample(&samples, source_rate as f64, self.sample_rate as f64)?;
        let pushed = self.producer.push_slice(&samples);
        if pushed < samples.len() {
            tracing::warn!(
                "Output buffer full, dropped {} samples",
                samples.len() - pushed
            );
        }
        Ok(pushed)
    }
}
