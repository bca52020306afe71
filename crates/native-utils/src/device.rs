use anyhow::{Context, Result, anyhow};
use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

fn get_host() -> cpal::Host {
    cpal::default_host()
}

/// Finds the named input device, or the host's default one when no name is given.
pub fn get_or_default_input(device_name: Option<&str>) -> Result<Device> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());

    let Some(name) = device_name else {
        return host
            .default_input_device()
            .ok_or_else(|| anyhow!("No default input device"));
    };
    host.input_devices()
        .context("Failed to enumerate input devices")?
        .find(|d| d.name().is_ok_and(|n| n == name))
        .ok_or_else(|| anyhow!("No input device named '{}'", name))
}

/// Finds the named output device, or the host's default one when no name is given.
pub fn get_or_default_output(device_name: Option<&str>) -> Result<Device> {
    let host = get_host();

    let Some(name) = device_name else {
        return host
            .default_output_device()
            .ok_or_else(|| anyhow!("No default output device"));
    };
    host.output_devices()
        .context("Failed to enumerate output devices")?
        .find(|d| d.name().is_ok_and(|n| n == name))
        .ok_or_else(|| anyhow!("No output device named '{}'", name))
}

fn describe(name: &str, channels: u16, sample_rate: u32, is_default: bool) -> String {
    let mut d = format!(" * {}({}ch, {}hz)", name, channels, sample_rate);
    if is_default {
        d.push_str(" [default]");
    }
    d
}

/// One line per input device with its default channel count and rate.
pub fn get_available_inputs() -> Result<String> {
    let host = get_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut device_names = Vec::new();
    for device in host.input_devices().context("Failed to enumerate input devices")? {
        let Ok(name) = device.name() else { continue };
        let Ok(cfg) = device.default_input_config() else {
            tracing::debug!("Skipping input device without default config: {}", name);
            continue;
        };
        let is_default = default_name.as_deref() == Some(name.as_str());
        device_names.push(describe(&name, cfg.channels(), cfg.sample_rate().0, is_default));
    }
    Ok(device_names.join("\n"))
}

/// One line per output device with its default channel count and rate.
pub fn get_available_outputs() -> Result<String> {
    let host = get_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let mut device_names = Vec::new();
    for device in host.output_devices().context("Failed to enumerate output devices")? {
        let Ok(name) = device.name() else { continue };
        let Ok(cfg) = device.default_output_config() else {
            tracing::debug!("Skipping output device without default config: {}", name);
            continue;
        };
        let is_default = default_name.as_deref() == Some(name.as_str());
        device_names.push(describe(&name, cfg.channels(), cfg.sample_rate().0, is_default));
    }
    Ok(device_names.join("\n"))
}
