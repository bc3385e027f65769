use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use super::{AudioError, PcmAudio};

/// Resample interleaved PCM to `target_rate` using rubato's sinc resampler.
///
/// The whole clip is processed as a single chunk.
pub(super) fn resample(audio: PcmAudio, target_rate: u32) -> Result<PcmAudio, AudioError> {
    let channels = audio.channels as usize;
    let frames = audio.frames();
    if frames == 0 || audio.sample_rate == target_rate {
        return Ok(PcmAudio::new(target_rate, audio.channels, audio.samples));
    }

    let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
    for frame in audio.samples.chunks(channels) {
        for (ch, sample) in frame.iter().enumerate() {
            planar[ch].push(*sample);
        }
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = target_rate as f64 / audio.sample_rate as f64;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, frames, channels)
        .map_err(|e| AudioError::Resample(e.to_string()))?;
    let output = resampler
        .process(&planar, None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let out_frames = output.first().map(|c| c.len()).unwrap_or(0);
    let mut samples = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        for channel in &output {
            samples.push(channel[i]);
        }
    }

    debug!(
        "[Audio] Resampled {} frames ({} Hz) -> {} frames ({} Hz)",
        frames, audio.sample_rate, out_frames, target_rate
    );

    Ok(PcmAudio::new(target_rate, audio.channels, samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_changes_rate_and_length() {
        let input = PcmAudio::new(48_000, 1, vec![0.0; 4_800]);
        let output = resample(input, 24_000).unwrap();
        assert_eq!(output.sample_rate, 24_000);
        assert_eq!(output.channels, 1);
        let frames = output.frames() as i64;
        assert!((frames - 2_400).abs() <= 8, "got {} frames", frames);
    }
}
