//! PCM audio helpers — WAV I/O, gain, format conversion, concatenation and
//! overlay mixing.
//!
//! All processing happens on interleaved `f32` samples normalized to
//! `[-1.0, 1.0]`. Output files are 16-bit integer WAV.

mod decode;
mod resample;

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

pub use decode::decode_file;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Resample error: {0}")]
    Resample(String),

    #[error("Ambient bed unavailable: {0}")]
    AmbientUnavailable(String),

    #[error("Incompatible audio: {0}")]
    Incompatible(String),
}

/// Decoded audio held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples (L, R, L, R, ... for stereo)
    pub samples: Vec<f32>,
}

impl PcmAudio {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    pub fn silence(sample_rate: u32, channels: u16, frames: usize) -> Self {
        Self::new(sample_rate, channels, vec![0.0; frames * channels as usize])
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Parse an in-memory WAV stream.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, AudioError> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        Self::from_reader(reader)
    }

    pub fn read_wav(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let reader = WavReader::open(path)?;
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: WavReader<R>) -> Result<Self, AudioError> {
        let spec = reader.spec();
        let samples = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(Self::new(spec.sample_rate, spec.channels, samples))
    }

    fn wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    pub fn write_wav(&self, path: impl AsRef<Path>) -> Result<(), AudioError> {
        let mut writer = WavWriter::create(path, self.wav_spec())?;
        for &sample in &self.samples {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize()?;
        Ok(())
    }

    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, AudioError> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, self.wav_spec())?;
            for &sample in &self.samples {
                writer.write_sample(to_i16(sample))?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    /// Scale every sample by `10^(db/20)`.
    pub fn apply_gain_db(&mut self, db: f32) {
        let factor = db_to_linear(db);
        for sample in &mut self.samples {
            *sample *= factor;
        }
    }

    /// Convert to the given sample rate and channel count.
    pub fn conform(self, sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        if channels == 0 || sample_rate == 0 {
            return Err(AudioError::Incompatible(format!(
                "target format {} Hz / {} channels",
                sample_rate, channels
            )));
        }
        let remixed = self.remix(channels);
        if remixed.sample_rate == sample_rate {
            return Ok(remixed);
        }
        resample::resample(remixed, sample_rate)
    }

    fn remix(self, channels: u16) -> Self {
        if self.channels == channels {
            return self;
        }
        let src = self.channels.max(1) as usize;
        let frames = self.frames();
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for frame in self.samples.chunks(src).take(frames) {
            let mono = frame.iter().sum::<f32>() / src as f32;
            for _ in 0..channels {
                samples.push(mono);
            }
        }
        Self::new(self.sample_rate, channels, samples)
    }

    /// Join segments end to end with no gap or crossfade. Every segment is
    /// conformed to the first segment's format.
    pub fn concat(segments: Vec<PcmAudio>) -> Result<Self, AudioError> {
        let mut iter = segments.into_iter();
        let Some(mut combined) = iter.next() else {
            return Err(AudioError::Incompatible("no segments to concatenate".to_string()));
        };
        for segment in iter {
            let segment = segment.conform(combined.sample_rate, combined.channels)?;
            combined.samples.extend_from_slice(&segment.samples);
        }
        Ok(combined)
    }

    /// Overlay `voice` onto `bed`. The result has the voice's format and
    /// length; a bed shorter than the voice loops. Samples are clamped.
    pub fn overlay(bed: PcmAudio, voice: &PcmAudio) -> Result<Self, AudioError> {
        let bed = bed.conform(voice.sample_rate, voice.channels)?;
        if bed.is_empty() {
            return Ok(voice.clone());
        }
        let samples = voice
            .samples
            .iter()
            .zip(bed.samples.iter().cycle())
            .map(|(v, b)| (v + b).clamp(-1.0, 1.0))
            .collect();
        Ok(Self::new(voice.sample_rate, voice.channels, samples))
    }
}

pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_rate: u32, channels: u16, frames: usize, value: f32) -> PcmAudio {
        PcmAudio::new(sample_rate, channels, vec![value; frames * channels as usize])
    }

    #[test]
    fn test_wav_bytes_roundtrip_keeps_format() {
        let audio = tone(24_000, 1, 2_400, 0.25);
        let bytes = audio.to_wav_bytes().unwrap();
        let decoded = PcmAudio::from_wav_bytes(&bytes).unwrap();
        assert_eq!(decoded.sample_rate, 24_000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.frames(), 2_400);
        assert!((decoded.samples[0] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_gain_minus_twelve_db() {
        let mut audio = tone(8_000, 1, 10, 1.0);
        audio.apply_gain_db(-12.0);
        assert!((audio.samples[0] - 0.2512).abs() < 1e-3);
    }

    #[test]
    fn test_concat_preserves_total_length() {
        let a = tone(16_000, 1, 1_000, 0.1);
        let b = tone(16_000, 1, 500, 0.2);
        let combined = PcmAudio::concat(vec![a, b]).unwrap();
        assert_eq!(combined.frames(), 1_500);
        assert!((combined.samples[999] - 0.1).abs() < 1e-6);
        assert!((combined.samples[1_000] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_concat_empty_is_error() {
        assert!(PcmAudio::concat(Vec::new()).is_err());
    }

    #[test]
    fn test_overlay_spans_voice_and_loops_bed() {
        let voice = tone(16_000, 1, 100, 0.5);
        let bed = tone(16_000, 1, 30, 0.1);
        let mixed = PcmAudio::overlay(bed, &voice).unwrap();
        assert_eq!(mixed.frames(), 100);
        assert!(mixed.samples.iter().all(|s| (s - 0.6).abs() < 1e-6));
    }

    #[test]
    fn test_overlay_clamps_and_remixes_channels() {
        let voice = tone(16_000, 1, 10, 0.9);
        let bed = tone(16_000, 2, 10, 0.5);
        let mixed = PcmAudio::overlay(bed, &voice).unwrap();
        assert_eq!(mixed.channels, 1);
        assert!(mixed.samples.iter().all(|s| (*s - 1.0).abs() < 1e-6));
    }
}
