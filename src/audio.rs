use std::cell::Cell;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use tracing::{debug, error, info, warn};

use crate::error::AudioError;

/// A short sound played as feedback. Implementations must not block.
pub trait SoundCue {
    fn play(&self);
}

/// Cue that only counts how often it was triggered
#[derive(Debug, Default)]
pub struct CountingCue {
    plays: Cell<usize>,
}

impl CountingCue {
    pub fn count(&self) -> usize {
        self.plays.get()
    }
}

impl SoundCue for CountingCue {
    fn play(&self) {
        self.plays.set(self.plays.get() + 1);
    }
}

/// Mono samples in -1.0..=1.0 plus their rate
#[derive(Debug, Clone)]
pub struct DecodedSound {
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl DecodedSound {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.max(1) as f32
    }
}

/// Read a WAV file and mix it down to mono f32.
pub fn decode_wav(path: &Path) -> Result<DecodedSound, AudioError> {
    let decode_err = |source| AudioError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = hound::WavReader::open(path).map_err(decode_err)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(decode_err)?
        }
    };

    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    if samples.is_empty() {
        return Err(AudioError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(DecodedSound {
        sample_rate: spec.sample_rate,
        samples: samples.into(),
    })
}

/// Playback cursor shared with the audio callback
struct Playback {
    samples: Arc<[f32]>,
    step: f64,
    cursor: Option<f64>,
    volume: f32,
}

impl Playback {
    fn new(sound: &DecodedSound, output_rate: u32, volume: f32) -> Self {
        Self {
            samples: sound.samples.clone(),
            step: sound.sample_rate as f64 / output_rate.max(1) as f64,
            cursor: None,
            volume,
        }
    }

    fn restart(&mut self) {
        self.cursor = Some(0.0);
    }

    fn is_playing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Nearest-sample resampling; silence once the cue has finished.
    fn next_sample(&mut self) -> f32 {
        let Some(pos) = self.cursor else {
            return 0.0;
        };
        let index = pos as usize;
        match self.samples.get(index) {
            Some(sample) => {
                self.cursor = Some(pos + self.step);
                sample * self.volume
            }
            None => {
                self.cursor = None;
                0.0
            }
        }
    }
}

fn lock(playback: &Mutex<Playback>) -> MutexGuard<'_, Playback> {
    playback.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The camera's movement sound, decoded once and played through the default output
pub struct MoveSound {
    sound: DecodedSound,
    playback: Arc<Mutex<Playback>>,
    stream: Option<cpal::Stream>,
}

impl MoveSound {
    /// Decoding failures are errors. A missing output device only disables playback.
    pub fn load(path: &Path, volume: f32) -> Result<Self, AudioError> {
        let sound = decode_wav(path)?;
        info!(
            "move sound loaded from {} ({:.2}s at {} Hz)",
            path.display(),
            sound.duration_secs(),
            sound.sample_rate
        );

        match open_output(&sound, volume) {
            Ok((stream, playback)) => Ok(Self {
                sound,
                playback,
                stream: Some(stream),
            }),
            Err(err) => {
                warn!("audio output unavailable, move sound muted: {err}");
                Ok(Self::muted(sound, volume))
            }
        }
    }

    fn muted(sound: DecodedSound, volume: f32) -> Self {
        let playback = Arc::new(Mutex::new(Playback::new(&sound, sound.sample_rate, volume)));
        Self {
            sound,
            playback,
            stream: None,
        }
    }

    /// False when no output device could be opened.
    pub fn is_audible(&self) -> bool {
        self.stream.is_some()
    }
}

impl SoundCue for MoveSound {
    fn play(&self) {
        if self.stream.is_none() {
            debug!("move sound muted, no output device");
            return;
        }
        lock(&self.playback).restart();
        debug!("move sound restarted ({} samples)", self.sound.samples.len());
    }
}

fn open_output(
    sound: &DecodedSound,
    volume: f32,
) -> Result<(cpal::Stream, Arc<Mutex<Playback>>), AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Output("no default output device".to_string()))?;
    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::Output(e.to_string()))?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let playback = Arc::new(Mutex::new(Playback::new(sound, config.sample_rate.0, volume)));

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, playback.clone()),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, playback.clone()),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, playback.clone()),
        other => {
            return Err(AudioError::Output(format!(
                "unsupported sample format {other:?}"
            )))
        }
    }
    .map_err(|e| AudioError::Output(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::Output(e.to_string()))?;
    Ok((stream, playback))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    playback: Arc<Mutex<Playback>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut playback = lock(&playback);
            for frame in data.chunks_mut(channels) {
                let value = T::from_sample(playback.next_sample());
                for slot in frame.iter_mut() {
                    *slot = value;
                }
            }
        },
        |err| error!("audio stream error: {err}"),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_wav(name: &str, channels: u16, frames: &[i16]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("hypercube-{}-{name}.wav", std::process::id()));
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in frames {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn counting_cue_counts() {
        let cue = CountingCue::default();
        cue.play();
        cue.play();
        assert_eq!(cue.count(), 2);
    }

    #[test]
    fn stereo_int_wav_is_mixed_to_mono() {
        let path = temp_wav("stereo", 2, &[16384, 0, -16384, -16384]);
        let sound = decode_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(sound.sample_rate, 8000);
        assert_eq!(sound.samples.len(), 2);
        assert!((sound.samples[0] - 0.25).abs() < 1e-4);
        assert!((sound.samples[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn empty_wav_is_rejected() {
        let path = temp_wav("empty", 1, &[]);
        let err = decode_wav(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, AudioError::Empty { .. }));
    }

    #[test]
    fn missing_wav_is_a_decode_error() {
        let err = decode_wav(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, AudioError::Decode { .. }));
    }

    #[test]
    fn muted_sound_ignores_play() {
        let sound = DecodedSound {
            sample_rate: 8000,
            samples: vec![0.5; 16].into(),
        };
        let muted = MoveSound::muted(sound, 1.0);
        assert!(!muted.is_audible());
        muted.play();
        assert!(!lock(&muted.playback).is_playing());
    }

    #[test]
    fn playback_restarts_and_runs_out() {
        let sound = DecodedSound {
            sample_rate: 4,
            samples: vec![0.5, -0.5].into(),
        };
        // Output at twice the source rate repeats each sample.
        let mut playback = Playback::new(&sound, 8, 0.5);
        assert_eq!(playback.next_sample(), 0.0);

        playback.restart();
        let out: Vec<f32> = (0..5).map(|_| playback.next_sample()).collect();
        assert_eq!(out, vec![0.25, 0.25, -0.25, -0.25, 0.0]);
        assert!(!playback.is_playing());

        playback.restart();
        assert!(playback.is_playing());
        assert_eq!(playback.next_sample(), 0.25);
    }
}
