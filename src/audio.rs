use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("{0} command not configured")]
    NotConfigured(&'static str),
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("audio I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not recording")]
    NotRecording,
}

pub trait Speaker {
    /// Speak `text`, interrupting anything still being spoken.
    fn speak(&mut self, text: &str) -> Result<(), AudioError>;
    fn cancel(&mut self);
}

pub trait Recorder {
    fn start(&mut self) -> Result<(), AudioError>;
    /// Stop capturing and return the recorded bytes.
    fn stop(&mut self) -> Result<Vec<u8>, AudioError>;
    /// Stop capturing and throw the audio away.
    fn cancel(&mut self);
    fn is_recording(&self) -> bool;
}

/// Replace `placeholder` in every argument of a command template.
pub fn expand_template(template: &[String], placeholder: &str, value: &str) -> Vec<String> {
    template
        .iter()
        .map(|arg| arg.replace(placeholder, value))
        .collect()
}

fn spawn(args: &[String], what: &'static str) -> Result<Child, AudioError> {
    let (program, rest) = args.split_first().ok_or(AudioError::NotConfigured(what))?;
    Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| AudioError::Spawn {
            program: program.clone(),
            source,
        })
}

/// Kills the child outright; std offers no gentler signal. A recorder
/// stopped this way never gets to finish its output file.
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Text-to-speech through an external program such as `espeak-ng`.
pub struct CommandSpeaker {
    template: Vec<String>,
    child: Option<Child>,
}

impl CommandSpeaker {
    pub fn new(template: Vec<String>) -> Self {
        Self {
            template,
            child: None,
        }
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&mut self, text: &str) -> Result<(), AudioError> {
        self.cancel();
        let args = expand_template(&self.template, "{text}", text);
        self.child = Some(spawn(&args, "text-to-speech")?);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            terminate(&mut child);
        }
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Rewrite the RIFF and `data` chunk sizes of a WAV file from its actual
/// length. Recorders killed mid-capture leave placeholder sizes behind.
/// Anything that is not a RIFF/WAVE file is left alone.
pub fn finalize_wav(bytes: &mut [u8]) {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return;
    }
    let riff_size = u32::try_from(bytes.len() - 8).unwrap_or(u32::MAX);
    bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());

    let mut offset = 12;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        if id == b"data" {
            let data_size = u32::try_from(bytes.len() - offset - 8).unwrap_or(u32::MAX);
            bytes[offset + 4..offset + 8].copy_from_slice(&data_size.to_le_bytes());
            return;
        }
        let mut size = [0u8; 4];
        size.copy_from_slice(&bytes[offset + 4..offset + 8]);
        let size = u32::from_le_bytes(size) as usize;
        // Chunks are padded to an even length.
        offset = offset.saturating_add(8).saturating_add(size).saturating_add(size & 1);
    }
}

static RECORDING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Audio capture through an external program that writes to `{out}`.
pub struct CommandRecorder {
    template: Vec<String>,
    extension: String,
    active: Option<(Child, PathBuf)>,
}

impl CommandRecorder {
    pub fn new(template: Vec<String>, mime_type: &str) -> Self {
        let extension = mime_type
            .rsplit('/')
            .next()
            .filter(|e| !e.is_empty())
            .unwrap_or("audio")
            .to_string();
        Self {
            template,
            extension,
            active: None,
        }
    }

    fn next_path(&self) -> PathBuf {
        let seq = RECORDING_SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "flashvocab-{}-{seq}.{}",
            std::process::id(),
            self.extension
        ))
    }
}

impl Recorder for CommandRecorder {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.active.is_some() {
            return Ok(());
        }
        let path = self.next_path();
        let args = expand_template(&self.template, "{out}", &path.to_string_lossy());
        let child = spawn(&args, "recording")?;
        tracing::debug!(path = %path.display(), "recording started");
        self.active = Some((child, path));
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<u8>, AudioError> {
        let (mut child, path) = self.active.take().ok_or(AudioError::NotRecording)?;
        terminate(&mut child);
        let bytes = fs::read(&path);
        let _ = fs::remove_file(&path);
        // Other formats must be ones a killed encoder leaves decodable.
        let mut bytes = bytes?;
        finalize_wav(&mut bytes);
        Ok(bytes)
    }

    fn cancel(&mut self) {
        if let Some((mut child, path)) = self.active.take() {
            terminate(&mut child);
            let _ = fs::remove_file(&path);
        }
    }

    fn is_recording(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for CommandRecorder {
    fn drop(&mut self) {
        self.cancel();
    }
}
