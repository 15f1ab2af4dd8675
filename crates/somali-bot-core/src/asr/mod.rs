//! Speech recognition: audio payloads, the [`Transcriber`] seam and the
//! Hugging Face inference client behind it.

mod hf_inference;
pub mod token;

pub use hf_inference::{HfInferenceClient, ModelInfo};
pub use token::{resolve_token, HfToken, TokenSource};

use crate::config::AudioConfig;
use crate::error::{BotError, Result};
use crate::network::CircuitBreakerStats;
use async_trait::async_trait;
use bytes::Bytes;

/// Encoded audio as received from the chat platform.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Telegram voice note (Opus in an Ogg container).
    pub fn voice_note(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, AudioConfig::VOICE_MIME_TYPE)
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reject clips no recognizer should be asked to decode.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(BotError::EmptyAudio);
        }
        check_audio_size(self.len())
    }
}

/// Check a clip size against [`AudioConfig::MAX_VOICE_BYTES`].
pub fn check_audio_size(size: u64) -> Result<()> {
    if size > AudioConfig::MAX_VOICE_BYTES {
        return Err(BotError::AudioTooLarge {
            size,
            limit: AudioConfig::MAX_VOICE_BYTES,
        });
    }
    Ok(())
}

/// Recognized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
}

/// Something that turns speech into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: AudioClip) -> Result<Transcript>;

    /// Identifier of the speech model in use.
    fn model_id(&self) -> &str;

    /// Circuit breaker view of the backing service, if it has one.
    fn health(&self) -> Option<CircuitBreakerStats> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_note_defaults_to_ogg() {
        let clip = AudioClip::voice_note(vec![1u8, 2, 3]);
        assert_eq!(clip.mime_type, "audio/ogg");
        assert_eq!(clip.len(), 3);
        assert!(clip.validate().is_ok());
    }

    #[test]
    fn test_empty_clip_is_rejected() {
        let clip = AudioClip::voice_note(Vec::new());
        assert!(matches!(clip.validate(), Err(BotError::EmptyAudio)));
    }

    #[test]
    fn test_oversized_clip_is_rejected() {
        let err = check_audio_size(AudioConfig::MAX_VOICE_BYTES + 1).unwrap_err();
        assert!(matches!(err, BotError::AudioTooLarge { .. }));
        assert!(check_audio_size(AudioConfig::MAX_VOICE_BYTES).is_ok());
    }
}
