use thiserror::Error;

/// Voice-layer failures the command layer reports back to users.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Voice client is not initialised")]
    SongbirdMissing,

    #[error("Could not join voice channel: {0}")]
    Join(#[from] songbird::error::JoinError),

    #[error("You need to be in a voice channel")]
    NotInVoiceChannel,

    #[error("Invalid voice channel: {0}")]
    InvalidChannel(String),

    #[error("Not a voice channel: {0}")]
    NotVoiceChannel(u64),

    #[error("Could not find anything for {0}")]
    NothingFound(String),

    #[error("Search failed: {0}")]
    Search(#[from] songbird::input::AudioStreamError),

    #[error("Could not read audio metadata: {0}")]
    Metadata(#[from] songbird::input::AuxMetadataError),
}
