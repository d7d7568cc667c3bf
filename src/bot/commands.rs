use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId, Permissions},
    prelude::Context,
};

fn all_commands() -> Vec<CreateCommand> {
    vec![
        play_command(),
        play_tts_command(),
        sound_command(),
        spook_command(),
        skip_queue_command(),
        loop_audio_command(),
        check_queue_command(),
        stop_audio_command(),
        stop_sounds_command(),
    ]
}

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }

    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;

    Ok(())
}

// Cola de reproducción

fn play_command() -> CreateCommand {
    CreateCommand::new("play")
        .description("Plays audio from a URL or a search term")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "query", "URL or search term")
                .required(true),
        )
}

fn play_tts_command() -> CreateCommand {
    CreateCommand::new("play-tts")
        .description("Text-to-speech")
        .default_member_permissions(Permissions::SEND_MESSAGES | Permissions::SEND_TTS_MESSAGES)
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "text", "Text").required(true),
        )
}

fn sound_command() -> CreateCommand {
    CreateCommand::new("sound")
        .description("Plays a Library of Ruina sound")
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "name",
            "Sound name",
        ))
        .add_option(channel_option("Voice channel ID to play sound in"))
}

fn skip_queue_command() -> CreateCommand {
    CreateCommand::new("skip-queue").description("Skips the current audio in the queue")
}

fn loop_audio_command() -> CreateCommand {
    CreateCommand::new("loop-audio").description("Toggles looping of the current audio")
}

fn check_queue_command() -> CreateCommand {
    CreateCommand::new("check-queue").description("Lists the audio queue")
}

fn stop_audio_command() -> CreateCommand {
    CreateCommand::new("stop-audio").description("Stops playing and clears the queue")
}

// Efectos

fn spook_command() -> CreateCommand {
    CreateCommand::new("spook")
        .description("Plays a sound effect once")
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "name",
            "Sound name",
        ))
        .add_option(channel_option("Voice channel ID"))
}

fn stop_sounds_command() -> CreateCommand {
    CreateCommand::new("stop-sounds").description("Stops all sound players")
}

fn channel_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "channel", description)
}
