use anyhow::Result;
use serenity::{
    builder::{
        CreateAttachment, CreateInteractionResponse, CreateInteractionResponseMessage,
        EditInteractionResponse,
    },
    model::{
        application::CommandInteraction,
        channel::ChannelType,
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use tracing::{debug, info, warn};

use crate::{
    bot::{picker, RuinaBot},
    error::VoiceError,
    sources::{self, sounds::Sound, tts},
};

const EMPTY_QUEUE: &str = "There is nothing in the queue";

/// Where a command should play: the channel given as an option, or the
/// caller's current voice channel.
#[derive(Debug, Clone)]
struct VoiceTarget {
    guild_id: GuildId,
    channel_id: ChannelId,
    label: String,
}

/// Maneja comandos slash
pub async fn handle_command(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
) -> Result<()> {
    let guild_id = command
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("This command only works in a server"))?;

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    match command.data.name.as_str() {
        "play" => handle_play(ctx, command, bot, guild_id).await?,
        "play-tts" => handle_play_tts(ctx, command, bot, guild_id).await?,
        "sound" => handle_sound(ctx, command, bot, guild_id).await?,
        "spook" => handle_spook(ctx, command, bot, guild_id).await?,
        "skip-queue" => handle_skip(ctx, command, bot, guild_id).await?,
        "loop-audio" => handle_loop(ctx, command, bot, guild_id).await?,
        "check-queue" => handle_check_queue(ctx, command, bot, guild_id).await?,
        "stop-audio" => handle_stop(ctx, command, bot, guild_id).await?,
        "stop-sounds" => handle_stop_sounds(ctx, command, bot).await?,
        other => {
            warn!("Comando desconocido: /{}", other);
            reply(ctx, command, "❌ Unknown command", true).await?;
        }
    }

    Ok(())
}

/// Shows a failed command's error to its caller.
pub async fn report_error(ctx: &Context, command: &CommandInteraction, error: &anyhow::Error) {
    let content = format!("❌ {}", error);

    if reply(ctx, command, &content, true).await.is_err() {
        // Already acknowledged, so edit the deferred response instead.
        if let Err(e) = command
            .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
            .await
        {
            warn!("No se pudo informar el error al usuario: {:?}", e);
        }
    }
}

async fn handle_play(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
    guild_id: GuildId,
) -> Result<()> {
    let query = string_option(command, "query")
        .ok_or_else(|| anyhow::anyhow!("Missing query"))?
        .to_string();

    defer(ctx, command).await?;

    let target = caller_channel(ctx, guild_id, command.user.id)?;
    let tracks = sources::search(&bot.http, &query).await?;
    if tracks.is_empty() {
        return Err(VoiceError::NothingFound(query).into());
    }
    let Some(track) = picker::choose(ctx, command, tracks, |t| t.display_name()).await? else {
        return Ok(());
    };
    bot.connect(ctx, target.guild_id, target.channel_id).await?;

    let name = track.display_name();
    let factory = sources::youtube_factory(bot.http.clone(), track.url);

    let session = bot.sessions.session(target.guild_id);
    let mut session = session.lock().await;
    let content = if session.queue().is_empty() {
        session.start_playing(name.clone(), factory).await;
        format!("Playing **{}**", name)
    } else {
        session.enqueue_audio(name.clone(), factory);
        format!("Queued **{}**", name)
    };
    drop(session);

    edit(ctx, command, content).await
}

async fn handle_play_tts(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
    guild_id: GuildId,
) -> Result<()> {
    let text = string_option(command, "text")
        .ok_or_else(|| anyhow::anyhow!("Missing text"))?
        .to_string();

    reply(ctx, command, "Trying to queue TTS", true).await?;

    let urls = tts::audio_urls(&text, &bot.config.tts_language);
    if urls.is_empty() {
        warn!("Texto TTS vacío en guild {}", guild_id);
        return Ok(());
    }
    debug!("🗣️ URLs TTS: {:?}", urls);

    let target = caller_channel(ctx, guild_id, command.user.id)?;
    bot.connect(ctx, target.guild_id, target.channel_id).await?;

    let session = bot.sessions.session(target.guild_id);
    let mut session = session.lock().await;
    let mut urls = urls.into_iter();

    if session.queue().is_empty() {
        if let Some(first) = urls.next() {
            session
                .start_playing("TTS", sources::http_factory(bot.http.clone(), first))
                .await;
        }
    }
    for url in urls {
        session.enqueue_audio("TTS", sources::http_factory(bot.http.clone(), url));
    }

    Ok(())
}

async fn handle_sound(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
    guild_id: GuildId,
) -> Result<()> {
    defer(ctx, command).await?;

    let Some(sound) = pick_sound(ctx, command, bot).await? else {
        return Ok(());
    };

    // Without a channel the sound is shared as a file instead of played.
    if string_option(command, "channel").is_none() {
        let attachment = CreateAttachment::path(&sound.path).await?;
        command
            .edit_response(
                &ctx.http,
                EditInteractionResponse::new()
                    .content("")
                    .components(Vec::new())
                    .new_attachment(attachment),
            )
            .await?;
        return Ok(());
    }

    let target = resolve_target(ctx, command, guild_id).await?;
    bot.connect(ctx, target.guild_id, target.channel_id).await?;

    let factory = sources::file_factory(sound.path.clone(), bot.config.sound_volume);
    bot.sessions
        .session(target.guild_id)
        .lock()
        .await
        .start_playing(sound.name.clone(), factory)
        .await;

    edit(ctx, command, playing_in(&sound, &target)).await
}

async fn handle_spook(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
    guild_id: GuildId,
) -> Result<()> {
    if let Some(dev) = bot.config.dev_user_id {
        if command.user.id != UserId::new(dev) {
            debug!(
                "Usuario no autorizado {} intentó usar /{}",
                command.user.name, command.data.name
            );
            return reply(ctx, command, "You are not allowed to use this command", true).await;
        }
    }

    defer(ctx, command).await?;

    let Some(sound) = pick_sound(ctx, command, bot).await? else {
        return Ok(());
    };
    let target = resolve_target(ctx, command, guild_id).await?;
    let call = bot.connect(ctx, target.guild_id, target.channel_id).await?;

    let resource = sources::file_factory(sound.path.clone(), bot.config.sound_volume).create();
    bot.effects.play(&call, &sound.name, resource).await;

    edit(ctx, command, playing_in(&sound, &target)).await
}

async fn handle_skip(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
    guild_id: GuildId,
) -> Result<()> {
    let skipped = match bot.sessions.existing(guild_id) {
        Some(session) => session.lock().await.skip().await,
        None => None,
    };

    match skipped {
        Some(name) => reply(ctx, command, &format!("Skipping {}", name), false).await,
        None => reply(ctx, command, EMPTY_QUEUE, true).await,
    }
}

async fn handle_loop(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
    guild_id: GuildId,
) -> Result<()> {
    let toggled = match bot.sessions.existing(guild_id) {
        Some(session) => session.lock().await.toggle_loop(),
        None => None,
    };

    match toggled {
        Some((name, true)) => reply(ctx, command, &format!("Looping {}", name), false).await,
        Some((name, false)) => {
            reply(ctx, command, &format!("No longer looping {}", name), false).await
        }
        None => reply(ctx, command, EMPTY_QUEUE, true).await,
    }
}

async fn handle_check_queue(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
    guild_id: GuildId,
) -> Result<()> {
    let listing = match bot.sessions.existing(guild_id) {
        Some(session) => session.lock().await.queue().listing(),
        None => Vec::new(),
    };

    if listing.is_empty() {
        return reply(ctx, command, EMPTY_QUEUE, true).await;
    }
    reply(ctx, command, &listing.join("\n"), false).await
}

async fn handle_stop(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
    guild_id: GuildId,
) -> Result<()> {
    if let Some(session) = bot.sessions.existing(guild_id) {
        session.lock().await.stop_playing().await;
    }
    reply(ctx, command, "Stopped playing audio", true).await
}

async fn handle_stop_sounds(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
) -> Result<()> {
    let stopped = bot.effects.stop_all();
    debug!("{} efectos detenidos por {}", stopped, command.user.name);
    reply(ctx, command, "Stopped playing sounds", true).await
}

// Utilidades

/// A random sound without a `name`, otherwise one of the matches chosen
/// by the caller.
async fn pick_sound(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &RuinaBot,
) -> Result<Option<Sound>> {
    let sounds = match string_option(command, "name") {
        None => bot.sounds.random()?.into_iter().collect(),
        Some(query) => bot.sounds.search(query)?,
    };

    if sounds.is_empty() {
        edit(ctx, command, "Could not find any sounds").await?;
        return Ok(None);
    }
    picker::choose(ctx, command, sounds, |sound| sound.name.clone()).await
}

fn string_option<'a>(command: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_str())
}

async fn reply(
    ctx: &Context,
    command: &CommandInteraction,
    content: &str,
    ephemeral: bool,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(ephemeral),
            ),
        )
        .await?;
    Ok(())
}

async fn defer(ctx: &Context, command: &CommandInteraction) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;
    Ok(())
}

async fn edit(ctx: &Context, command: &CommandInteraction, content: impl Into<String>) -> Result<()> {
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await?;
    Ok(())
}

fn playing_in(sound: &Sound, target: &VoiceTarget) -> String {
    format!("Playing {} in channel {}", sound.name, target.label)
}

/// The `channel` option when given, otherwise the caller's voice channel.
async fn resolve_target(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
) -> Result<VoiceTarget, VoiceError> {
    match string_option(command, "channel") {
        Some(raw) => channel_from_option(ctx, raw).await,
        None => caller_channel(ctx, guild_id, command.user.id),
    }
}

async fn channel_from_option(ctx: &Context, raw: &str) -> Result<VoiceTarget, VoiceError> {
    let id = parse_channel_id(raw).ok_or_else(|| VoiceError::InvalidChannel(raw.to_string()))?;

    let channel = id
        .to_channel(ctx)
        .await
        .map_err(|e| {
            warn!("Error obteniendo canal {}: {:?}", id, e);
            VoiceError::InvalidChannel(raw.to_string())
        })?
        .guild()
        .ok_or(VoiceError::NotVoiceChannel(id.get()))?;

    if !matches!(channel.kind, ChannelType::Voice | ChannelType::Stage) {
        return Err(VoiceError::NotVoiceChannel(id.get()));
    }

    let guild_name = channel
        .guild_id
        .name(ctx)
        .unwrap_or_else(|| channel.guild_id.to_string());

    Ok(VoiceTarget {
        guild_id: channel.guild_id,
        channel_id: channel.id,
        label: format!("{} > {}", guild_name, channel.name),
    })
}

fn caller_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Result<VoiceTarget, VoiceError> {
    let guild = guild_id
        .to_guild_cached(&ctx.cache)
        .ok_or(VoiceError::NotInVoiceChannel)?;

    let channel_id = guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(VoiceError::NotInVoiceChannel)?;

    let channel_name = guild
        .channels
        .get(&channel_id)
        .map(|channel| channel.name.clone())
        .unwrap_or_else(|| channel_id.to_string());

    Ok(VoiceTarget {
        guild_id,
        channel_id,
        label: format!("{} > {}", guild.name, channel_name),
    })
}

/// Channel ids are non-zero snowflakes.
fn parse_channel_id(raw: &str) -> Option<ChannelId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_ids_must_be_snowflakes() {
        assert_eq!(parse_channel_id(" 123456789 "), Some(ChannelId::new(123456789)));
        assert_eq!(parse_channel_id("0"), None);
        assert_eq!(parse_channel_id("general"), None);
        assert_eq!(parse_channel_id("-5"), None);
    }
}
