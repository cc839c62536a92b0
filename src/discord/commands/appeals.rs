// Slash commands for looking at appeals and violation history.
//
// Thin layer: pull ids out of Discord types, call the service, render.

use crate::discord::appeals::case_embeds::{appeal_summary_embed, history_embed};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Appeal lookup commands.
#[poise::command(slash_command, subcommands("case", "history"), guild_only)]
pub async fn appeals(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - subcommands do the work
    Ok(())
}

/// Show one appeal by its case id.
#[poise::command(slash_command, guild_only)]
pub async fn case(
    ctx: Context<'_>,
    #[description = "The four-digit case id"] case_id: String,
) -> Result<(), Error> {
    let reply = match ctx.data().appeals.find_case(&case_id).await? {
        Some(appeal) => poise::CreateReply::default().embed(appeal_summary_embed(&appeal)),
        None => poise::CreateReply::default()
            .content(format!("No appeal with case id `{}`.", case_id.trim())),
    };

    ctx.send(reply.ephemeral(true)).await?;
    Ok(())
}

/// Show a user's previous violations.
#[poise::command(slash_command, guild_only)]
pub async fn history(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    let history = ctx.data().history.violation_history(user.id.get()).await?;

    let reply = if history.is_empty() {
        poise::CreateReply::default().content("No previous violations found.")
    } else {
        poise::CreateReply::default().embed(history_embed(&history))
    };

    ctx.send(reply.ephemeral(true)).await?;
    Ok(())
}
