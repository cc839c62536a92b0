// Button clicks on posted appeal cases.
//
// Clicks are acknowledged before any store work, so a slow database never
// turns the button into "This interaction failed". Duplicate or stale clicks
// are fine: the service treats them as no-ops.

use super::case_embeds::history_embed;
use super::controls::CaseControl;
use crate::core::appeals::{CaseMessageRef, DecisionOutcome, DecisionRequest};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Route a component interaction. Buttons that aren't ours are ignored.
pub async fn handle_component(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(control) = CaseControl::parse(&component.data.custom_id) else {
        return Ok(());
    };

    if let Err(err) = component.defer(&ctx.http).await {
        tracing::warn!(
            custom_id = %component.data.custom_id,
            error = %err,
            "Interaction invalid or expired"
        );
        return Ok(());
    }

    match control {
        CaseControl::Decide { decision, case_id } => {
            let request = DecisionRequest {
                case_id,
                decision,
                moderator_id: component.user.id.get(),
                moderator_tag: component.user.tag(),
                case_message: Some(CaseMessageRef {
                    channel_id: component.channel_id.get(),
                    message_id: component.message.id.get(),
                }),
            };

            match data.appeals.decide(request).await {
                Ok(DecisionOutcome::Applied(_)) => {}
                Ok(outcome) => {
                    tracing::debug!(outcome = ?outcome, "Stale or duplicate decision click");
                }
                Err(err) => {
                    tracing::error!(error = %err, "Failed to apply appeal decision");
                }
            }
        }
        CaseControl::History { subject_id } => {
            let reply = match data.history.violation_history(subject_id).await {
                Ok(history) if history.is_empty() => {
                    serenity::CreateInteractionResponseFollowup::new()
                        .content("No previous violations found.")
                }
                Ok(history) => serenity::CreateInteractionResponseFollowup::new()
                    .embed(history_embed(&history)),
                Err(err) => {
                    tracing::error!(subject_id, error = %err, "View History error");
                    serenity::CreateInteractionResponseFollowup::new()
                        .content("Error fetching violation history.")
                }
            };

            component
                .create_followup(&ctx.http, reply.ephemeral(true))
                .await?;
        }
    }

    Ok(())
}
