// Discord implementation of AppealNotifier.
//
// Holds its own HTTP handle and target channel, handed in at construction,
// so the core never touches a shared client.

use super::case_embeds::{new_case_embed, outcome_dm, resolution_content, resolved_case_embed};
use super::controls::case_buttons;
use crate::core::appeals::{Appeal, AppealNotifier, CaseExtras, CaseMessageRef, NotifyError};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub struct DiscordAppealNotifier {
    http: Arc<serenity::Http>,
    channel_id: Option<serenity::ChannelId>,
}

impl DiscordAppealNotifier {
    pub fn new(http: Arc<serenity::Http>, channel_id: Option<u64>) -> Self {
        Self {
            http,
            channel_id: channel_id.map(serenity::ChannelId::new),
        }
    }
}

fn delivery(err: serenity::Error) -> NotifyError {
    NotifyError::Delivery(err.to_string())
}

/// Thread name from a tag, dropping any legacy discriminator.
fn thread_name(subject_tag: &str) -> String {
    let name = subject_tag.split('#').next().unwrap_or(subject_tag);
    format!("{}'s Appeal", name)
}

#[async_trait]
impl AppealNotifier for DiscordAppealNotifier {
    async fn publish_case(&self, appeal: &Appeal, extras: &CaseExtras) -> Result<(), NotifyError> {
        let channel_id = self.channel_id.ok_or(NotifyError::ChannelMissing)?;

        let message = channel_id
            .send_message(
                &*self.http,
                serenity::CreateMessage::new()
                    .embed(new_case_embed(appeal, extras))
                    .components(case_buttons(appeal)),
            )
            .await
            .map_err(delivery)?;

        // The discussion thread is a convenience; the case is already posted.
        let reason = format!("Thread for Appeal ID {}", appeal.case_id);
        if let Err(err) = channel_id
            .create_thread_from_message(
                &*self.http,
                message.id,
                serenity::CreateThread::new(thread_name(&appeal.subject_tag))
                    .auto_archive_duration(serenity::AutoArchiveDuration::OneDay)
                    .audit_log_reason(&reason),
            )
            .await
        {
            tracing::warn!(case_id = %appeal.case_id, error = %err, "Failed to create appeal thread");
        }

        Ok(())
    }

    async fn notify_subject(&self, appeal: &Appeal) -> Result<(), NotifyError> {
        let dm = serenity::UserId::new(appeal.subject_id)
            .create_dm_channel(&*self.http)
            .await
            .map_err(delivery)?;

        dm.id
            .say(&*self.http, outcome_dm(appeal))
            .await
            .map_err(delivery)?;
        Ok(())
    }

    async fn refresh_case(
        &self,
        appeal: &Appeal,
        case_message: Option<CaseMessageRef>,
    ) -> Result<(), NotifyError> {
        let Some(case_message) = case_message else {
            tracing::debug!(case_id = %appeal.case_id, "No case message to refresh");
            return Ok(());
        };

        let channel_id = serenity::ChannelId::new(case_message.channel_id);
        let message_id = serenity::MessageId::new(case_message.message_id);

        let existing = channel_id
            .message(&*self.http, message_id)
            .await
            .map_err(delivery)?;
        let base = existing
            .embeds
            .into_iter()
            .next()
            .map(serenity::CreateEmbed::from);

        channel_id
            .edit_message(
                &*self.http,
                message_id,
                serenity::EditMessage::new()
                    .content(resolution_content(appeal))
                    .embed(resolved_case_embed(base, appeal))
                    .components(vec![]),
            )
            .await
            .map_err(delivery)?;
        Ok(())
    }
}
