// Embeds for appeal cases, outcomes and violation history.

use crate::core::appeals::{Appeal, AppealStatus, CaseExtras};
use crate::core::history::ViolationHistory;
use poise::serenity_prelude as serenity;

const PENDING_COLOR: u32 = 0x00AE86;
const APPROVED_COLOR: u32 = 0x90EE90;
const REJECTED_COLOR: u32 = 0xFFB6C1;
const HISTORY_COLOR: u32 = 0x5865F2;

// Discord caps embed field values at 1024 characters, embeds at 25 fields
// and the total text of an embed at 6000 characters.
const FIELD_VALUE_LIMIT: usize = 1024;
const EMBED_TEXT_LIMIT: usize = 6000;
// Seven case fields plus three added on resolution.
const MAX_SCREENSHOT_FIELDS: usize = 15;
// Room kept free for the Status, Moderator and Responded At fields.
const RESOLUTION_RESERVE: usize = 256;

fn clip(text: &str) -> String {
    if text.chars().count() <= FIELD_VALUE_LIMIT {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(FIELD_VALUE_LIMIT - 3).collect();
    clipped.push_str("...");
    clipped
}

fn status_color(status: AppealStatus) -> u32 {
    match status {
        AppealStatus::Pending => PENDING_COLOR,
        AppealStatus::Approved => APPROVED_COLOR,
        AppealStatus::Rejected => REJECTED_COLOR,
    }
}

/// The public embed for a newly submitted appeal.
pub fn new_case_embed(appeal: &Appeal, extras: &CaseExtras) -> serenity::CreateEmbed {
    const TITLE: &str = "New Appeal Submitted";

    let mut author = serenity::CreateEmbedAuthor::new(&appeal.subject_tag);
    if let Some(avatar) = &extras.subject_avatar_url {
        author = author.icon_url(avatar);
    }

    let notes = if appeal.additional_notes.trim().is_empty() {
        "None".to_string()
    } else {
        clip(&appeal.additional_notes)
    };

    let mut fields = vec![
        ("Appeal ID".to_string(), format!("`{}`", appeal.case_id), true),
        (
            "User".to_string(),
            format!("<@{}> ({})", appeal.subject_id, appeal.subject_tag),
            true,
        ),
        (
            "Muted/Banned".to_string(),
            appeal.punishment_kind.as_str().to_string(),
            true,
        ),
        (
            "Punishment Reason".to_string(),
            clip(&appeal.punishment_reason),
            false,
        ),
        ("Reason to Revoke".to_string(), clip(&appeal.appeal_reason), false),
        ("Additional Considerations".to_string(), notes, false),
        (
            "Submitted At".to_string(),
            format!("<t:{}:F>", appeal.submitted_at.timestamp()),
            false,
        ),
    ];

    let mut used = TITLE.chars().count()
        + appeal.subject_tag.chars().count()
        + fields
            .iter()
            .map(|(name, value, _)| name.chars().count() + value.chars().count())
            .sum::<usize>();

    for (index, link) in extras
        .evidence_links
        .iter()
        .take(MAX_SCREENSHOT_FIELDS)
        .enumerate()
    {
        let name = format!("Screenshot #{}", index + 1);
        let value = screenshot_value(link);
        let size = name.chars().count() + value.chars().count();
        if used + size > EMBED_TEXT_LIMIT - RESOLUTION_RESERVE {
            tracing::warn!(
                case_id = %appeal.case_id,
                shown = index,
                total = extras.evidence_links.len(),
                "Case embed full, dropping remaining screenshots"
            );
            break;
        }
        used += size;
        fields.push((name, value, false));
    }

    serenity::CreateEmbed::new()
        .title(TITLE)
        .author(author)
        .color(PENDING_COLOR)
        .fields(fields)
        .timestamp(serenity::Timestamp::now())
}

/// A markdown link when it fits in one field, otherwise the clipped raw URL.
fn screenshot_value(link: &str) -> String {
    let value = format!("[View Screenshot]({})", link);
    if value.chars().count() <= FIELD_VALUE_LIMIT {
        value
    } else {
        clip(link)
    }
}

/// The case embed after a decision: recoloured, with status and moderator.
///
/// `base` is the embed currently on the message; when it is gone we rebuild
/// the case from the stored appeal (screenshots are lost in that case).
pub fn resolved_case_embed(
    base: Option<serenity::CreateEmbed>,
    appeal: &Appeal,
) -> serenity::CreateEmbed {
    let embed = base.unwrap_or_else(|| new_case_embed(appeal, &CaseExtras::default()));
    let status = appeal.status();

    let Some(resolution) = &appeal.resolution else {
        return embed;
    };

    embed
        .color(status_color(status))
        .field("Status", format!("`{}`", status), true)
        .field(
            "Moderator",
            format!("<@{}> ({})", resolution.resolver_id, resolution.resolver_tag),
            true,
        )
        .field(
            "Responded At",
            format!("<t:{}:F>", resolution.resolved_at.timestamp()),
            false,
        )
}

/// Message text shown above a resolved case.
pub fn resolution_content(appeal: &Appeal) -> &'static str {
    match appeal.status() {
        AppealStatus::Approved => "The appeal has been **approved**.",
        AppealStatus::Rejected => "The appeal has been **rejected**.",
        AppealStatus::Pending => "The appeal is **pending**.",
    }
}

/// DM sent to the subject once their appeal is decided.
pub fn outcome_dm(appeal: &Appeal) -> String {
    format!(
        "Hello! Your appeal (#{}) has been **{}**.",
        appeal.case_id,
        appeal.status()
    )
}

/// Read-only summary of one appeal, for the `/appeals case` command.
pub fn appeal_summary_embed(appeal: &Appeal) -> serenity::CreateEmbed {
    let status = appeal.status();
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("Appeal #{}", appeal.case_id))
        .color(status_color(status))
        .field(
            "User",
            format!("<@{}> ({})", appeal.subject_id, appeal.subject_tag),
            true,
        )
        .field("Muted/Banned", appeal.punishment_kind.as_str(), true)
        .field("Status", format!("`{}`", status), true)
        .field("Punishment Reason", clip(&appeal.punishment_reason), false)
        .field("Reason to Revoke", clip(&appeal.appeal_reason), false)
        .field(
            "Submitted At",
            format!("<t:{}:F>", appeal.submitted_at.timestamp()),
            false,
        );

    if let Some(resolution) = &appeal.resolution {
        embed = embed
            .field(
                "Moderator",
                format!("<@{}> ({})", resolution.resolver_id, resolution.resolver_tag),
                true,
            )
            .field(
                "Responded At",
                format!("<t:{}:F>", resolution.resolved_at.timestamp()),
                true,
            );
    }

    embed
}

/// Embed listing a subject's previous violations.
pub fn history_embed(history: &ViolationHistory) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title("Previous Violations")
        .description(format!("For <@{}>", history.subject_id))
        .color(HISTORY_COLOR)
        .timestamp(serenity::Timestamp::now());

    for entry in &history.entries {
        embed = embed.field(
            format!("Case #{} - {}", entry.case_id, entry.date.format("%Y-%m-%d")),
            clip(&format!(
                "**Action:** {}\n**Reason:** {}\n**Moderator:** {}",
                entry.action, entry.reason, entry.moderator
            )),
            false,
        );
    }

    if let Some(note) = history.truncation_note() {
        embed = embed.field("Note", note, false);
    }

    embed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::appeals::{Decision, PunishmentKind, Resolution};
    use chrono::Utc;

    fn appeal(resolution: Option<Resolution>) -> Appeal {
        Appeal {
            case_id: "4821".to_string(),
            subject_id: 1,
            subject_tag: "wanda".to_string(),
            punishment_kind: PunishmentKind::Muted,
            punishment_reason: "Spam".to_string(),
            appeal_reason: "Sorry".to_string(),
            additional_notes: String::new(),
            submitted_at: Utc::now(),
            resolution,
        }
    }

    #[test]
    fn test_clip_long_values() {
        let long = "x".repeat(2000);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), FIELD_VALUE_LIMIT);
        assert!(clipped.ends_with("..."));
        assert_eq!(clip("short"), "short");
    }

    fn case_fields(embed: &serenity::CreateEmbed) -> Vec<(String, String)> {
        let json = serde_json::to_value(embed).unwrap();
        json["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| {
                (
                    f["name"].as_str().unwrap().to_string(),
                    f["value"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_oversized_screenshot_link_stays_within_field_limit() {
        let long_link = format!("https://img.example/{}", "x".repeat(1100));
        let extras = CaseExtras {
            evidence_links: vec!["https://img.example/1.png".to_string(), long_link],
            subject_avatar_url: None,
        };

        let fields = case_fields(&new_case_embed(&appeal(None), &extras));

        assert!(fields
            .iter()
            .all(|(_, value)| value.chars().count() <= FIELD_VALUE_LIMIT));
        assert_eq!(fields[7].1, "[View Screenshot](https://img.example/1.png)");
        assert_eq!(fields[8].0, "Screenshot #2");
        assert!(fields[8].1.ends_with("..."));
    }

    #[test]
    fn test_case_embed_fits_total_limit_after_resolution() {
        let mut long = appeal(None);
        long.punishment_reason = "p".repeat(2000);
        long.appeal_reason = "a".repeat(2000);
        long.additional_notes = "n".repeat(2000);
        let extras = CaseExtras {
            evidence_links: (0..15)
                .map(|i| format!("https://img.example/{}/{}", i, "y".repeat(900)))
                .collect(),
            subject_avatar_url: None,
        };

        let mut resolved = long.clone();
        resolved.resolution = Some(Resolution {
            decision: Decision::Reject,
            resolver_id: u64::MAX,
            resolver_tag: "m".repeat(32),
            resolved_at: Utc::now(),
        });
        let embed = resolved_case_embed(Some(new_case_embed(&long, &extras)), &resolved);

        let fields = case_fields(&embed);
        let total: usize = "New Appeal Submitted".len()
            + long.subject_tag.len()
            + fields
                .iter()
                .map(|(name, value)| name.chars().count() + value.chars().count())
                .sum::<usize>();
        assert!(total <= EMBED_TEXT_LIMIT, "embed text is {total} characters");
        assert!(fields.len() <= 25);
        assert!(fields.iter().any(|(name, _)| name == "Screenshot #1"));
        assert_eq!(fields.last().unwrap().0, "Responded At");
    }

    #[test]
    fn test_outcome_texts() {
        let approved = appeal(Some(Resolution {
            decision: Decision::Approve,
            resolver_id: 2,
            resolver_tag: "mod".to_string(),
            resolved_at: Utc::now(),
        }));
        assert_eq!(
            outcome_dm(&approved),
            "Hello! Your appeal (#4821) has been **Approved**."
        );
        assert_eq!(
            resolution_content(&approved),
            "The appeal has been **approved**."
        );
        assert_eq!(resolution_content(&appeal(None)), "The appeal is **pending**.");
    }
}
