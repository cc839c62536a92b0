// Buttons attached to a posted appeal case.
//
// Custom ids carry everything a later click needs:
//   approve_<case_id>, reject_<case_id>, history_<subject_id>

use crate::core::appeals::{Appeal, Decision};
use poise::serenity_prelude as serenity;

/// A parsed button click on an appeal case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseControl {
    Decide { decision: Decision, case_id: String },
    History { subject_id: u64 },
}

impl CaseControl {
    /// Returns `None` for buttons that don't belong to appeal cases.
    pub fn parse(custom_id: &str) -> Option<Self> {
        let (action, arg) = custom_id.split_once('_')?;
        if arg.is_empty() {
            return None;
        }

        match action {
            "approve" => Some(CaseControl::Decide {
                decision: Decision::Approve,
                case_id: arg.to_string(),
            }),
            "reject" => Some(CaseControl::Decide {
                decision: Decision::Reject,
                case_id: arg.to_string(),
            }),
            "history" => arg
                .parse()
                .ok()
                .map(|subject_id| CaseControl::History { subject_id }),
            _ => None,
        }
    }

    pub fn custom_id(&self) -> String {
        match self {
            CaseControl::Decide {
                decision: Decision::Approve,
                case_id,
            } => format!("approve_{}", case_id),
            CaseControl::Decide {
                decision: Decision::Reject,
                case_id,
            } => format!("reject_{}", case_id),
            CaseControl::History { subject_id } => format!("history_{}", subject_id),
        }
    }
}

/// Approve / Reject / View History row for a freshly posted case.
pub fn case_buttons(appeal: &Appeal) -> Vec<serenity::CreateActionRow> {
    let approve = CaseControl::Decide {
        decision: Decision::Approve,
        case_id: appeal.case_id.clone(),
    };
    let reject = CaseControl::Decide {
        decision: Decision::Reject,
        case_id: appeal.case_id.clone(),
    };
    let history = CaseControl::History {
        subject_id: appeal.subject_id,
    };

    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(approve.custom_id())
            .label("Approve")
            .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new(reject.custom_id())
            .label("Reject")
            .style(serenity::ButtonStyle::Danger),
        serenity::CreateButton::new(history.custom_id())
            .label("View History")
            .style(serenity::ButtonStyle::Primary),
    ])]
}
