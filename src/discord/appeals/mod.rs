// Discord side of appeals: case rendering, buttons and the notifier.

pub mod case_embeds;
pub mod controls;
pub mod interactions;
pub mod notifier;

pub use notifier::DiscordAppealNotifier;
