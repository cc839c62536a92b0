// Web session identity.
//
// Logging in happens elsewhere (Discord OAuth). All we need here is to turn a
// session token into the Discord user it belongs to.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// The Discord user behind a web session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: u64,
    pub username: String,
    /// Legacy discriminator; "0" or missing for migrated usernames.
    pub discriminator: Option<String>,
    /// Avatar hash as handed out by Discord.
    pub avatar: Option<String>,
}

impl SessionUser {
    /// `name#1234` for legacy accounts, plain `name` otherwise.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(disc) if !disc.is_empty() && disc != "0" => format!("{}#{}", self.username, disc),
            _ => self.username.clone(),
        }
    }

    pub fn avatar_url(&self, size: u32) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            format!(
                "https://cdn.discordapp.com/avatars/{}/{}.png?size={}",
                self.id, hash, size
            )
        })
    }
}

#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// The user owning `token`, or `None` for unknown/expired sessions.
    async fn resolve(&self, token: &str) -> Result<Option<SessionUser>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(discriminator: Option<&str>) -> SessionUser {
        SessionUser {
            id: 42,
            username: "wanda".to_string(),
            discriminator: discriminator.map(str::to_string),
            avatar: Some("abc123".to_string()),
        }
    }

    #[test]
    fn test_tag_formats() {
        assert_eq!(user(Some("0420")).tag(), "wanda#0420");
        assert_eq!(user(Some("0")).tag(), "wanda");
        assert_eq!(user(None).tag(), "wanda");
    }

    #[test]
    fn test_avatar_url() {
        assert_eq!(
            user(None).avatar_url(128).as_deref(),
            Some("https://cdn.discordapp.com/avatars/42/abc123.png?size=128")
        );
    }
}
