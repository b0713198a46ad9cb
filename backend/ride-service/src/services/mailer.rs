use crate::error::Result;
use async_trait::async_trait;

/// Outbound e-mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation(&self, recipient: &str, link: &str) -> Result<()>;
}

/// Logs messages instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation(&self, recipient: &str, link: &str) -> Result<()> {
        tracing::info!(recipient, link, "e-mail confirmation link issued");
        Ok(())
    }
}

/// Frontend route that completes registration
pub fn confirmation_link(public_url: &str, token: &str) -> String {
    format!("{}/#/confirm-email/{}", public_url.trim_end_matches('/'), token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_link() {
        assert_eq!(
            confirmation_link("https://fromto.example/", "abc"),
            "https://fromto.example/#/confirm-email/abc"
        );
    }
}
