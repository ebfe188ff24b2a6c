use async_trait::async_trait;

#[derive(Debug, Clone)]
pub(crate) struct ResetNotice<'a> {
    pub(crate) email: &'a str,
    pub(crate) fullname: &'a str,
    pub(crate) link: &'a str,
}

/// Out-of-band delivery of password reset links.
#[async_trait]
pub(crate) trait ResetNotifier: Send + Sync {
    async fn send_reset_link(&self, notice: ResetNotice<'_>) -> anyhow::Result<()>;
}

/// Records deliveries in the log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn send_reset_link(&self, notice: ResetNotice<'_>) -> anyhow::Result<()> {
        tracing::info!(
            email = %notice.email,
            fullname = %notice.fullname,
            link = %notice.link,
            "password reset link issued"
        );
        Ok(())
    }
}

/// Delivery failures are logged and swallowed.
pub(crate) async fn deliver(notifier: &dyn ResetNotifier, notice: ResetNotice<'_>) {
    let email = notice.email.to_string();
    if let Err(err) = notifier.send_reset_link(notice).await {
        tracing::error!(error = %err, email = %email, "failed to deliver password reset link");
    }
}
