use std::sync::Arc;

use async_trait::async_trait;
use eyre::Error;
use log::{info, warn};
use mongodb::bson::oid::ObjectId;

/// In-app notification sink, fire-and-forget semantics tolerated.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, trainer: ObjectId, title: &str, body: &str) -> Result<(), Error>;
}

/// Email sink.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(
        &self,
        address: &str,
        display_name: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), Error>;
}

/// A message produced inside the transactional phase and delivered only
/// after the commit.
#[derive(Debug, Clone)]
pub struct PendingNotification {
    pub trainer: ObjectId,
    pub email: String,
    pub display_name: String,
    pub title: String,
    pub body: String,
}

/// Best-effort dispatcher: every delivery error is logged and swallowed, so
/// nothing here can affect an already-committed transaction.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, mailer: Arc<dyn Mailer>) -> Self {
        NotificationDispatcher { notifier, mailer }
    }

    pub async fn dispatch(&self, pending: Vec<PendingNotification>) {
        for message in pending {
            if let Err(err) = self
                .notifier
                .notify(message.trainer, &message.title, &message.body)
                .await
            {
                warn!("Failed to notify trainer {}: {:#}", message.trainer, err);
            }
            if let Err(err) = self
                .mailer
                .send_email(
                    &message.email,
                    &message.display_name,
                    &message.title,
                    &message.body,
                )
                .await
            {
                warn!("Failed to email {}: {:#}", message.email, err);
            }
        }
    }
}

/// Log-only sinks for environments without a real delivery channel.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, trainer: ObjectId, title: &str, _body: &str) -> Result<(), Error> {
        info!("notification for {}: {}", trainer, title);
        Ok(())
    }
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email(
        &self,
        address: &str,
        _display_name: &str,
        subject: &str,
        _html_body: &str,
    ) -> Result<(), Error> {
        info!("email to {}: {}", address, subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use eyre::eyre;

    use super::*;

    struct FailingNotifier(AtomicUsize);

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _trainer: ObjectId, _title: &str, _body: &str) -> Result<(), Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(eyre!("push gateway is down"))
        }
    }

    struct FailingMailer(AtomicUsize);

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_email(
            &self,
            _address: &str,
            _display_name: &str,
            _subject: &str,
            _html_body: &str,
        ) -> Result<(), Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(eyre!("smtp refused"))
        }
    }

    fn message() -> PendingNotification {
        PendingNotification {
            trainer: ObjectId::new(),
            email: "trainer@example.com".to_string(),
            display_name: "Trainer".to_string(),
            title: "Salary for 2024-03".to_string(),
            body: "generated".to_string(),
        }
    }

    #[tokio::test]
    async fn test_delivery_errors_are_swallowed() {
        let notifier = Arc::new(FailingNotifier(AtomicUsize::new(0)));
        let mailer = Arc::new(FailingMailer(AtomicUsize::new(0)));
        let dispatcher = NotificationDispatcher::new(notifier.clone(), mailer.clone());

        dispatcher.dispatch(vec![message(), message()]).await;

        // Both channels were tried for both messages despite the failures.
        assert_eq!(2, notifier.0.load(Ordering::SeqCst));
        assert_eq!(2, mailer.0.load(Ordering::SeqCst));
    }
}
