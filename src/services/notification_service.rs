// src/services/notification_service.rs
//
// Entrega de notificações por duas vias:
//   1. polling (lista + contador de não lidas, direto do banco)
//   2. push (SSE), alimentado por um canal broadcast único do processo
// Toda notificação é gravada primeiro e depois publicada no canal.

use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use uuid::Uuid;

use crate::{
    common::{error::AppError, i18n::I18nStore},
    db::NotificationRepository,
    models::notification::{Notification, NotificationKind, NotificationQuery},
};

#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Devolve quantos assinantes receberam (0 quando ninguém está conectado)
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    /// Stream com as notificações de um único usuário.
    /// Assinante atrasado perde os eventos antigos e continua recebendo os novos;
    /// o cliente recupera o que perdeu pelo polling.
    pub fn subscribe(&self, user_id: Uuid) -> impl Stream<Item = Notification> + Send + 'static + use<> {
        BroadcastStream::new(self.sender.subscribe()).filter_map(move |item| match item {
            Ok(notification) if notification.user_id == user_id => Some(notification),
            Ok(_) => None,
            Err(lagged) => {
                tracing::warn!("Stream de notificações do usuário {} atrasado: {}", user_id, lagged);
                None
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    hub: NotificationHub,
    i18n: I18nStore,
    lang: String,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, hub: NotificationHub, i18n: I18nStore, lang: String) -> Self {
        Self { repo, hub, i18n, lang }
    }

    pub async fn list(&self, user_id: Uuid, query: &NotificationQuery) -> Result<Vec<Notification>, AppError> {
        self.repo
            .list_for_user(user_id, query.unread_only, query.page_size())
            .await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.repo.unread_count(user_id).await
    }

    /// Devolve o estado real, para o cliente confirmar (ou desfazer) a atualização otimista
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, AppError> {
        self.repo
            .mark_read(user_id, id)
            .await?
            .ok_or(AppError::NotificationNotFound)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.repo.mark_all_read(user_id).await
    }

    pub fn stream(&self, user_id: Uuid) -> impl Stream<Item = Notification> + Send + 'static + use<> {
        let stream = self.hub.subscribe(user_id);
        tracing::debug!(
            "Fluxo de notificações aberto para {} ({} conexões)",
            user_id,
            self.hub.subscriber_count()
        );
        stream
    }

    /// Grava e publica. Nunca falha a operação que disparou a notificação:
    /// erros ficam só no log.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        key: &str,
        params: &[(&str, &str)],
    ) -> Option<Notification> {
        let title = self.i18n.translate(&self.lang, &format!("notifications.{}.title", key));
        let message = self
            .i18n
            .translate_with(&self.lang, &format!("notifications.{}.message", key), params);

        match self.repo.create_notification(user_id, kind, &title, &message).await {
            Ok(notification) => {
                let delivered = self.hub.publish(notification.clone());
                tracing::debug!(
                    "Notificação {:?} para {} publicada ({} conexões)",
                    kind,
                    user_id,
                    delivered
                );
                Some(notification)
            }
            Err(e) => {
                tracing::error!("Falha ao gravar notificação para {}: {}", user_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn notification(user_id: Uuid, title: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: NotificationKind::LeadUpdated,
            title: title.into(),
            message: String::new(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let hub = NotificationHub::new(8);
        assert_eq!(hub.publish(notification(Uuid::new_v4(), "a")), 0);
    }

    #[tokio::test]
    async fn stream_only_yields_own_notifications() {
        let hub = NotificationHub::new(8);
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut stream = Box::pin(hub.subscribe(me));
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish(notification(other, "não é minha"));
        hub.publish(notification(me, "minha"));

        let received = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.title, "minha");
        assert_eq!(received.user_id, me);
    }

    #[tokio::test]
    async fn every_subscriber_of_a_user_gets_the_event() {
        let hub = NotificationHub::new(8);
        let me = Uuid::new_v4();
        let mut tab_a = Box::pin(hub.subscribe(me));
        let mut tab_b = Box::pin(hub.subscribe(me));

        assert_eq!(hub.publish(notification(me, "x")), 2);
        assert_eq!(tab_a.next().await.unwrap().title, "x");
        assert_eq!(tab_b.next().await.unwrap().title, "x");
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_and_keeps_streaming() {
        let hub = NotificationHub::new(2);
        let me = Uuid::new_v4();
        let mut stream = Box::pin(hub.subscribe(me));

        for i in 0..5 {
            hub.publish(notification(me, &format!("n{}", i)));
        }

        // As mais antigas foram descartadas; as duas últimas continuam disponíveis
        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(first.title, "n3");
        assert_eq!(second.title, "n4");
    }
}
