use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use som_db_entity::db::notification::Model as NotificationModel;

/// One database transaction plus the notifications saved inside it.
///
/// Mutation functions receive `uow.conn()` and never open a transaction of
/// their own. The outbox is only handed out by [`UnitOfWork::commit`], so
/// nothing is pushed for work that rolled back.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
    outbox: Vec<NotificationModel>,
}

impl UnitOfWork {
    pub async fn begin(db: &DatabaseConnection) -> Result<UnitOfWork, DbErr> {
        Ok(UnitOfWork {
            txn: db.begin().await?,
            outbox: Vec::new(),
        })
    }

    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub fn queue(&mut self, notifications: Vec<NotificationModel>) {
        self.outbox.extend(notifications);
    }

    pub fn queued(&self) -> usize {
        self.outbox.len()
    }

    pub async fn commit(self) -> Result<Vec<NotificationModel>, DbErr> {
        self.txn.commit().await?;
        Ok(self.outbox)
    }

    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{EntityTrait, PaginatorTrait};
    use som_db_entity::db::notification::Entity as Notification;

    #[tokio::test]
    async fn test_rollback_discards_rows_and_outbox() {
        let db = setup_db().await;
        let mut uow = UnitOfWork::begin(&db).await.unwrap();
        let saved = crate::notification::save_notifications(
            uow.conn(),
            &[1, 2],
            "TEST",
            "title",
            "body",
            0,
        )
        .await
        .unwrap();
        uow.queue(saved);
        assert_eq!(uow.queued(), 2);
        uow.rollback().await.unwrap();
        assert_eq!(Notification::find().count(&db).await.unwrap(), 0);

        let mut uow = UnitOfWork::begin(&db).await.unwrap();
        let saved =
            crate::notification::save_notifications(uow.conn(), &[1], "TEST", "t", "b", 0)
                .await
                .unwrap();
        uow.queue(saved);
        let outbox = uow.commit().await.unwrap();
        assert_eq!(outbox.len(), 1);
        assert_eq!(Notification::find().count(&db).await.unwrap(), 1);
    }
}
