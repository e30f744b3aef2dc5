use std::sync::Arc;

use chrono::{Local, Utc};
use eyre::{eyre, Context as _, Result};
use log::{error, info, warn};
use model::{
    config::CommissionConfig,
    decimal::Decimal,
    errors::PayrollError,
    period::Period,
    salary::SalaryRecord,
    session::Session,
    trainer::Trainer,
};
use mongodb::bson::oid::ObjectId;
use storage::{salary::SalaryStore, session::Db, trainer::TrainerStore};
use tx_macro::tx;

use super::{
    base_salary,
    cache::SalaryCache,
    commission::Commission,
    lock::PeriodLocks,
    notify::{NotificationDispatcher, PendingNotification},
};

/// Per-trainer outcome of one generation run. One bad trainer record must
/// not block payroll for the rest, so failures are recorded and skipped.
#[derive(Debug, Clone)]
pub enum TrainerOutcome {
    Prepared,
    AlreadyExists,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub period: Period,
    pub created: usize,
    pub outcomes: Vec<(ObjectId, TrainerOutcome)>,
}

/// Entry point of the monthly payroll run: concurrency control, the
/// transactional phases, cache eviction and post-commit side effects.
#[derive(Clone)]
pub struct Salaries {
    db: Db,
    store: SalaryStore,
    trainers: TrainerStore,
    commission: Commission,
    locks: Arc<PeriodLocks>,
    cache: SalaryCache,
    dispatcher: NotificationDispatcher,
    config: Arc<CommissionConfig>,
}

impl Salaries {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        db: Db,
        store: SalaryStore,
        trainers: TrainerStore,
        commission: Commission,
        locks: Arc<PeriodLocks>,
        cache: SalaryCache,
        dispatcher: NotificationDispatcher,
        config: Arc<CommissionConfig>,
    ) -> Self {
        Salaries {
            db,
            store,
            trainers,
            commission,
            locks,
            cache,
            dispatcher,
            config,
        }
    }

    /// Generates salary records for every active trainer in the period.
    /// Returns `Ok(true)` iff at least one record was committed; "nothing
    /// to do" is `Ok(false)`, not an error.
    pub async fn generate_monthly(&self, period: Period) -> Result<bool, PayrollError> {
        Ok(self.generate_report(period).await?.created > 0)
    }

    pub async fn generate_report(&self, period: Period) -> Result<GenerationReport, PayrollError> {
        period.validate_window(Local::now())?;

        // The lock covers the whole run; the guard releases on every exit
        // path. Waiters re-run the existence check below once they get in.
        let _guard = self.locks.acquire(period).await;

        let mut session = self.db.start_session().await?;
        if self.store.count_by_period(&mut session, period).await? > 0 {
            return Err(PayrollError::AlreadyGenerated(period));
        }

        let trainers = self.trainers.active(&mut session).await?;
        if trainers.is_empty() {
            return Err(PayrollError::NoEligibleTrainers(period));
        }

        let mut prepared = Vec::with_capacity(trainers.len());
        let mut outcomes = Vec::with_capacity(trainers.len());
        for trainer in trainers {
            if self.store.exists(&mut session, trainer.id, period).await? {
                outcomes.push((trainer.id, TrainerOutcome::AlreadyExists));
                continue;
            }
            match self.prepare(&mut session, &trainer, period).await {
                Ok(record) => {
                    outcomes.push((trainer.id, TrainerOutcome::Prepared));
                    prepared.push((record, trainer));
                }
                Err(err) => {
                    error!(
                        "Failed to prepare salary for trainer {} in {}: {:#}",
                        trainer.id, period, err
                    );
                    outcomes.push((trainer.id, TrainerOutcome::Failed(format!("{:#}", err))));
                }
            }
        }

        if prepared.is_empty() {
            info!("No salaries to generate for {}", period);
            return Ok(GenerationReport {
                period,
                created: 0,
                outcomes,
            });
        }

        let records: Vec<SalaryRecord> = prepared
            .iter()
            .map(|(record, _)| record.clone())
            .collect();
        self.persist(&mut session, &records)
            .await
            .with_context(|| format!("Failed to persist salaries for period {}", period))?;
        info!("Generated {} salary records for {}", records.len(), period);

        // The transaction is committed; everything below is best-effort.
        self.cache.invalidate(period).await;

        let pending = prepared
            .into_iter()
            .map(|(record, trainer)| salary_notification(&record, &trainer))
            .collect();
        self.dispatcher.dispatch(pending).await;

        Ok(GenerationReport {
            period,
            created: records.len(),
            outcomes,
        })
    }

    async fn prepare(
        &self,
        session: &mut Session,
        trainer: &Trainer,
        period: Period,
    ) -> Result<SalaryRecord> {
        let now = Utc::now();
        let base_salary = base_salary::resolve(Some(trainer), now, &self.config.base_salaries);
        let breakdown = self.commission.compute(session, trainer, period).await?;
        Ok(SalaryRecord {
            id: ObjectId::new(),
            trainer: trainer.id,
            period,
            base_salary,
            commission: breakdown.total(),
            created_at: now,
            paid_at: None,
        })
    }

    #[tx]
    async fn persist(&self, session: &mut Session, records: &[SalaryRecord]) -> Result<()> {
        self.store.insert_many(session, records).await
    }

    /// Marks a record as paid and notifies the trainer. Notification and
    /// cache eviction happen after the commit and never roll it back.
    pub async fn pay(&self, id: ObjectId) -> Result<(), PayrollError> {
        let mut session = self.db.start_session().await?;
        let record = self.mark_paid(&mut session, id).await?;

        // The payment is committed; everything below is best-effort.
        self.cache.invalidate(record.period).await;
        let lookup = self.trainers.get(&mut session, record.trainer).await;
        if let Some(message) = payment_notification(&record, lookup) {
            self.dispatcher.dispatch(vec![message]).await;
        }
        Ok(())
    }

    #[tx]
    async fn mark_paid(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<SalaryRecord, PayrollError> {
        let mut record = self
            .store
            .get(session, id)
            .await?
            .ok_or(PayrollError::SalaryNotFound(id))?;
        if record.is_paid() {
            return Err(PayrollError::AlreadyPaid(id));
        }
        let paid_at = Utc::now();
        self.store.set_paid(session, id, paid_at).await?;
        record.paid_at = Some(paid_at);
        Ok(record)
    }

    /// Deletes an unpaid record.
    pub async fn delete(&self, id: ObjectId) -> Result<(), PayrollError> {
        let mut session = self.db.start_session().await?;
        let record = self.remove_unpaid(&mut session, id).await?;
        self.cache.invalidate(record.period).await;
        Ok(())
    }

    #[tx]
    async fn remove_unpaid(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<SalaryRecord, PayrollError> {
        let record = self
            .store
            .get(session, id)
            .await?
            .ok_or(PayrollError::SalaryNotFound(id))?;
        if record.is_paid() {
            return Err(PayrollError::AlreadyPaid(id));
        }
        self.store.delete(session, id).await?;
        Ok(record)
    }

    pub async fn find(&self, id: ObjectId) -> Result<Option<SalaryRecord>, PayrollError> {
        let mut session = self.db.start_session().await?;
        Ok(self.store.get(&mut session, id).await?)
    }

    /// Cached salary list for a period.
    pub async fn get_by_period(
        &self,
        period: Period,
    ) -> Result<Arc<Vec<SalaryRecord>>, PayrollError> {
        let db = self.db.clone();
        let store = self.store.clone();
        self.cache
            .by_period
            .try_get_with(period, async move {
                let mut session = db.start_session().await?;
                store.find_by_period(&mut session, period).await.map(Arc::new)
            })
            .await
            .map_err(|err: Arc<eyre::Error>| {
                PayrollError::Eyre(eyre!("Failed to load salaries for {}: {:#}", period, err))
            })
    }

    /// Cached total payroll expense for a period.
    pub async fn total_expense(&self, period: Period) -> Result<Decimal, PayrollError> {
        let db = self.db.clone();
        let store = self.store.clone();
        self.cache
            .expense
            .try_get_with(period, async move {
                let mut session = db.start_session().await?;
                store.total_expense(&mut session, period).await
            })
            .await
            .map_err(|err: Arc<eyre::Error>| {
                PayrollError::Eyre(eyre!(
                    "Failed to load total expense for {}: {:#}",
                    period,
                    err
                ))
            })
    }
}

fn salary_notification(record: &SalaryRecord, trainer: &Trainer) -> PendingNotification {
    PendingNotification {
        trainer: trainer.id,
        email: trainer.email.clone(),
        display_name: trainer.name.clone(),
        title: format!("Salary generated for {}", record.period),
        body: format!(
            "Base salary {} + commission {} = {} for {}.",
            record.base_salary,
            record.commission,
            record.total(),
            record.period
        ),
    }
}

/// Builds the post-commit payment notification. A failed trainer lookup
/// only costs the notification, never the committed payment.
fn payment_notification(
    record: &SalaryRecord,
    trainer: Result<Option<Trainer>>,
) -> Option<PendingNotification> {
    let trainer = match trainer {
        Ok(Some(trainer)) => trainer,
        Ok(None) => return None,
        Err(err) => {
            warn!(
                "Failed to load trainer {} for payment notification: {:#}",
                record.trainer, err
            );
            return None;
        }
    };
    Some(PendingNotification {
        trainer: trainer.id,
        email: trainer.email.clone(),
        display_name: trainer.name.clone(),
        title: format!("Salary paid for {}", record.period),
        body: format!(
            "Your salary of {} for {} has been paid.",
            record.total(),
            record.period
        ),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use eyre::eyre;

    use super::*;

    fn record() -> SalaryRecord {
        SalaryRecord {
            id: ObjectId::new(),
            trainer: ObjectId::new(),
            period: "2024-03".parse().unwrap(),
            base_salary: Decimal::int(3_000_000),
            commission: Decimal::int(250_000),
            created_at: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            paid_at: None,
        }
    }

    #[test]
    fn test_failed_trainer_lookup_only_skips_notification() {
        // The payment is already committed at this point, so a storage
        // error must not surface past the notification.
        let skipped = payment_notification(&record(), Err(eyre!("connection reset")));
        assert!(skipped.is_none());
        assert!(payment_notification(&record(), Ok(None)).is_none());
    }

    #[test]
    fn test_payment_notification_content() {
        let record = record();
        let trainer = Trainer {
            id: record.trainer,
            name: "Anna".to_string(),
            email: "anna@example.com".to_string(),
            joined_at: Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap(),
            is_active: true,
            weekly_slots: vec![],
        };
        let message = payment_notification(&record, Ok(Some(trainer))).unwrap();
        assert_eq!(record.trainer, message.trainer);
        assert_eq!("anna@example.com", message.email);
        assert!(message.title.contains("2024-03"));
    }
}
