//! # Shift Repository
//!
//! The `shifts` collection.
//!
//! "At most one OPEN shift" is not a constraint of the table. `find_open`
//! returns the first OPEN shift it meets and callers treat it as the
//! active one.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use comanda_core::{
    CloseConfirmation, Money, Operator, ReconciliationSnapshot, Shift, ShiftOpening, ShiftState,
};

use crate::error::{DbError, DbResult};

const SHIFT_COLUMNS: &str = r#"
    id, initial_float, opened_at, closed_at, state,
    opened_by_user_id, opened_by_email, closing_totals, final_cash_float
"#;

#[derive(Debug, sqlx::FromRow)]
struct ShiftRow {
    id: String,
    initial_float: i64,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    state: ShiftState,
    opened_by_user_id: String,
    opened_by_email: String,
    closing_totals: Option<String>,
    final_cash_float: Option<i64>,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = DbError;

    fn try_from(row: ShiftRow) -> DbResult<Self> {
        let closing_totals = row
            .closing_totals
            .as_deref()
            .map(serde_json::from_str::<ReconciliationSnapshot>)
            .transpose()?;

        Ok(Shift {
            id: row.id,
            initial_float: Money::from_minor(row.initial_float),
            opened_at: row.opened_at,
            closed_at: row.closed_at,
            state: row.state,
            opened_by: Operator::new(row.opened_by_user_id, row.opened_by_email),
            closing_totals,
            final_cash_float: row.final_cash_float.map(Money::from_minor),
        })
    }
}

/// Repository for the `shifts` collection.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let row: Option<ShiftRow> =
            sqlx::query_as(&format!("SELECT {} FROM shifts WHERE id = ?1", SHIFT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Shift::try_from).transpose()
    }

    /// The OPEN shift, if any. With several OPEN shifts the earliest opened
    /// wins.
    pub async fn find_open(&self) -> DbResult<Option<Shift>> {
        let row: Option<ShiftRow> = sqlx::query_as(&format!(
            "SELECT {} FROM shifts WHERE state = 'open' ORDER BY opened_at ASC LIMIT 1",
            SHIFT_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Shift::try_from).transpose()
    }

    /// Latest shift opened in `[from, until)`, whatever its state.
    pub async fn latest_opened_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Option<Shift>> {
        let row: Option<ShiftRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM shifts
            WHERE opened_at >= ?1 AND opened_at < ?2
            ORDER BY opened_at DESC
            LIMIT 1
            "#,
            SHIFT_COLUMNS
        ))
        .bind(from)
        .bind(until)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Shift::try_from).transpose()
    }

    /// Persists a new OPEN shift with a server `opened_at`.
    ///
    /// Does not look for an existing OPEN shift.
    pub async fn open(&self, opening: ShiftOpening) -> DbResult<Shift> {
        let shift = opening.into_shift(Uuid::new_v4().to_string(), Utc::now());

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, initial_float, opened_at, state, opened_by_user_id, opened_by_email
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&shift.id)
        .bind(shift.initial_float.minor())
        .bind(shift.opened_at)
        .bind(shift.state)
        .bind(&shift.opened_by.user_id)
        .bind(&shift.opened_by.email)
        .execute(&self.pool)
        .await?;

        info!(
            id = %shift.id,
            initial_float = %shift.initial_float,
            operator = %shift.opened_by.user_id,
            "Shift opened"
        );
        Ok(shift)
    }

    /// OPEN → CLOSED with the confirmed totals and a server `closed_at`.
    ///
    /// Conditional on the shift still being OPEN.
    pub async fn save_close(&self, confirmation: &CloseConfirmation) -> DbResult<Shift> {
        let id = confirmation.shift_id.as_str();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE shifts SET
                state = 'closed',
                closed_at = ?2,
                closing_totals = ?3,
                final_cash_float = ?4
            WHERE id = ?1 AND state = 'open'
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(serde_json::to_string(&confirmation.snapshot)?)
        .bind(confirmation.expected_cash.minor())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(_) => Err(DbError::conflict("Shift", id, "open")),
                None => Err(DbError::not_found("Shift", id)),
            };
        }

        info!(
            id = %id,
            total_sales = %confirmation.snapshot.total_sales,
            expected_cash = %confirmation.expected_cash,
            "Shift closed"
        );

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Shift", id))
    }

    /// Number of OPEN shifts. Above one means the convention was broken.
    pub async fn count_open(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE state = 'open'")
            .fetch_one(&self.pool)
            .await?;

        debug!(count, "Counted open shifts");
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use comanda_core::{CoreError, Order};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn opening(float: i64) -> ShiftOpening {
        ShiftOpening::new(
            Money::from_minor(float),
            Some(Operator::new("u-1", "caja@comanda.cl")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_and_find() {
        let db = setup().await;
        let repo = db.shifts();

        assert!(repo.find_open().await.unwrap().is_none());

        let shift = repo.open(opening(20_000)).await.unwrap();
        let found = repo.find_open().await.unwrap().unwrap();

        assert_eq!(found, shift);
        assert_eq!(found.opened_by.email, "caja@comanda.cl");
        assert_eq!(found.initial_float.minor(), 20_000);
        assert!(found.closing_totals.is_none());
    }

    #[tokio::test]
    async fn test_second_open_is_not_prevented() {
        let db = setup().await;
        let repo = db.shifts();

        repo.open(opening(1000)).await.unwrap();
        repo.open(opening(2000)).await.unwrap();

        assert_eq!(repo.count_open().await.unwrap(), 2);
        assert_eq!(
            repo.find_open().await.unwrap().unwrap().initial_float.minor(),
            1000
        );
    }

    #[tokio::test]
    async fn test_close_writes_totals_once() {
        let db = setup().await;
        let repo = db.shifts();
        let shift = repo.open(opening(20_000)).await.unwrap();

        let confirmation = CloseConfirmation::prepare(&shift, &Vec::<Order>::new()).unwrap();
        let closed = repo.save_close(&confirmation).await.unwrap();

        assert_eq!(closed.state, ShiftState::Closed);
        assert!(closed.closed_at.unwrap() >= closed.opened_at);
        assert_eq!(closed.final_cash_float, Some(Money::from_minor(20_000)));
        assert_eq!(closed.closing_totals, Some(ReconciliationSnapshot::default()));
        assert!(repo.find_open().await.unwrap().is_none());

        assert!(matches!(
            repo.save_close(&confirmation).await,
            Err(DbError::Conflict { .. })
        ));
        assert!(matches!(
            closed.check_closable(0),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_latest_opened_between() {
        let db = setup().await;
        let repo = db.shifts();
        let before = Utc::now() - Duration::seconds(1);

        let first = repo.open(opening(1000)).await.unwrap();
        let confirmation = CloseConfirmation::prepare(&first, &Vec::<Order>::new()).unwrap();
        repo.save_close(&confirmation).await.unwrap();
        let second = repo.open(opening(2000)).await.unwrap();

        let until = Utc::now() + Duration::seconds(1);
        let latest = repo.latest_opened_between(before, until).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);

        let none = repo
            .latest_opened_between(before - Duration::days(1), before)
            .await
            .unwrap();
        assert!(none.is_none());
    }
}
