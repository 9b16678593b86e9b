use chrono::{DateTime, Datelike, Months, Utc};

use crate::{
    database::PoolHandle,
    error::{Error, Result},
    models::leases::{Lease, LeaseDetails, LeaseWithSchedule, Payment},
    queries::leases,
};

/// Length of a lease created on approval.
pub const LEASE_TERM_MONTHS: u32 = 12;

fn add_months(start: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| Error::Internal(format!("Date out of range: {} + {} months", start, months)))
}

/// End date of a lease starting at `start`.
///
/// Month arithmetic clamps to the last day of the target month: a lease
/// starting on February 29th ends on February 28th of the next year.
pub fn lease_end_date(start: DateTime<Utc>) -> Result<DateTime<Utc>> {
    add_months(start, LEASE_TERM_MONTHS)
}

/// Earliest monthly due date strictly after `now`.
///
/// Due dates are anchored on `start`: the n-th due date is `start + n months`,
/// clamped to the end of shorter months, and the day never drifts after a
/// clamped month. A lease that has not started yet is first due on its start.
pub fn next_payment_date(start: DateTime<Utc>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if start > now {
        return Ok(start);
    }

    // Due dates before the current month cannot be after `now`
    let elapsed_months = (now.year() - start.year()) * 12 + now.month() as i32 - start.month() as i32;
    let mut months = u32::try_from(elapsed_months.max(1))
        .map_err(|_| Error::Internal("Negative month offset".to_string()))?;

    loop {
        let candidate = add_months(start, months)?;
        if candidate > now {
            return Ok(candidate);
        }
        months += 1;
    }
}

pub fn with_schedule(lease: Lease, now: DateTime<Utc>) -> Result<LeaseWithSchedule> {
    let next_payment_date = next_payment_date(lease.start_date, now)?;
    Ok(LeaseWithSchedule {
        lease,
        next_payment_date,
    })
}

/// Lists all leases with their tenant and property summary.
pub async fn list_leases(pool: &PoolHandle) -> Result<Vec<LeaseDetails>> {
    pool.with_connection(|conn| Box::pin(async move { leases::list_leases(conn).await }))
        .await
}

/// Lists the payments of a lease. Fails with `NotFound` for an unknown lease.
pub async fn list_lease_payments(pool: &PoolHandle, lease_id: i64) -> Result<Vec<Payment>> {
    pool.with_connection(move |conn| {
        Box::pin(async move {
            if leases::get_lease_optional(conn, lease_id).await?.is_none() {
                return Err(Error::NotFound(format!("Lease {} not found", lease_id)));
            }
            leases::list_payments(conn, lease_id).await
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_next_payment_clamps_to_month_end() {
        assert_eq!(
            next_payment_date(at(2024, 1, 31), at(2024, 2, 15)).unwrap(),
            at(2024, 2, 29)
        );
        assert_eq!(
            next_payment_date(at(2023, 1, 31), at(2023, 2, 15)).unwrap(),
            at(2023, 2, 28)
        );
    }

    #[test]
    fn test_next_payment_keeps_anchor_day() {
        // After the clamped February the schedule returns to the 31st
        assert_eq!(
            next_payment_date(at(2024, 1, 31), at(2024, 3, 1)).unwrap(),
            at(2024, 3, 31)
        );
        assert_eq!(
            next_payment_date(at(2024, 1, 31), at(2024, 4, 30)).unwrap(),
            at(2024, 5, 31)
        );
    }

    #[test]
    fn test_next_payment_is_strictly_after_now() {
        // A due date equal to now is not the next one
        assert_eq!(
            next_payment_date(at(2024, 1, 10), at(2024, 3, 10)).unwrap(),
            at(2024, 4, 10)
        );
        assert_eq!(
            next_payment_date(at(2024, 1, 10), at(2024, 1, 10)).unwrap(),
            at(2024, 2, 10)
        );
        assert_eq!(
            next_payment_date(at(2022, 6, 15), at(2024, 1, 20)).unwrap(),
            at(2024, 2, 15)
        );
    }

    #[test]
    fn test_next_payment_for_future_lease_is_start() {
        assert_eq!(
            next_payment_date(at(2030, 5, 1), at(2024, 1, 1)).unwrap(),
            at(2030, 5, 1)
        );
    }

    #[test]
    fn test_lease_end_date() {
        assert_eq!(lease_end_date(at(2024, 2, 29)).unwrap(), at(2025, 2, 28));
        assert_eq!(lease_end_date(at(2024, 3, 15)).unwrap(), at(2025, 3, 15));
    }
}
