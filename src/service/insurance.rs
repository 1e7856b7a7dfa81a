use crate::models::car::InsuranceStatus;
use chrono::{Months, NaiveDate};

/// How far ahead of the expiry date a policy starts being flagged.
const EXPIRING_SOON_WINDOW: Months = Months::new(2);

pub fn insurance_status(expiry: Option<NaiveDate>, today: NaiveDate) -> InsuranceStatus {
    let Some(expiry) = expiry else {
        return InsuranceStatus::Expired;
    };

    if expiry < today {
        return InsuranceStatus::Expired;
    }

    let soon = today.checked_add_months(EXPIRING_SOON_WINDOW).unwrap_or(NaiveDate::MAX);
    if expiry < soon {
        InsuranceStatus::ExpiringSoon
    } else {
        InsuranceStatus::Active
    }
}
