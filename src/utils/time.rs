use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}
