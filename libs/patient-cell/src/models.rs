use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PortalBookingRequest {
    pub clinic_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DoctorListing {
    pub user_id: i64,
    pub name: String,
    pub department: Option<String>,
    pub specialty: Option<String>,
}
