use serde::{Deserialize, Serialize};
use time::{Date, Month};

/// Services offered by the shop, each with a fixed list price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "Corte")]
    Haircut,
    #[serde(rename = "Barba")]
    Beard,
    #[serde(rename = "Corte e Barba")]
    HaircutAndBeard,
    #[serde(rename = "Sobrancelha")]
    Eyebrows,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Haircut,
        ServiceType::Beard,
        ServiceType::HaircutAndBeard,
        ServiceType::Eyebrows,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ServiceType::Haircut => "Corte",
            ServiceType::Beard => "Barba",
            ServiceType::HaircutAndBeard => "Corte e Barba",
            ServiceType::Eyebrows => "Sobrancelha",
        }
    }

    pub fn price(self) -> f64 {
        match self {
            ServiceType::Haircut => 35.00,
            ServiceType::Beard => 25.00,
            ServiceType::HaircutAndBeard => 50.00,
            ServiceType::Eyebrows => 15.00,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::InProgress => "InProgress",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Still expected to happen today: waiting or in the chair.
    pub fn is_upcoming(self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::InProgress)
    }
}

/// One scheduled service, as persisted inside the user's document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub id: String,
    pub client_name: String,
    pub phone: String,
    /// `DD/MM/YYYY`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub service_type: ServiceType,
    pub price: f64,
    pub status: AppointmentStatus,
}

/// Price as sent by a form: either a JSON number or the raw text of the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

/// Unvalidated input for a new appointment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub status: Option<String>,
}

impl AppointmentDraft {
    /// Fills an absent status with `Scheduled` and an absent price with the
    /// list price of the chosen service. Values that are present, even empty,
    /// are left for validation to judge.
    pub fn with_defaults(mut self) -> Self {
        if self.status.is_none() {
            self.status = Some(AppointmentStatus::Scheduled.as_str().to_string());
        }
        if self.price.is_none() {
            if let Some(service) = ServiceType::from_label(&self.service_type) {
                self.price = Some(PriceInput::Number(service.price()));
            }
        }
        self
    }
}

/// Unvalidated partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    pub client_name: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_type: Option<String>,
    pub price: Option<PriceInput>,
    pub status: Option<String>,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub client_name: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub service_type: ServiceType,
    pub price: f64,
    pub status: AppointmentStatus,
}

impl NewAppointment {
    pub fn into_record(self, id: String) -> AppointmentRecord {
        AppointmentRecord {
            id,
            client_name: self.client_name,
            phone: self.phone,
            date: self.date,
            time: self.time,
            service_type: self.service_type,
            price: self.price,
            status: self.status,
        }
    }
}

/// A patch that passed validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidPatch {
    pub client_name: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_type: Option<ServiceType>,
    pub price: Option<f64>,
    pub status: Option<AppointmentStatus>,
}

impl ValidPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply(self, record: &mut AppointmentRecord) {
        if let Some(v) = self.client_name {
            record.client_name = v;
        }
        if let Some(v) = self.phone {
            record.phone = v;
        }
        if let Some(v) = self.date {
            record.date = v;
        }
        if let Some(v) = self.time {
            record.time = v;
        }
        if let Some(v) = self.service_type {
            record.service_type = v;
        }
        if let Some(v) = self.price {
            record.price = v;
        }
        if let Some(v) = self.status {
            record.status = v;
        }
    }
}

/// Parses `DD/MM/YYYY` into a real calendar date. `31/02/2024` is `None`.
pub fn parse_day(value: &str) -> Option<Date> {
    let mut parts = value.split('/');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let day: u8 = day.parse().ok()?;
    let month: u8 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    let date = Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()?;
    // Components must survive the round trip unchanged.
    (date.day() == day && u8::from(date.month()) == month && date.year() == year).then_some(date)
}

/// Formats a date the way records store it.
pub fn format_day(date: Date) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), u8::from(date.month()), date.year())
}

/// Parses `HH:MM` into minutes after midnight.
pub fn parse_clock(value: &str) -> Option<u16> {
    let (hours, minutes) = value.split_once(':')?;
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    (hours <= 23 && minutes <= 59).then_some(hours * 60 + minutes)
}

/// Orders records by date then time for table display. Unparseable
/// dates sort last; ties keep their stored order.
pub fn sort_by_schedule(records: &mut [AppointmentRecord]) {
    records.sort_by_key(|r| {
        let day = parse_day(&r.date);
        (day.is_none(), day, parse_clock(&r.time))
    });
}
