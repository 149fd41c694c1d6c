use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::model::{
    parse_clock, parse_day, AppointmentDraft, AppointmentPatch, AppointmentStatus, NewAppointment,
    PriceInput, ServiceType, ValidPatch,
};

pub const MAX_NAME_CHARS: usize = 255;

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\([0-9]{2}\) [0-9] [0-9]{4}-[0-9]{4}$").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").unwrap();
    static ref TIME_RE: Regex = Regex::new(r"^[0-9]{2}:[0-9]{2}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every rule a candidate broke, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("validation failed on {} field(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errs = Self::default();
        errs.push(field, message);
        errs
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Borrowed view over the fields of a draft or a patch. `None` means the
/// field was not supplied at all.
struct Candidate<'a> {
    client_name: Option<&'a str>,
    phone: Option<&'a str>,
    date: Option<&'a str>,
    time: Option<&'a str>,
    service_type: Option<&'a str>,
    price: Option<&'a PriceInput>,
    status: Option<&'a str>,
}

#[derive(Default)]
struct Parsed {
    service_type: Option<ServiceType>,
    status: Option<AppointmentStatus>,
    price: Option<f64>,
}

/// Validates a full draft. Missing fields count as empty.
pub fn validate(draft: &AppointmentDraft) -> Result<NewAppointment, ValidationErrors> {
    let candidate = Candidate {
        client_name: Some(draft.client_name.as_str()),
        phone: Some(draft.phone.as_str()),
        date: Some(draft.date.as_str()),
        time: Some(draft.time.as_str()),
        service_type: Some(draft.service_type.as_str()),
        price: draft.price.as_ref(),
        status: draft.status.as_deref(),
    };
    let (errs, parsed) = check(&candidate, true);
    match (parsed.service_type, parsed.status, parsed.price) {
        (Some(service_type), Some(status), Some(price)) if errs.is_empty() => Ok(NewAppointment {
            client_name: draft.client_name.clone(),
            phone: draft.phone.clone(),
            date: draft.date.clone(),
            time: draft.time.clone(),
            service_type,
            price,
            status,
        }),
        _ => Err(errs),
    }
}

/// Validates only the fields a patch carries. A field sent as an empty
/// string is still a `required` violation.
pub fn validate_patch(patch: &AppointmentPatch) -> Result<ValidPatch, ValidationErrors> {
    let candidate = Candidate {
        client_name: patch.client_name.as_deref(),
        phone: patch.phone.as_deref(),
        date: patch.date.as_deref(),
        time: patch.time.as_deref(),
        service_type: patch.service_type.as_deref(),
        price: patch.price.as_ref(),
        status: patch.status.as_deref(),
    };
    let (errs, parsed) = check(&candidate, false);
    if !errs.is_empty() {
        return Err(errs);
    }
    Ok(ValidPatch {
        client_name: patch.client_name.clone(),
        phone: patch.phone.clone(),
        date: patch.date.clone(),
        time: patch.time.clone(),
        service_type: parsed.service_type,
        price: parsed.price,
        status: parsed.status,
    })
}

/// Parses a `DD/MM/YYYY` day, accepting nothing looser than the format
/// records are validated against.
pub fn parse_strict_day(value: &str) -> Option<time::Date> {
    if !DATE_RE.is_match(value) {
        return None;
    }
    parse_day(value)
}

fn check(c: &Candidate<'_>, require_all: bool) -> (ValidationErrors, Parsed) {
    let mut errs = ValidationErrors::default();
    let mut parsed = Parsed::default();

    // 1. required / length
    let text_fields = [
        ("clientName", c.client_name),
        ("phone", c.phone),
        ("date", c.date),
        ("time", c.time),
        ("serviceType", c.service_type),
    ];
    for (field, value) in text_fields {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            Some(_) => errs.push(field, "is required"),
            None if require_all => errs.push(field, "is required"),
            None => {}
        }
    }
    match c.price {
        Some(PriceInput::Text(t)) if t.trim().is_empty() => errs.push("price", "is required"),
        None if require_all => errs.push("price", "is required"),
        _ => {}
    }
    match c.status {
        Some(s) if s.trim().is_empty() => errs.push("status", "is required"),
        None if require_all => errs.push("status", "is required"),
        _ => {}
    }
    if let Some(name) = c.client_name {
        if name.chars().count() > MAX_NAME_CHARS {
            errs.push("clientName", format!("must be at most {MAX_NAME_CHARS} characters"));
        }
    }

    // Later checks only look at fields that were supplied and not empty.
    let usable = |field: &str, value: Option<&str>| -> bool {
        value.is_some() && !errs.has(field)
    };
    let phone_ok = usable("phone", c.phone);
    let date_ok = usable("date", c.date);
    let time_ok = usable("time", c.time);
    let service_ok = usable("serviceType", c.service_type);
    let status_ok = usable("status", c.status);
    let price_ok = c.price.is_some() && !errs.has("price");

    // 2. format
    let mut date_format_ok = false;
    let mut time_format_ok = false;
    if let (true, Some(phone)) = (phone_ok, c.phone) {
        if !PHONE_RE.is_match(phone) {
            errs.push("phone", "must match (DD) D DDDD-DDDD");
        }
    }
    if let (true, Some(date)) = (date_ok, c.date) {
        date_format_ok = DATE_RE.is_match(date);
        if !date_format_ok {
            errs.push("date", "must match DD/MM/YYYY");
        }
    }
    if let (true, Some(time)) = (time_ok, c.time) {
        time_format_ok = TIME_RE.is_match(time);
        if !time_format_ok {
            errs.push("time", "must match HH:MM");
        }
    }

    // 3. calendar validity
    if let (true, Some(date)) = (date_format_ok, c.date) {
        if parse_day(date).is_none() {
            errs.push("date", "is not a valid calendar date");
        }
    }

    // 4. time range
    if let (true, Some(time)) = (time_format_ok, c.time) {
        if parse_clock(time).is_none() {
            errs.push("time", "hours must be 00-23 and minutes 00-59");
        }
    }

    // 5. enumerations
    if let (true, Some(service)) = (service_ok, c.service_type) {
        parsed.service_type = ServiceType::from_label(service);
        if parsed.service_type.is_none() {
            let allowed: Vec<_> = ServiceType::ALL.iter().map(|s| s.label()).collect();
            errs.push("serviceType", format!("must be one of: {}", allowed.join(", ")));
        }
    }
    if let (true, Some(status)) = (status_ok, c.status) {
        parsed.status = AppointmentStatus::parse(status);
        if parsed.status.is_none() {
            let allowed: Vec<_> = AppointmentStatus::ALL.iter().map(|s| s.as_str()).collect();
            errs.push("status", format!("must be one of: {}", allowed.join(", ")));
        }
    }

    // 6. price
    if let (true, Some(price)) = (price_ok, c.price) {
        parsed.price = coerce_price(price);
        if parsed.price.is_none() {
            errs.push("price", "must be a positive number");
        }
    }

    (errs, parsed)
}

fn coerce_price(input: &PriceInput) -> Option<f64> {
    let value = match input {
        PriceInput::Number(n) => *n,
        PriceInput::Text(t) => t.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_draft() -> AppointmentDraft {
        AppointmentDraft {
            client_name: "Carlos Souza".into(),
            phone: "(11) 9 8765-4321".into(),
            date: "15/03/2025".into(),
            time: "14:30".into(),
            service_type: "Corte".into(),
            price: Some(PriceInput::Number(35.0)),
            status: Some("Scheduled".into()),
        }
    }

    fn fields(errs: &ValidationErrors) -> Vec<&'static str> {
        errs.errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn accepts_a_complete_draft() {
        let new = validate(&good_draft()).expect("valid draft");
        assert_eq!(new.service_type, ServiceType::Haircut);
        assert_eq!(new.status, AppointmentStatus::Scheduled);
        assert_eq!(new.price, 35.0);
    }

    #[test]
    fn empty_draft_reports_every_required_field() {
        let errs = validate(&AppointmentDraft::default()).unwrap_err();
        assert_eq!(
            fields(&errs),
            ["clientName", "phone", "date", "time", "serviceType", "price", "status"]
        );
        assert!(errs.errors.iter().all(|e| e.message == "is required"));
    }

    #[test]
    fn rejects_impossible_calendar_date_with_valid_format() {
        let draft = AppointmentDraft {
            date: "31/02/2025".into(),
            ..good_draft()
        };
        let errs = validate(&draft).unwrap_err();
        assert_eq!(errs.errors.len(), 1);
        assert_eq!(errs.errors[0].field, "date");
        assert_eq!(errs.errors[0].message, "is not a valid calendar date");
    }

    #[test]
    fn time_range_checked_after_format() {
        let draft = AppointmentDraft {
            time: "25:10".into(),
            ..good_draft()
        };
        let errs = validate(&draft).unwrap_err();
        assert_eq!(fields(&errs), ["time"]);
        assert!(errs.errors[0].message.contains("00-23"));

        let draft = AppointmentDraft {
            time: "9:30".into(),
            ..good_draft()
        };
        let errs = validate(&draft).unwrap_err();
        assert_eq!(errs.errors[0].message, "must match HH:MM");
    }

    #[test]
    fn formats_accept_only_ascii_digits() {
        let mut draft = good_draft();
        draft.phone = "(١١) ٩ ٨٧٦٥-٤٣٢١".into();
        draft.date = "١٥/٠٣/٢٠٢٥".into();
        draft.time = "١٠:٣٠".into();
        let errs = validate(&draft).unwrap_err();
        assert_eq!(
            errs.errors,
            vec![
                FieldError {
                    field: "phone",
                    message: "must match (DD) D DDDD-DDDD".into()
                },
                FieldError {
                    field: "date",
                    message: "must match DD/MM/YYYY".into()
                },
                FieldError {
                    field: "time",
                    message: "must match HH:MM".into()
                },
            ]
        );
    }

    #[test]
    fn strict_day_rejects_loose_forms() {
        assert!(parse_strict_day("15/03/2025").is_some());
        assert!(parse_strict_day("1/3/2025").is_none());
        assert!(parse_strict_day("+1/03/2025").is_none());
        assert!(parse_strict_day("30/02/2025").is_none());
    }

    #[test]
    fn collects_all_violations_in_check_order() {
        let draft = AppointmentDraft {
            client_name: "".into(),
            phone: "11987654321".into(),
            date: "2025-03-15".into(),
            time: "12:75".into(),
            service_type: "Pintura".into(),
            price: Some(PriceInput::Number(-5.0)),
            status: Some("Done".into()),
        };
        let errs = validate(&draft).unwrap_err();
        assert_eq!(
            fields(&errs),
            ["clientName", "phone", "date", "time", "serviceType", "status", "price"]
        );
    }

    #[test]
    fn name_longer_than_limit_is_rejected() {
        let draft = AppointmentDraft {
            client_name: "a".repeat(MAX_NAME_CHARS + 1),
            ..good_draft()
        };
        let errs = validate(&draft).unwrap_err();
        assert_eq!(fields(&errs), ["clientName"]);

        let draft = AppointmentDraft {
            client_name: "é".repeat(MAX_NAME_CHARS),
            ..good_draft()
        };
        assert!(validate(&draft).is_ok());
    }

    #[test]
    fn price_coerces_from_text() {
        let draft = AppointmentDraft {
            price: Some(PriceInput::Text(" 42.50 ".into())),
            ..good_draft()
        };
        assert_eq!(validate(&draft).unwrap().price, 42.5);

        for bad in ["abc", "0", "-1", "NaN", "inf"] {
            let draft = AppointmentDraft {
                price: Some(PriceInput::Text(bad.into())),
                ..good_draft()
            };
            let errs = validate(&draft).unwrap_err();
            assert_eq!(fields(&errs), ["price"], "price {bad:?}");
        }
    }

    #[test]
    fn patch_checks_only_supplied_fields() {
        let patch = AppointmentPatch {
            status: Some("Completed".into()),
            ..AppointmentPatch::default()
        };
        let valid = validate_patch(&patch).unwrap();
        assert_eq!(valid, ValidPatch::status(AppointmentStatus::Completed));

        let patch = AppointmentPatch {
            client_name: Some("  ".into()),
            phone: Some("(11) 98765-4321".into()),
            ..AppointmentPatch::default()
        };
        let errs = validate_patch(&patch).unwrap_err();
        assert_eq!(fields(&errs), ["clientName", "phone"]);
    }

    #[test]
    fn patch_with_nothing_is_valid_and_empty() {
        let valid = validate_patch(&AppointmentPatch::default()).unwrap();
        assert_eq!(valid, ValidPatch::default());
    }
}
