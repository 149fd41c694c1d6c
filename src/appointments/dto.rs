use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `schedule` orders by date and time; anything else keeps stored order.
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// `DD/MM/YYYY`; defaults to the current day in the shop's offset.
    pub today: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<String>,
}
