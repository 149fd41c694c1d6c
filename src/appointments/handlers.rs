use std::{collections::HashSet, convert::Infallible};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, patch, post},
    Json, Router,
};
use time::OffsetDateTime;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::{info, instrument};

use super::{
    dashboard::{summarize, DashboardSummary},
    dto::{BatchDeleteRequest, DashboardQuery, ListQuery},
    error::StoreError,
    feed::Snapshot,
    model::{sort_by_schedule, AppointmentDraft, AppointmentPatch, AppointmentRecord},
    store::RecordStore,
    validation::{parse_strict_day, validate, validate_patch, ValidationErrors},
};
use crate::{auth::extractors::AuthUser, state::AppState};

type Records = Json<Vec<AppointmentRecord>>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route("/appointments/batch-delete", post(delete_appointments))
        .route("/appointments/events", get(appointment_events))
        .route(
            "/appointments/:id",
            patch(update_appointment).delete(delete_appointment),
        )
        .route("/dashboard", get(dashboard))
}

#[instrument(skip(state))]
pub async fn list_appointments(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(q): Query<ListQuery>,
) -> Result<Records, StoreError> {
    let store = RecordStore::new(state.documents.as_ref(), &user);
    let mut records = store.list().await?;
    if q.sort.as_deref() == Some("schedule") {
        sort_by_schedule(&mut records);
    }
    Ok(Json(records))
}

#[instrument(skip(state, draft))]
pub async fn create_appointment(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(draft): Json<AppointmentDraft>,
) -> Result<(StatusCode, Records), StoreError> {
    let store = RecordStore::new(state.documents.as_ref(), &user);
    let user_id = store.user_id()?;
    let new = validate(&draft.with_defaults())?;

    let id = store.create(new).await?;
    info!(%user_id, %id, "appointment created");

    let records = state.feed.refresh(&store).await?;
    Ok((StatusCode::CREATED, Json(records)))
}

#[instrument(skip(state, changes))]
pub async fn update_appointment(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<String>,
    Json(changes): Json<AppointmentPatch>,
) -> Result<Records, StoreError> {
    let store = RecordStore::new(state.documents.as_ref(), &user);
    store.user_id()?;
    let changes = validate_patch(&changes)?;

    store.update(&id, changes).await?;
    Ok(Json(state.feed.refresh(&store).await?))
}

#[instrument(skip(state))]
pub async fn delete_appointment(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<Records, StoreError> {
    let store = RecordStore::new(state.documents.as_ref(), &user);
    store.delete(&id).await?;
    Ok(Json(state.feed.refresh(&store).await?))
}

#[instrument(skip(state, body))]
pub async fn delete_appointments(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(body): Json<BatchDeleteRequest>,
) -> Result<Records, StoreError> {
    let store = RecordStore::new(state.documents.as_ref(), &user);
    let ids: HashSet<String> = body.ids.into_iter().collect();
    store.delete_batch(&ids).await?;
    Ok(Json(state.feed.refresh(&store).await?))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<DashboardSummary>, StoreError> {
    let store = RecordStore::new(state.documents.as_ref(), &user);
    store.user_id()?;
    let today = match q.today.as_deref() {
        Some(raw) => parse_strict_day(raw)
            .ok_or_else(|| ValidationErrors::single("today", "must be a valid DD/MM/YYYY date"))?,
        None => OffsetDateTime::now_utc()
            .to_offset(state.config.utc_offset())
            .date(),
    };
    let records = store.list().await?;
    Ok(Json(summarize(&records, today)))
}

/// SSE stream of the caller's collection: the current snapshot first, then
/// one `appointments` event per refresh.
#[instrument(skip(state))]
pub async fn appointment_events(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StoreError> {
    let store = RecordStore::new(state.documents.as_ref(), &user);
    let user_id = store.user_id()?;
    let rx = state.feed.subscribe(user_id);
    state.feed.refresh(&store).await?;

    let stream = WatchStream::new(rx).map(|records: Snapshot| {
        let payload = serde_json::to_string(&*records).unwrap_or_else(|_| "[]".to_string());
        Ok(Event::default().event("appointments").data(payload))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtKeys;
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::Request,
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        app: Router,
        token: String,
    }

    impl TestApp {
        fn new() -> Self {
            let state = AppState::fake();
            let token = JwtKeys::from_ref(&state)
                .sign_access(Uuid::new_v4())
                .unwrap();
            Self {
                app: routes().with_state(state),
                token,
            }
        }

        async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
            let builder = Request::builder()
                .method(method)
                .uri(uri)
                .header("authorization", format!("Bearer {}", self.token));
            let req = match body {
                Some(v) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(v.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.app.clone().oneshot(req).await.unwrap()
        }
    }

    async fn json_body(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn draft(name: &str, date: &str, service: &str) -> Value {
        json!({
            "clientName": name,
            "phone": "(11) 9 8765-4321",
            "date": date,
            "time": "10:30",
            "serviceType": service,
        })
    }

    #[tokio::test]
    async fn anonymous_calls_are_unauthorized() {
        let app = routes().with_state(AppState::fake());
        let res = app
            .oneshot(Request::get("/appointments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_fills_defaults_and_returns_refreshed_list() {
        let t = TestApp::new();
        let res = t
            .send("POST", "/appointments", Some(draft("Ana", "15/03/2025", "Corte e Barba")))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let list = json_body(res).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["status"], "Scheduled");
        assert_eq!(list[0]["price"], 50.0);
        assert!(!list[0]["id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_reports_every_field() {
        let t = TestApp::new();
        let body = json!({
            "clientName": "Ana",
            "phone": "123",
            "date": "31/02/2025",
            "time": "10:30",
            "serviceType": "Corte",
        });
        let res = t.send("POST", "/appointments", Some(body)).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let err = json_body(res).await;
        let fields: Vec<_> = err["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, ["phone", "date"]);

        let list = json_body(t.send("GET", "/appointments", None).await).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_delete_and_batch_delete() {
        let t = TestApp::new();
        for name in ["Ana", "Bruno", "Caio"] {
            t.send("POST", "/appointments", Some(draft(name, "15/03/2025", "Corte")))
                .await;
        }
        let list = json_body(t.send("GET", "/appointments", None).await).await;
        let ids: Vec<String> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();

        let res = t
            .send(
                "PATCH",
                &format!("/appointments/{}", ids[0]),
                Some(json!({ "status": "Completed" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let list = json_body(res).await;
        assert_eq!(list[0]["status"], "Completed");
        assert_eq!(list[1]["status"], "Scheduled");

        let res = t
            .send("PATCH", "/appointments/nope", Some(json!({ "status": "Later" })))
            .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = t.send("DELETE", "/appointments/nope", None).await;
        assert_eq!(json_body(res).await.as_array().unwrap().len(), 3);

        let res = t
            .send("DELETE", &format!("/appointments/{}", ids[1]), None)
            .await;
        assert_eq!(json_body(res).await.as_array().unwrap().len(), 2);

        let res = t
            .send(
                "POST",
                "/appointments/batch-delete",
                Some(json!({ "ids": [ids[0], ids[2], "ghost"] })),
            )
            .await;
        assert!(json_body(res).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_can_sort_by_schedule() {
        let t = TestApp::new();
        t.send("POST", "/appointments", Some(draft("Tarde", "16/03/2025", "Barba")))
            .await;
        t.send("POST", "/appointments", Some(draft("Manhã", "15/03/2025", "Barba")))
            .await;

        let stored = json_body(t.send("GET", "/appointments", None).await).await;
        assert_eq!(stored[0]["clientName"], "Tarde");
        let sorted = json_body(t.send("GET", "/appointments?sort=schedule", None).await).await;
        assert_eq!(sorted[0]["clientName"], "Manhã");
    }

    #[tokio::test]
    async fn dashboard_for_given_day() {
        let t = TestApp::new();
        t.send("POST", "/appointments", Some(draft("Ana", "15/03/2025", "Corte")))
            .await;
        let list = t
            .send("POST", "/appointments", Some(draft("Bruno", "15/03/2025", "Corte e Barba")))
            .await;
        let id = json_body(list).await[0]["id"].as_str().unwrap().to_string();
        t.send(
            "PATCH",
            &format!("/appointments/{id}"),
            Some(json!({ "status": "Completed" })),
        )
        .await;

        let res = t.send("GET", "/dashboard?today=15/03/2025", None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let summary = json_body(res).await;
        assert_eq!(summary["todayRevenue"], 35.0);
        assert_eq!(summary["todayCompleted"], 1);
        assert_eq!(summary["todayUpcoming"], 1);
        assert_eq!(summary["totalRevenue"], 35.0);
        assert_eq!(summary["completedByService"]["Corte"], 1);

        let res = t.send("GET", "/dashboard?today=30/02/2025", None).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        for loose in ["1/3/2025", "%2B1/03/2025"] {
            let res = t.send("GET", &format!("/dashboard?today={loose}"), None).await;
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "{loose}");
        }
    }
}
