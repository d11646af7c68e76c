use axum::{routing::get, routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::commands as command_handlers;
use super::api::missions as mission_handlers;
use super::api::passes as pass_handlers;
use super::api::reservations as reservation_handlers;
use super::api::satellites as satellite_handlers;
use super::api::stations as station_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Passes
        .route("/api/passes", get(pass_handlers::list_passes))
        // Reservations
        .route(
            "/api/reservations",
            post(reservation_handlers::create_reservation)
                .get(reservation_handlers::list_reservations),
        )
        .route(
            "/api/reservations/{r_id}",
            get(reservation_handlers::get_reservation),
        )
        .route(
            "/api/reservations/{r_id}/cancel",
            post(reservation_handlers::cancel_reservation),
        )
        // Satellites
        .route(
            "/api/satellites",
            post(satellite_handlers::register_satellite).get(satellite_handlers::list_satellites),
        )
        .route(
            "/api/satellites/{norad_id}",
            get(satellite_handlers::get_satellite)
                .patch(satellite_handlers::update_satellite)
                .delete(satellite_handlers::delete_satellite),
        )
        // Ground stations
        .route(
            "/api/groundstations",
            post(station_handlers::register_station).get(station_handlers::list_stations),
        )
        .route(
            "/api/groundstations/{gs_id}",
            get(station_handlers::get_station)
                .patch(station_handlers::update_station)
                .delete(station_handlers::delete_station),
        )
        // Missions
        .route(
            "/api/missions",
            post(mission_handlers::create_mission).get(mission_handlers::list_missions),
        )
        .route(
            "/api/missions/{mission_id}",
            get(mission_handlers::get_mission)
                .patch(mission_handlers::update_mission)
                .delete(mission_handlers::delete_mission),
        )
        .route(
            "/api/missions/{mission_id}/satellites",
            get(mission_handlers::list_mission_satellites)
                .post(mission_handlers::add_mission_satellite),
        )
        .route(
            "/api/missions/{mission_id}/satellites/{norad_id}",
            axum::routing::delete(mission_handlers::remove_mission_satellite),
        )
        .route(
            "/api/missions/{mission_id}/reservations",
            get(reservation_handlers::list_mission_reservations),
        )
        // Command catalog
        .route("/api/commands", get(command_handlers::list_commands))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState, bind_addr: &str) -> std::io::Result<()> {
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::PredictedWindow;
    use crate::registry::NewStation;
    use crate::store::Store;
    use crate::testing::{hours_from, FakePredictor, Script, StaticElements};
    use crate::web::state::Settings;
    use axum::body::Body;
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        app: Router,
        gs_id: i64,
    }

    async fn test_app(script: Script) -> TestApp {
        let store = Store::in_memory().await.unwrap();
        let state = AppState::new(
            store,
            FakePredictor::new(script),
            StaticElements::serving(),
            Settings {
                claim_grace: Duration::seconds(2),
                staleness: Duration::hours(24),
                upstream_timeout: std::time::Duration::from_millis(200),
            },
        );
        state.satellites.register(25544, "ISS").await.unwrap();
        let gs_id = state
            .stations
            .register(&NewStation {
                gs_code: "TEST_GS".into(),
                lon: -105.0,
                lat: 39.0,
                alt: 1600.0,
            })
            .await
            .unwrap()
            .gs_id;

        TestApp {
            app: router(state),
            gs_id,
        }
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, json)
    }

    fn one_window() -> Script {
        let now = Utc::now();
        Script::Windows(vec![PredictedWindow::new(
            hours_from(now, 1),
            hours_from(now, 2),
            55.0,
        )])
    }

    #[tokio::test]
    async fn reserve_cancel_round_trip_over_http() {
        let t = test_app(one_window()).await;
        let passes_uri = format!("/api/passes?norad_id=25544&gs_id={}", t.gs_id);

        let (status, _, body) = send(&t.app, Method::GET, &passes_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let passes = body["passes"].as_array().unwrap();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0]["source"], "N2YO");
        assert_eq!(passes[0]["norad_id"], 25544);
        let pass_id = passes[0]["pass_id"].as_i64().unwrap();

        let (status, _, reservation) = send(
            &t.app,
            Method::POST,
            "/api/reservations",
            Some(json!({ "pass_id": pass_id, "commands": ["PING", "SET_MODE"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reservation["status"], "RESERVED");
        assert_eq!(reservation["commands"], json!(["PING", "SET_MODE"]));
        let r_id = reservation["r_id"].as_i64().unwrap();

        let (status, _, body) = send(
            &t.app,
            Method::POST,
            "/api/reservations",
            Some(json!({ "pass_id": pass_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");

        let (_, _, body) = send(&t.app, Method::GET, &passes_uri, None).await;
        assert!(body["passes"].as_array().unwrap().is_empty());

        let (status, _, body) = send(
            &t.app,
            Method::POST,
            &format!("/api/reservations/{}/cancel", r_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CANCELLED");

        let (_, _, body) = send(&t.app, Method::GET, &passes_uri, None).await;
        assert_eq!(body["passes"][0]["pass_id"].as_i64(), Some(pass_id));

        let (_, _, body) = send(&t.app, Method::GET, "/api/reservations", None).await;
        assert!(body["reservations"].as_array().unwrap().is_empty());
        let (_, _, body) = send(
            &t.app,
            Method::GET,
            "/api/reservations?include_cancelled=true",
            None,
        )
        .await;
        assert_eq!(body["reservations"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn errors_carry_their_kind() {
        let t = test_app(Script::Fail).await;

        let (status, _, body) =
            send(&t.app, Method::GET, "/api/passes?norad_id=25544&gs_id=999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let uri = format!("/api/passes?norad_id=25544&gs_id={}", t.gs_id);
        let (status, _, body) = send(&t.app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "unavailable");

        let (status, _, body) = send(
            &t.app,
            Method::POST,
            "/api/reservations",
            Some(json!({ "pass_id": 1, "commands": ["PING"] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("Pass (1)"));

        let (status, _, _) = send(&t.app, Method::GET, "/api/reservations/77", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn satellite_registry_endpoints() {
        let t = test_app(Script::Fail).await;

        let (status, _, body) = send(
            &t.app,
            Method::POST,
            "/api/satellites",
            Some(json!({ "norad_id": 99999, "s_name": "TEST SAT" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.get("s_id").is_none());

        let (status, _, _) = send(
            &t.app,
            Method::POST,
            "/api/satellites",
            Some(json!({ "norad_id": 99999, "s_name": "TEST SAT" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, _) = send(
            &t.app,
            Method::PATCH,
            "/api/satellites/99999",
            Some(json!({ "tle_line1": "X" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _, _) =
            send(&t.app, Method::PATCH, "/api/satellites/99999", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(
            &t.app,
            Method::PATCH,
            "/api/satellites/99999",
            Some(json!({ "s_name": "NEW SAT NAME" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["s_name"], "NEW SAT NAME");

        let (_, _, body) = send(&t.app, Method::GET, "/api/satellites", None).await;
        assert_eq!(body["satellites"].as_array().unwrap().len(), 2);

        let (status, headers, body) =
            send(&t.app, Method::DELETE, "/api/satellites/99999", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key(header::WARNING));
        assert_eq!(body["deleted_reservations"], 0);

        let (status, _, _) = send(&t.app, Method::DELETE, "/api/satellites/99999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn station_deactivation_reports_cascade() {
        let t = test_app(one_window()).await;
        let passes_uri = format!("/api/passes?norad_id=25544&gs_id={}", t.gs_id);
        send(&t.app, Method::GET, &passes_uri, None).await;

        let (status, _, body) = send(
            &t.app,
            Method::PATCH,
            &format!("/api/groundstations/{}", t.gs_id),
            Some(json!({ "status": "INACTIVE" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["station"]["status"], "INACTIVE");
        assert_eq!(body["deactivation"]["deleted_passes"], 1);
        assert_eq!(body["deactivation"]["cancelled_reservations"], 0);

        let (status, _, body) = send(&t.app, Method::GET, &passes_uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");

        let (status, _, _) = send(
            &t.app,
            Method::POST,
            "/api/groundstations",
            Some(json!({ "gs_code": "bad code", "lon": 1.0, "lat": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missions_gate_reservations() {
        let t = test_app(one_window()).await;
        let (_, _, body) = send(
            &t.app,
            Method::GET,
            &format!("/api/passes?norad_id=25544&gs_id={}", t.gs_id),
            None,
        )
        .await;
        let pass_id = body["passes"][0]["pass_id"].as_i64().unwrap();

        let (status, _, mission) = send(
            &t.app,
            Method::POST,
            "/api/missions",
            Some(json!({ "mission_name": "Survey" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let mission_id = mission["mission_id"].as_i64().unwrap();

        let reserve = json!({ "pass_id": pass_id, "mission_id": mission_id });
        let (status, _, _) =
            send(&t.app, Method::POST, "/api/reservations", Some(reserve.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(
            &t.app,
            Method::POST,
            &format!("/api/missions/{}/satellites", mission_id),
            Some(json!({ "norad_id": 25544 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, _) = send(&t.app, Method::POST, "/api/reservations", Some(reserve)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, _, body) = send(
            &t.app,
            Method::GET,
            &format!("/api/missions/{}/reservations", mission_id),
            None,
        )
        .await;
        assert_eq!(body["reservations"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn catalog_and_openapi_are_served() {
        let t = test_app(Script::Fail).await;

        let (status, _, body) = send(&t.app, Method::GET, "/api/commands", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["commands"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["command_type"] == "PING"));

        let (status, _, body) = send(&t.app, Method::GET, "/api-doc/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/api/passes").is_some());
    }
}
