mod common;

use common::logged_in_session;
use ions_core::api::{ApiError, Ions};
use reqwest::header;
use reqwest::{Method, StatusCode};
use serde::Deserialize;

#[tokio::test]
async fn test_fetch_reservoirs_end_to_end() {
    let (session, transport) = logged_in_session().await;
    let ions = Ions::from_session(session);

    transport.respond(
        StatusCode::OK,
        r#"[{"nome": "FURNAS", "volumeUtil": 71.3}, {"nome": "SOBRADINHO", "volumeUtil": 45.0}]"#,
    );
    let reservoirs = ions.fetch_reservoirs().await.unwrap();

    let sent = transport.last_request();
    assert_eq!(sent.method, Method::GET);
    assert_eq!(sent.url, "https://integra.ons.org.br/api/hidrologia/reservatorios");
    assert_eq!(sent.headers[header::AUTHORIZATION], "Bearer tok");
    assert_eq!(reservoirs[0]["nome"], "FURNAS");
    assert_eq!(reservoirs.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_fetch_reservoirs_typed() {
    #[derive(Debug, Deserialize)]
    struct Reservoir {
        nome: String,
        #[serde(rename = "volumeUtil")]
        volume_util: f64,
    }

    let (session, transport) = logged_in_session().await;
    let ions = Ions::from_session(session);

    transport.respond(StatusCode::OK, r#"[{"nome": "FURNAS", "volumeUtil": 71.3}]"#);
    let reservoirs: Vec<Reservoir> = ions.fetch_reservoirs_as().await.unwrap();

    assert_eq!(reservoirs.len(), 1);
    assert_eq!(reservoirs[0].nome, "FURNAS");
    assert!((reservoirs[0].volume_util - 71.3).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_fetch_reservoirs_invalid_json() {
    let (session, transport) = logged_in_session().await;
    let ions = Ions::from_session(session);

    transport.respond(StatusCode::OK, "<html>maintenance</html>");
    let err = ions.fetch_reservoirs().await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_fetch_reservoirs_transport_error() {
    let (session, transport) = logged_in_session().await;
    let ions = Ions::from_session(session);

    transport.fail(ApiError::transport(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset",
    )));
    let err = ions.fetch_reservoirs().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn test_fetch_reservoirs_reuses_cached_url() {
    let (session, transport) = logged_in_session().await;
    let ions = Ions::from_session(session);

    transport.respond(StatusCode::OK, "[]");
    transport.respond(StatusCode::OK, "[]");
    ions.fetch_reservoirs().await.unwrap();
    ions.fetch_reservoirs().await.unwrap();

    let urls: Vec<String> = transport.requests().into_iter().skip(1).map(|r| r.url).collect();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0], urls[1]);
    assert_eq!(
        ions.session().build_url(["hidrologia", "reservatorios"]),
        urls[0]
    );
}
