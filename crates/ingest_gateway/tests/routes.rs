use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use ingest_gateway::server::{
    client_credentials_router, user_authorization_router, ClientCredentialsState, UserAuthState,
};
use ingest_gateway::{
    AuthenticatedClient, AuthorizationCodeFlow, BearerToken, CookieKey, IngestConfig,
    ServiceCredential, TokenAuthenticator, VideoGateway,
};
use mockito::{Matcher, Server, ServerGuard};
use tower::ServiceExt;
use url::Url;

const MEDIA_TYPE: &str = "application/vnd.ingest.v1+json";

fn config_for(server: &ServerGuard) -> IngestConfig {
    IngestConfig::new(ServiceCredential::new("client", "secret"))
        .unwrap()
        .with_token_url(format!("{}/token", server.url()).parse().unwrap())
        .with_base_api_url(server.url().parse().unwrap())
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("ingest_session="))
        .and_then(|value| value.split(';').next())
        .unwrap()
        .to_string()
}

// ── Client-credentials front-end ───────────────────────────────────

fn client_app(server: &ServerGuard, token: &str) -> Router {
    let config = config_for(server);
    let http = reqwest::Client::new();
    let client =
        AuthenticatedClient::new(http.clone(), MEDIA_TYPE, BearerToken::new(token).unwrap())
            .unwrap();
    let gateway = VideoGateway::new(client, config.base_api_url.clone());
    let authenticator = TokenAuthenticator::from_config(&config, http);

    client_credentials_router(ClientCredentialsState::new(
        gateway,
        authenticator,
        config.credential.clone(),
    ))
}

#[tokio::test]
async fn test_client_videos_page_lists_videos() {
    let mut server = Server::new_async().await;
    let _videos = server
        .mock("GET", "/videos")
        .match_query(Matcher::UrlEncoded("status".into(), "published,scheduled".into()))
        .match_header("authorization", "Bearer svc-token")
        .with_status(200)
        .with_body(r#"[{"id":"v1","title":"Launch day","targets":[]}]"#)
        .create_async()
        .await;
    let app = client_app(&server, "svc-token");

    let response = get(&app, "/videos", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Launch day"));
    assert!(body.contains(r#"href="/videos/v1""#));
}

#[tokio::test]
async fn test_client_video_page_plays_high_target() {
    let mut server = Server::new_async().await;
    let _video = server
        .mock("GET", "/videos/v1")
        .with_status(200)
        .with_body(
            r#"{"id":"v1","title":"Launch day","targets":[
                {"name":"low","playback_url":"https://cdn.example/low.m3u8"},
                {"name":"high","playback_url":"https://cdn.example/high.m3u8"}]}"#,
        )
        .create_async()
        .await;
    let app = client_app(&server, "svc-token");

    let body = body_text(get(&app, "/videos/v1", None).await).await;

    assert!(body.contains(r#"src="https://cdn.example/high.m3u8""#));
}

#[tokio::test]
async fn test_client_reauthenticates_once_after_401() {
    let mut server = Server::new_async().await;
    let rejected = server
        .mock("GET", "/videos")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let token = server
        .mock("POST", "/token")
        .match_query(Matcher::UrlEncoded(
            "grant_type".into(),
            "client_credentials".into(),
        ))
        .with_status(200)
        .with_body(r#"{"access_token":"fresh"}"#)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("GET", "/videos")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;
    let app = client_app(&server, "stale");

    let response = get(&app, "/videos", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    rejected.assert_async().await;
    token.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn test_client_reports_failed_reauthentication() {
    let mut server = Server::new_async().await;
    let _rejected = server
        .mock("GET", "/videos")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;
    let _token = server
        .mock("POST", "/token")
        .match_query(Matcher::Any)
        .with_status(400)
        .create_async()
        .await;
    let app = client_app(&server, "stale");

    let response = get(&app, "/videos", None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("Authentication failed"));
}

#[tokio::test]
async fn test_client_upstream_failure_is_visible() {
    let mut server = Server::new_async().await;
    let _videos = server
        .mock("GET", "/videos")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let app = client_app(&server, "svc-token");

    let response = get(&app, "/videos", None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response)
        .await
        .contains("Request failed - ingest status code: 500"));
}

// ── User-authorization front-end ───────────────────────────────────

fn user_state(server: &ServerGuard) -> UserAuthState {
    let config = config_for(server);
    let http = reqwest::Client::new();
    let flow = AuthorizationCodeFlow::new(config, http.clone());
    UserAuthState::new(flow, http, CookieKey::generate())
}

fn user_app(server: &ServerGuard) -> Router {
    user_authorization_router(user_state(server))
}

/// Run `/login` and a matching callback; returns the logged-in session cookie.
async fn log_in(app: &Router) -> String {
    let login = get(app, "/login", None).await;
    let cookie = session_cookie(&login);
    let redirect: Url = location(&login).parse().unwrap();
    let params: HashMap<String, String> = redirect.query_pairs().into_owned().collect();

    let callback = get(
        app,
        &format!("/oauth/callback?code=auth-code&state={}", params["state"]),
        Some(&cookie),
    )
    .await;
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&callback), "/");

    cookie
}

async fn token_endpoint(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/token")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "authorization_code".into(),
        ))
        .with_status(200)
        .with_body(r#"{"access_token":"user-token","token_type":"Bearer"}"#)
        .create_async()
        .await
}

#[tokio::test]
async fn test_user_videos_require_login() {
    let server = Server::new_async().await;
    let app = user_app(&server);

    let response = get(&app, "/videos", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_user_login_redirects_to_provider() {
    let server = Server::new_async().await;
    let app = user_app(&server);

    let response = get(&app, "/login", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let redirect = location(&response);
    assert!(redirect.starts_with("https://login.ingest.io/authorize?"));
    assert!(redirect.contains("client_id=client"));
    assert!(redirect.contains("scope=read_videos"));
    assert!(redirect.contains("state="));
    assert!(session_cookie(&response).starts_with("ingest_session="));
}

#[tokio::test]
async fn test_user_callback_with_forged_state_is_rejected() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/token")
        .expect(0)
        .create_async()
        .await;
    let app = user_app(&server);

    let login = get(&app, "/login", None).await;
    let cookie = session_cookie(&login);
    let response = get(
        &app,
        "/oauth/callback?code=auth-code&state=forged",
        Some(&cookie),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("OAuth state mismatch"));
    token.assert_async().await;

    let index = body_text(get(&app, "/", Some(&cookie)).await).await;
    assert!(index.contains("/login"));
}

#[tokio::test]
async fn test_user_state_nonce_is_single_use() {
    let mut server = Server::new_async().await;
    let _token = token_endpoint(&mut server).await;
    let app = user_app(&server);

    let login = get(&app, "/login", None).await;
    let cookie = session_cookie(&login);
    let redirect: Url = location(&login).parse().unwrap();
    let state = redirect
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    let callback = format!("/oauth/callback?code=auth-code&state={state}");

    assert_eq!(
        get(&app, &callback, Some(&cookie)).await.status(),
        StatusCode::SEE_OTHER
    );
    assert_eq!(
        get(&app, &callback, Some(&cookie)).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_user_callback_reports_denied_authorization() {
    let server = Server::new_async().await;
    let app = user_app(&server);

    let login = get(&app, "/login", None).await;
    let cookie = session_cookie(&login);
    let response = get(
        &app,
        "/oauth/callback?error=access_denied&error_description=User+declined",
        Some(&cookie),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("User declined"));
}

#[tokio::test]
async fn test_user_login_then_browse_with_session_token() {
    let mut server = Server::new_async().await;
    let _token = token_endpoint(&mut server).await;
    let videos = server
        .mock("GET", "/videos")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer user-token")
        .match_header("accept", MEDIA_TYPE)
        .with_status(200)
        .with_body(r#"[{"id":"v1","title":"Launch day","targets":[]}]"#)
        .create_async()
        .await;
    let app = user_app(&server);

    let cookie = log_in(&app).await;
    let index = body_text(get(&app, "/", Some(&cookie)).await).await;
    assert!(index.contains("/logout"));

    let response = get(&app, "/videos", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Launch day"));
    videos.assert_async().await;
}

#[tokio::test]
async fn test_user_logout_revokes_and_clears_session() {
    let mut server = Server::new_async().await;
    let _token = token_endpoint(&mut server).await;
    let revoke = server
        .mock("DELETE", "/users/me/revoke")
        .match_header("authorization", "Bearer user-token")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let app = user_app(&server);
    let cookie = log_in(&app).await;

    let response = get(&app, "/logout", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    revoke.assert_async().await;
    let videos = get(&app, "/videos", Some(&cookie)).await;
    assert_eq!(videos.status(), StatusCode::SEE_OTHER);
    let index = body_text(get(&app, "/", Some(&cookie)).await).await;
    assert!(index.contains("/login"));
}

#[tokio::test]
async fn test_user_failed_revoke_keeps_session_logged_in() {
    let mut server = Server::new_async().await;
    let _token = token_endpoint(&mut server).await;
    let _revoke = server
        .mock("DELETE", "/users/me/revoke")
        .with_status(500)
        .create_async()
        .await;
    let app = user_app(&server);
    let cookie = log_in(&app).await;

    let response = get(&app, "/logout", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("Logout failed"));
    let index = body_text(get(&app, "/", Some(&cookie)).await).await;
    assert!(index.contains("/logout"));
}

#[tokio::test]
async fn test_user_cookieless_requests_leave_no_sessions_behind() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/token")
        .expect(0)
        .create_async()
        .await;
    let state = user_state(&server);
    let sessions = state.sessions().clone();
    let app = user_authorization_router(state);

    for _ in 0..50 {
        assert_eq!(
            get(&app, "/logout", None).await.status(),
            StatusCode::SEE_OTHER
        );
        assert_eq!(
            get(&app, "/oauth/callback?state=x&code=y", None)
                .await
                .status(),
            StatusCode::BAD_REQUEST
        );
        get(&app, "/", None).await;
    }

    assert_eq!(sessions.len(), 0);
    token.assert_async().await;
}

#[tokio::test]
async fn test_user_logout_removes_stored_session() {
    let mut server = Server::new_async().await;
    let _token = token_endpoint(&mut server).await;
    let _revoke = server
        .mock("DELETE", "/users/me/revoke")
        .with_status(204)
        .create_async()
        .await;
    let state = user_state(&server);
    let sessions = state.sessions().clone();
    let app = user_authorization_router(state);

    let cookie = log_in(&app).await;
    assert_eq!(sessions.len(), 1);

    get(&app, "/logout", Some(&cookie)).await;

    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_user_upstream_failure_is_not_an_empty_list() {
    let mut server = Server::new_async().await;
    let _token = token_endpoint(&mut server).await;
    let _videos = server
        .mock("GET", "/videos")
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;
    let app = user_app(&server);
    let cookie = log_in(&app).await;

    let response = get(&app, "/videos", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_text(response).await;
    assert!(body.contains("Request failed - ingest status code: 403"));
    assert!(!body.contains("No published or scheduled videos"));
}
