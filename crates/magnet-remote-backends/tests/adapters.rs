use httpmock::Method::POST;
use httpmock::MockServer;
use magnet_remote_backends::{
    BackendError, Credentials, DaemonClient, HttpSession, client_for,
};
use magnet_remote_config::ProtocolKind;
use serde_json::json;
use url::Url;

const MAGNET: &str = "magnet:?xt=urn:btih:0123456789abcdef&dn=Ubuntu+24.04";
const BASIC_ADMIN_SECRET: &str = "Basic YWRtaW46c2VjcmV0";

fn adapter(kind: ProtocolKind) -> anyhow::Result<Box<dyn DaemonClient>> {
    Ok(client_for(kind, &HttpSession::new()?))
}

fn endpoint(server: &MockServer) -> anyhow::Result<Url> {
    Ok(Url::parse(&server.base_url())?)
}

fn admin() -> Credentials {
    Credentials::new("admin", "secret")
}

#[tokio::test]
async fn qbittorrent_submit_logs_in_and_forwards_cookie() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let base = server.base_url();
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v2/auth/login")
            .header("referer", format!("{base}/"))
            .header("origin", base.as_str())
            .header("content-type", "application/x-www-form-urlencoded")
            .body("username=admin&password=secret");
        then.status(200)
            .header("set-cookie", "SID=abc123; HttpOnly; path=/")
            .body("Ok.");
    });
    let add = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v2/torrents/add")
            .header("cookie", "SID=abc123")
            .header("origin", base.as_str())
            .body("urls=magnet%3A%3Fxt%3Durn%3Abtih%3A0123456789abcdef%26dn%3DUbuntu%2B24.04");
        then.status(200).body("Ok.");
    });

    adapter(ProtocolKind::Qbittorrent)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await?;

    login.assert();
    add.assert();
    Ok(())
}

#[tokio::test]
async fn qbittorrent_rejects_wrong_credentials() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let login = server.mock(|when, then| {
        when.method(POST).path("/api/v2/auth/login");
        then.status(200).body("Fails.");
    });
    let add = server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/add");
        then.status(200).body("Ok.");
    });

    let err = adapter(ProtocolKind::Qbittorrent)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await
        .expect_err("login must fail");
    assert_eq!(err, BackendError::AuthenticationFailed);
    login.assert();
    add.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn qbittorrent_banned_client_is_an_authentication_failure() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/auth/login");
        then.status(403).body("Your IP address has been banned.");
    });

    let err = adapter(ProtocolKind::Qbittorrent)?
        .test_connection(&endpoint(&server)?, &admin())
        .await
        .expect_err("banned login must fail");
    assert_eq!(err, BackendError::AuthenticationFailed);
    Ok(())
}

#[tokio::test]
async fn qbittorrent_unauthorized_login_is_an_authentication_failure() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/auth/login");
        then.status(401).body("Unauthorized");
    });

    let err = adapter(ProtocolKind::Qbittorrent)?
        .test_connection(&endpoint(&server)?, &admin())
        .await
        .expect_err("unauthorized login must fail");
    assert_eq!(err, BackendError::AuthenticationFailed);
    Ok(())
}

#[tokio::test]
async fn qbittorrent_expired_session_on_add_is_an_authentication_failure() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/auth/login");
        then.status(200).header("set-cookie", "SID=abc123").body("Ok.");
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/add");
        then.status(401);
    });

    let err = adapter(ProtocolKind::Qbittorrent)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await
        .expect_err("add must fail");
    assert_eq!(err, BackendError::AuthenticationFailed);
    Ok(())
}

#[tokio::test]
async fn qbittorrent_add_without_marker_is_a_server_error() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/auth/login");
        then.status(200).header("set-cookie", "SID=abc123").body("Ok.");
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/add");
        then.status(200).body("Fails.");
    });

    let err = adapter(ProtocolKind::Qbittorrent)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await
        .expect_err("add must fail");
    assert_eq!(err, BackendError::ServerError("Fails.".into()));
    Ok(())
}

#[tokio::test]
async fn transmission_negotiates_session_id_before_adding() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let handshake = server.mock(|when, then| {
        when.method(POST)
            .path("/transmission/rpc")
            .header("authorization", BASIC_ADMIN_SECRET)
            .header_missing("x-transmission-session-id");
        then.status(409)
            .header("X-Transmission-Session-Id", "session-42");
    });
    let add = server.mock(|when, then| {
        when.method(POST)
            .path("/transmission/rpc")
            .header("authorization", BASIC_ADMIN_SECRET)
            .header("x-transmission-session-id", "session-42")
            .json_body(json!({
                "method": "torrent-add",
                "arguments": {"filename": MAGNET}
            }));
        then.status(200)
            .json_body(json!({"result": "success", "arguments": {"torrent-added": {"id": 1}}}));
    });

    adapter(ProtocolKind::Transmission)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await?;

    handshake.assert();
    add.assert();
    Ok(())
}

#[tokio::test]
async fn transmission_unauthorized_is_an_authentication_failure() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/transmission/rpc");
        then.status(401);
    });

    let err = adapter(ProtocolKind::Transmission)?
        .test_connection(&endpoint(&server)?, &admin())
        .await
        .expect_err("401 must fail");
    assert_eq!(err, BackendError::AuthenticationFailed);
    Ok(())
}

#[tokio::test]
async fn transmission_non_success_result_is_a_server_error() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path("/transmission/rpc")
            .header_missing("x-transmission-session-id");
        then.status(409).header("X-Transmission-Session-Id", "s");
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/transmission/rpc")
            .header("x-transmission-session-id", "s");
        then.status(200)
            .json_body(json!({"result": "duplicate torrent"}));
    });

    let err = adapter(ProtocolKind::Transmission)?
        .submit(MAGNET, &endpoint(&server)?, &Credentials::default())
        .await
        .expect_err("non-success result must fail");
    assert_eq!(err, BackendError::ServerError("duplicate torrent".into()));
    Ok(())
}

#[tokio::test]
async fn deluge_logs_in_with_password_and_adds_with_cookie() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/json")
            .header("content-type", "application/json")
            .body_includes("\"auth.login\"")
            .body_includes("[\"secret\"]");
        then.status(200)
            .header("set-cookie", "_session_id=deluge-cookie; Path=/json")
            .json_body(json!({"result": true, "error": null, "id": 1}));
    });
    let add = server.mock(|when, then| {
        when.method(POST)
            .path("/json")
            .header("cookie", "_session_id=deluge-cookie")
            .body_includes("\"core.add_torrent_magnet\"");
        then.status(200)
            .json_body(json!({"result": "0123456789abcdef", "error": null, "id": 2}));
    });

    adapter(ProtocolKind::Deluge)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await?;

    login.assert();
    add.assert();
    Ok(())
}

#[tokio::test]
async fn deluge_false_login_result_is_an_authentication_failure() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/json").body_includes("\"auth.login\"");
        then.status(200)
            .json_body(json!({"result": false, "error": null, "id": 1}));
    });

    let err = adapter(ProtocolKind::Deluge)?
        .test_connection(&endpoint(&server)?, &admin())
        .await
        .expect_err("login must fail");
    assert_eq!(err, BackendError::AuthenticationFailed);
    Ok(())
}

#[tokio::test]
async fn deluge_unauthorized_reply_is_an_authentication_failure() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let rpc = server.mock(|when, then| {
        when.method(POST).path("/json");
        then.status(401).body("Unauthorized");
    });

    let err = adapter(ProtocolKind::Deluge)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await
        .expect_err("unauthorized login must fail");
    assert_eq!(err, BackendError::AuthenticationFailed);
    rpc.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn deluge_error_object_fails_the_submission() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/json").body_includes("\"auth.login\"");
        then.status(200)
            .header("set-cookie", "_session_id=c")
            .json_body(json!({"result": true, "error": null, "id": 1}));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/json")
            .body_includes("\"core.add_torrent_magnet\"");
        then.status(200).json_body(json!({
            "result": null,
            "error": {"message": "Torrent already in session", "code": 4},
            "id": 2
        }));
    });

    let err = adapter(ProtocolKind::Deluge)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await
        .expect_err("error object must fail");
    assert_eq!(
        err,
        BackendError::ServerError("Torrent already in session".into())
    );
    Ok(())
}

#[tokio::test]
async fn rtorrent_posts_escaped_load_start() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let load = server.mock(|when, then| {
        when.method(POST)
            .path("/RPC2")
            .header("content-type", "text/xml")
            .header("authorization", BASIC_ADMIN_SECRET)
            .body_includes("<methodName>load.start</methodName>")
            .body_includes("<string>magnet:?xt=urn:btih:0123456789abcdef&amp;dn=Ubuntu+24.04</string>");
        then.status(200).body(
            "<?xml version=\"1.0\"?><methodResponse><params><param><value><i4>0</i4></value></param></params></methodResponse>",
        );
    });

    adapter(ProtocolKind::Rtorrent)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await?;

    load.assert();
    Ok(())
}

#[tokio::test]
async fn rtorrent_test_connection_omits_basic_auth_without_username() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let listing = server.mock(|when, then| {
        when.method(POST)
            .path("/RPC2")
            .header_missing("authorization")
            .body_includes("<methodName>system.listMethods</methodName>");
        then.status(200).body("<methodResponse/>");
    });

    adapter(ProtocolKind::Rtorrent)?
        .test_connection(&endpoint(&server)?, &Credentials::default())
        .await?;

    listing.assert();
    Ok(())
}

#[tokio::test]
async fn rtorrent_status_codes_map_to_categories() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path("/RPC2")
            .body_includes("system.listMethods");
        then.status(401);
    });
    server.mock(|when, then| {
        when.method(POST).path("/RPC2").body_includes("load.start");
        then.status(500);
    });
    let client = adapter(ProtocolKind::Rtorrent)?;
    let endpoint = endpoint(&server)?;

    let err = client
        .test_connection(&endpoint, &admin())
        .await
        .expect_err("401 must fail");
    assert_eq!(err, BackendError::AuthenticationFailed);

    let err = client
        .submit(MAGNET, &endpoint, &admin())
        .await
        .expect_err("500 must fail");
    assert_eq!(err, BackendError::ServerError("HTTP 500".into()));
    Ok(())
}

#[tokio::test]
async fn synology_refuses_plain_http() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let any = server.mock(|_when, then| {
        then.status(200);
    });

    let err = adapter(ProtocolKind::Synology)?
        .submit(MAGNET, &endpoint(&server)?, &admin())
        .await
        .expect_err("plain http must be refused");
    assert!(matches!(err, BackendError::InsecureConnection(_)));
    assert!(!err.is_transient());
    any.assert_hits(0);
    Ok(())
}
