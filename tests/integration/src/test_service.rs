//! HTTP service integration tests.
//!
//! Complete request/response cycles through [`serenade_http::AppService`]
//! with buffered bodies, including the reloader-backed host.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use anyhow::anyhow;
    use http::header::{self, HeaderValue};
    use http::{Method, StatusCode};
    use serenade_core::{App, AppConfig, Context, Reloader};
    use serenade_http::AppService;

    use crate::{build_service, http_form_post, http_get, http_request, send, test_config};

    #[tokio::test]
    async fn test_should_tag_responses_with_request_ids_and_server_header() {
        let service = build_service(|app| {
            app.get("/", |_cx: &mut Context<'_>| Ok("home".into()))
        });

        let (status, first_headers, _) = send(&service, http_get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            first_headers.get(header::SERVER).map(HeaderValue::as_bytes),
            Some(&b"Serenade"[..])
        );
        assert_eq!(
            first_headers
                .get(header::CONTENT_TYPE)
                .map(HeaderValue::as_bytes),
            Some(&b"text/html; charset=utf-8"[..])
        );

        let (_, second_headers, _) = send(&service, http_get("/")).await;
        let first_id = first_headers.get("x-request-id").expect("request id");
        let second_id = second_headers.get("x-request-id").expect("request id");
        assert_ne!(first_id, second_id, "request ids should be per-request");
    }

    #[tokio::test]
    async fn test_should_parse_form_bodies_into_params() {
        let service = build_service(|app| {
            app.post("/guestbook", |cx: &mut Context<'_>| {
                let name = cx.param("name").unwrap_or_default();
                let note = cx.param("note").unwrap_or_default();
                Ok(format!("{name} says {note}").into())
            })
        });

        let request = http_form_post("/guestbook", "name=rust+fan&note=bravo");
        let (status, _, body) = send(&service, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "rust fan says bravo");
    }

    #[tokio::test]
    async fn test_should_tunnel_methods_through_the_form_field() {
        let service = build_service(|app| {
            app.delete("/entries/:id", |cx: &mut Context<'_>| {
                Ok(format!("deleted {}", cx.param("id").unwrap_or_default()).into())
            })
        });

        let request = http_form_post("/entries/7", "_method=DELETE");
        let (status, _, body) = send(&service, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "deleted 7");
    }

    #[tokio::test]
    async fn test_should_answer_head_requests_with_headers_only() {
        let service = build_service(|app| {
            app.get("/page", |_cx: &mut Context<'_>| Ok("hello world".into()))
        });

        let (status, headers, body) = send(&service, http_request(Method::HEAD, "/page")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(
            headers.get(header::CONTENT_LENGTH).map(HeaderValue::as_bytes),
            Some(&b"0"[..])
        );
    }

    #[tokio::test]
    async fn test_should_serve_fresh_definitions_behind_the_reload_guard() {
        let flag = Arc::new(AtomicBool::new(false));
        let in_define = Arc::clone(&flag);
        let config = AppConfig {
            reload: Some(true),
            ..test_config()
        };
        let reloader = Reloader::new(config, move |app: &mut App| {
            if in_define.load(Ordering::SeqCst) {
                app.get("/bonus", |_cx: &mut Context<'_>| Ok("bonus".into()))?;
            }
            Ok(())
        })
        .expect("definition should succeed");
        let service = AppService::new(reloader);

        let (status, _, _) = send(&service, http_get("/bonus")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        flag.store(true, Ordering::SeqCst);

        let (status, _, body) = send(&service, http_get("/bonus")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bonus");
    }

    #[tokio::test]
    async fn test_should_render_plain_500_when_reload_fails() {
        let broken = Arc::new(AtomicBool::new(false));
        let in_define = Arc::clone(&broken);
        let config = AppConfig {
            reload: Some(true),
            ..test_config()
        };
        let reloader = Reloader::new(config, move |app: &mut App| {
            if in_define.load(Ordering::SeqCst) {
                return Err(anyhow!("route file unreadable").into());
            }
            app.get("/", |_cx: &mut Context<'_>| Ok("ok".into()))
        })
        .expect("definition should succeed");
        let service = AppService::new(reloader);

        let (status, _, body) = send(&service, http_get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");

        broken.store(true, Ordering::SeqCst);

        let (status, _, body) = send(&service, http_get("/")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "<h1>Internal Server Error</h1>");
    }
}
