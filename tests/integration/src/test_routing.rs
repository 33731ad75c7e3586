//! Route lookup integration tests.
//!
//! Whole requests run through [`serenade_core::App::dispatch`] so these
//! cover lookup order, guards, and parameter binding as the pipeline
//! actually applies them.

#[cfg(test)]
mod tests {
    use http::header::{self, HeaderValue};
    use http::{Method, StatusCode};
    use serenade_core::{Context, HostGuard, Request, RouteOptions};

    use crate::build_app;

    fn get(path: &str) -> Request {
        Request::builder().path(path).build()
    }

    #[test]
    fn test_should_prefer_the_earliest_matching_route() {
        let app = build_app(|app| {
            app.get("/songs/:id", |_cx: &mut Context<'_>| Ok("by id".into()))?;
            app.get("/songs/new", |_cx: &mut Context<'_>| Ok("literal".into()))
        });

        // `/songs/new` matches both templates; the one defined first wins.
        let response = app.dispatch(get("/songs/new")).expect("dispatch");
        assert_eq!(response.text(), "by id");
    }

    #[test]
    fn test_should_layer_captures_over_query_params() {
        let app = build_app(|app| {
            app.get("/songs/:id", |cx: &mut Context<'_>| {
                let id = cx.param("id").unwrap_or_default();
                let page = cx.param("page").unwrap_or_default();
                Ok(format!("id={id} page={page}").into())
            })
        });

        let request = Request::builder()
            .path("/songs/42")
            .param("id", "from-query")
            .param("page", "3")
            .build();
        let response = app.dispatch(request).expect("dispatch");
        assert_eq!(response.text(), "id=42 page=3");
    }

    #[test]
    fn test_should_decode_captured_segments() {
        let app = build_app(|app| {
            app.get("/hello/:name", |cx: &mut Context<'_>| {
                Ok(format!("hello {}", cx.param("name").unwrap_or_default()).into())
            })
        });

        let response = app.dispatch(get("/hello/fo%20o")).expect("dispatch");
        assert_eq!(response.text(), "hello fo o");
    }

    #[test]
    fn test_should_collect_splats_across_the_template() {
        let app = build_app(|app| {
            app.get("/say/*/to/*", |cx: &mut Context<'_>| {
                let splat = cx.param_all("splat").unwrap_or_default();
                Ok(splat.join(" ").into())
            })
        });

        let response = app.dispatch(get("/say/hello/to/world")).expect("dispatch");
        assert_eq!(response.text(), "hello world");
    }

    #[test]
    fn test_should_match_paths_with_doubled_slashes() {
        let app = build_app(|app| {
            app.get("/a/b", |_cx: &mut Context<'_>| Ok("found".into()))
        });

        let response = app.dispatch(get("//a///b")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "found");
    }

    #[test]
    fn test_should_not_match_longer_or_shorter_paths() {
        let app = build_app(|app| {
            app.get("/hello", |_cx: &mut Context<'_>| Ok("hi".into()))
        });

        let extra = app.dispatch(get("/hello/extra")).expect("dispatch");
        assert_eq!(extra.status(), StatusCode::NOT_FOUND);

        let prefix = app.dispatch(get("/hel")).expect("dispatch");
        assert_eq!(prefix.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_should_keep_methods_in_separate_tables() {
        let app = build_app(|app| {
            app.get("/entries", |_cx: &mut Context<'_>| Ok("list".into()))?;
            app.post("/entries", |_cx: &mut Context<'_>| Ok("created".into()))
        });

        let request = Request::builder()
            .method(Method::POST)
            .path("/entries")
            .build();
        let response = app.dispatch(request).expect("dispatch");
        assert_eq!(response.text(), "created");
    }

    #[test]
    fn test_should_fall_through_agent_guard_to_plain_route() {
        let app = build_app(|app| {
            let options = RouteOptions::new().with_agent_str(r"Songbird/([\d.]+)")?;
            app.route_with(Method::GET, "/feed", options, |cx: &mut Context<'_>| {
                let version = cx
                    .param_all("agent")
                    .and_then(|groups| groups.first().cloned())
                    .unwrap_or_default();
                Ok(format!("songbird {version}").into())
            })?;
            app.get("/feed", |_cx: &mut Context<'_>| Ok("generic".into()))
        });

        let songbird = Request::builder()
            .path("/feed")
            .header(header::USER_AGENT, HeaderValue::from_static("Songbird/2.2"))
            .build();
        let response = app.dispatch(songbird).expect("dispatch");
        assert_eq!(response.text(), "songbird 2.2");

        let browser = Request::builder()
            .path("/feed")
            .header(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"))
            .build();
        let response = app.dispatch(browser).expect("dispatch");
        assert_eq!(response.text(), "generic");
    }

    #[test]
    fn test_should_route_by_host_guard_ignoring_the_port() {
        let app = build_app(|app| {
            let options =
                RouteOptions::new().with_host(HostGuard::exact("api.example.com"));
            app.route_with(Method::GET, "/", options, |_cx: &mut Context<'_>| {
                Ok("api".into())
            })?;
            app.get("/", |_cx: &mut Context<'_>| Ok("web".into()))
        });

        let api = Request::builder()
            .path("/")
            .header(header::HOST, HeaderValue::from_static("api.example.com:4567"))
            .build();
        assert_eq!(app.dispatch(api).expect("dispatch").text(), "api");

        let web = Request::builder()
            .path("/")
            .header(header::HOST, HeaderValue::from_static("www.example.com"))
            .build();
        assert_eq!(app.dispatch(web).expect("dispatch").text(), "web");
    }
}
