//! Error chain integration tests.
//!
//! Default and development error pages, application-registered recovery
//! handlers, and the `raise_errors` escape hatch.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use http::{Method, StatusCode};
    use serenade_core::{Context, Fault, FaultKind, Request};

    use crate::{build_app, build_app_with, dev_config, test_config};

    fn get(path: &str) -> Request {
        Request::builder().path(path).build()
    }

    #[test]
    fn test_should_serve_the_plain_not_found_page_outside_development() {
        let app = build_app(|_app| Ok(()));

        let response = app.dispatch(get("/missing")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "<h1>Not Found</h1>");
    }

    #[test]
    fn test_should_serve_the_styled_not_found_page_in_development() {
        let app = build_app_with(dev_config(), |_app| Ok(()));

        let request = Request::builder()
            .method(Method::DELETE)
            .path("/missing")
            .build();
        let response = app.dispatch(request).expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.text();
        assert!(body.contains("Serenade doesn't know this tune."));
        // The hint names the effective verb and path of the request.
        assert!(body.contains("app.delete(\"/missing\""));
    }

    #[test]
    fn test_should_serve_the_styled_error_page_in_development() {
        let app = build_app_with(dev_config(), |app| {
            app.get("/boom", |_cx: &mut Context<'_>| {
                Err(Fault::server_error("kaboom").into())
            })
        });

        let response = app.dispatch(get("/boom")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.text();
        assert!(body.contains("<title>Serenade error</title>"));
        assert!(body.contains("ServerError - kaboom"));
    }

    #[test]
    fn test_should_recover_through_the_matching_error_handler() {
        let app = build_app(|app| {
            app.error_with_status(
                FaultKind::Custom("OutOfTune"),
                StatusCode::IM_A_TEAPOT,
                |cx: &mut Context<'_>| {
                    let message = cx
                        .request()
                        .fault()
                        .map(|fault| fault.message().to_owned())
                        .unwrap_or_default();
                    Ok(format!("caught: {message}").into())
                },
            );
            app.get("/boom", |_cx: &mut Context<'_>| {
                Err(Fault::custom("OutOfTune", "sharp note").into())
            })
        });

        let response = app.dispatch(get("/boom")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.text(), "caught: sharp note");
    }

    #[test]
    fn test_should_let_later_error_registrations_override_earlier_ones() {
        let app = build_app(|app| {
            app.not_found(|_cx: &mut Context<'_>| Ok("first page".into()));
            app.not_found(|_cx: &mut Context<'_>| Ok("second page".into()));
            Ok(())
        });

        let response = app.dispatch(get("/missing")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "second page");
    }

    #[test]
    fn test_should_expose_the_request_to_not_found_handlers() {
        let app = build_app(|app| {
            app.not_found(|cx: &mut Context<'_>| {
                Ok(format!("no such tune: {}", cx.request().path()).into())
            });
            Ok(())
        });

        let response = app.dispatch(get("/ghost")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "no such tune: /ghost");
    }

    #[test]
    fn test_should_rethrow_faults_when_raise_errors_is_set() {
        let mut config = test_config();
        config.raise_errors = true;
        let app = build_app_with(config, |app| {
            app.get("/boom", |_cx: &mut Context<'_>| {
                Err(Fault::custom("OutOfTune", "sharp note").into())
            })
        });

        let fault = app.dispatch(get("/boom")).expect_err("fault should surface");
        assert_eq!(fault.kind(), FaultKind::Custom("OutOfTune"));
        assert_eq!(fault.message(), "sharp note");
    }

    #[test]
    fn test_should_recover_faults_raised_by_filters() {
        let route_runs = Arc::new(AtomicUsize::new(0));
        let in_handler = Arc::clone(&route_runs);

        let app = build_app(|app| {
            app.before(|_cx: &mut Context<'_>| {
                Err(Fault::custom("GateClosed", "no entry").into())
            });
            app.error(FaultKind::Custom("GateClosed"), |_cx: &mut Context<'_>| {
                Ok("the gate is closed".into())
            });
            app.get("/hall", move |_cx: &mut Context<'_>| {
                in_handler.fetch_add(1, Ordering::SeqCst);
                Ok("inside".into())
            })
        });

        let response = app.dispatch(get("/hall")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "the gate is closed");
        assert_eq!(route_runs.load(Ordering::SeqCst), 0, "route handler must not run");
    }
}
