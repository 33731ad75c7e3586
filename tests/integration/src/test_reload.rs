//! Reload-between-requests integration tests.
//!
//! The definition function here reads shared state the test mutates
//! between dispatches, standing in for an edited source file.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use http::StatusCode;
    use serenade_core::{App, AppConfig, Context, Reloader, Request};

    use crate::test_config;

    fn get(path: &str) -> Request {
        Request::builder().path(path).build()
    }

    /// A reloader whose definition grows a `/bonus` route once `flag` is
    /// set.
    fn reloader_with_flag(config: AppConfig, flag: &Arc<AtomicBool>) -> Reloader {
        let flag = Arc::clone(flag);
        Reloader::new(config, move |app: &mut App| {
            app.get("/base", |_cx: &mut Context<'_>| Ok("base".into()))?;
            if flag.load(Ordering::SeqCst) {
                app.get("/bonus", |_cx: &mut Context<'_>| Ok("bonus".into()))?;
            }
            Ok(())
        })
        .expect("definition should succeed")
    }

    #[test]
    fn test_should_pick_up_definition_changes_on_the_next_request() {
        let flag = Arc::new(AtomicBool::new(false));
        let config = AppConfig {
            reload: Some(true),
            ..test_config()
        };
        let reloader = reloader_with_flag(config, &flag);

        let response = reloader.dispatch(get("/bonus")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        flag.store(true, Ordering::SeqCst);

        let response = reloader.dispatch(get("/bonus")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "bonus");
    }

    #[test]
    fn test_should_keep_the_first_build_when_reload_is_off() {
        let flag = Arc::new(AtomicBool::new(false));
        let reloader = reloader_with_flag(test_config(), &flag);

        flag.store(true, Ordering::SeqCst);

        let response = reloader.dispatch(get("/bonus")).expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = reloader.dispatch(get("/base")).expect("dispatch");
        assert_eq!(response.text(), "base");
    }

    #[test]
    fn test_should_rebuild_only_at_dispatch_time() {
        let flag = Arc::new(AtomicBool::new(false));
        let config = AppConfig {
            reload: Some(true),
            ..test_config()
        };
        let reloader = reloader_with_flag(config, &flag);

        assert_eq!(reloader.with_app(|app| app.router().len()), 1);

        // Flipping the flag alone changes nothing until a request arrives.
        flag.store(true, Ordering::SeqCst);
        assert_eq!(reloader.with_app(|app| app.router().len()), 1);

        reloader.dispatch(get("/base")).expect("dispatch");
        assert_eq!(reloader.with_app(|app| app.router().len()), 2);
    }
}
