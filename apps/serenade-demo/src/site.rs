//! The demo site definition.
//!
//! [`define`] is the function the reloader replays before each request in
//! development, so edits here show up without a restart. Everything the
//! demo serves is registered from this one place.

use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};

use serenade_core::{
    Action, App, Context, Env, EtagStrength, Fault, FaultKind, Interrupt, Outcome, RouteOptions,
    SetupResult, escape_html,
};

/// Register the demo's filters, routes, templates, and error handlers.
///
/// # Errors
///
/// Fails when a route template or guard pattern does not compile.
pub fn define(app: &mut App) -> SetupResult<()> {
    app.before(|cx: &mut Context<'_>| {
        cx.set_header(
            HeaderName::from_static("x-served-with"),
            HeaderValue::from_static("serenade-demo"),
        );
        Ok(())
    });

    app.template("index", || {
        concat!(
            "<h1>Serenade</h1>\n",
            "<p>a small tune for the web</p>\n",
            "<ul>\n",
            "  <li>GET /hello/:name</li>\n",
            "  <li>GET /say/*/to/*</li>\n",
            "  <li>GET /greeting (curl gets plain text)</li>\n",
            "  <li>GET /fresh (conditional GET)</li>\n",
            "  <li>POST /guestbook (form: name)</li>\n",
            "</ul>\n"
        )
        .to_owned()
    });

    app.get("/", |cx: &mut Context<'_>| {
        cx.content_type(&mime::TEXT_HTML);
        Ok(Outcome::Action(Action::template("index")))
    })?;

    app.get("/hello/:name", |cx: &mut Context<'_>| {
        let name = cx.param("name").unwrap_or_else(|| "stranger".to_owned());
        Ok(Outcome::text(format!("hello, {name}")))
    })?;

    app.get("/say/*/to/*", |cx: &mut Context<'_>| {
        let words = cx.param_all("splat").unwrap_or_default();
        Ok(Outcome::text(words.join(" ")))
    })?;

    app.get("/old", |cx: &mut Context<'_>| Err(cx.redirect("/")))?;

    // Shadowing pair: the agent-guarded route wins for curl user agents
    // because it is registered first.
    let curl = RouteOptions::new().with_agent_str(r"curl/([\d.]+)")?;
    app.route_with(Method::GET, "/greeting", curl, |cx: &mut Context<'_>| {
        let version = cx
            .param_all("agent")
            .and_then(|captures| captures.first().cloned())
            .unwrap_or_default();
        cx.content_type(&mime::TEXT_PLAIN);
        Ok(Outcome::text(format!("hello, curl {version}")))
    })?;
    app.get("/greeting", |_cx: &mut Context<'_>| {
        Ok(Outcome::text("<h1>hello, browser</h1>"))
    })?;

    app.get("/fresh", |cx: &mut Context<'_>| {
        cx.etag("v1", EtagStrength::Strong)?;
        Ok(Outcome::text("cache me if you can"))
    })?;

    app.post("/guestbook", |cx: &mut Context<'_>| {
        match cx.param("name") {
            Some(name) => Ok(Outcome::text(format!(
                "thanks for signing, {}",
                escape_html(&name)
            ))),
            None => Err(Interrupt::halt((StatusCode::BAD_REQUEST, "a name is required"))),
        }
    })?;

    // Reachable from a plain form via the _method tunnel.
    app.delete("/guestbook/:name", |cx: &mut Context<'_>| {
        let name = cx.param("name").unwrap_or_default();
        Ok(Outcome::text(format!("{} crossed out", escape_html(&name))))
    })?;

    app.get("/coffee", |_cx: &mut Context<'_>| {
        Err(Interrupt::halt((
            StatusCode::IM_A_TEAPOT,
            "no coffee here, only tea",
        )))
    })?;

    app.get("/broken", |_cx: &mut Context<'_>| {
        Err(Fault::custom("DemoBroken", "the demo broke on purpose").into())
    })?;
    app.error(FaultKind::Custom("DemoBroken"), |cx: &mut Context<'_>| {
        let message = cx
            .request()
            .fault()
            .map(|fault| fault.message().to_owned())
            .unwrap_or_default();
        Ok(Outcome::text(format!(
            "<h1>well, that happened</h1><p>{}</p>",
            escape_html(&message)
        )))
    });

    app.configure(&[Env::Development], |app| {
        app.get("/config", |cx: &mut Context<'_>| {
            let summary = escape_html(&format!("{:#?}", cx.app().config()));
            Ok(Outcome::text(format!("<pre>{summary}</pre>")))
        })
    })?;

    Ok(())
}
