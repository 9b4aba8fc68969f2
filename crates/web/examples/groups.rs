use http::header::AUTHORIZATION;
use http::{Request, StatusCode};
use lightmux::{Json, Next, ReqBody, RouteGroup, Router, Server, handler_fn, middleware_fn, named};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Serialize)]
struct User {
    id: u32,
    name: &'static str,
}

async fn list_users(_req: Request<ReqBody>) -> Json<Vec<User>> {
    Json(vec![User { id: 1, name: "alice" }, User { id: 2, name: "bob" }])
}

async fn create_user(_req: Request<ReqBody>) -> (StatusCode, &'static str) {
    (StatusCode::CREATED, "created")
}

async fn status(_req: Request<ReqBody>) -> &'static str {
    "ok"
}

// curl -v http://127.0.0.1:3000/api/status
// curl -v http://127.0.0.1:3000/api/admin/users
// curl -v -H 'Authorization: Bearer demo' http://127.0.0.1:3000/api/admin/users
// curl -v -X DELETE -H 'Authorization: Bearer demo' http://127.0.0.1:3000/api/admin/users
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let access_log = middleware_fn(|req: Request<ReqBody>, next: Next| async move {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let response = next.run(req).await;
        info!(%method, path = %path, status = response.status().as_u16(), elapsed = ?start.elapsed(), "request");
        response
    });

    let auth = middleware_fn(|req: Request<ReqBody>, next: Next| async move {
        if req.headers().contains_key(AUTHORIZATION) {
            Ok(next.run(req).await)
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    });

    let mut router = Router::new();
    router.use_global([named("access_log", access_log)])?;

    let api = RouteGroup::new("/api", []);
    api.route(&mut router, "/status", [])?.get(handler_fn(status))?;

    let admin = api.extend("/admin", [named("auth", auth)]);
    admin.route(&mut router, "/users", [])?.get(handler_fn(list_users))?.post(handler_fn(create_user))?;

    print!("{}", router.routes_report());

    Server::builder()
        .router(router)
        .address("127.0.0.1:3000")
        .grace_period(Duration::from_secs(10))
        .build()?
        .run()
        .await?;
    Ok(())
}
