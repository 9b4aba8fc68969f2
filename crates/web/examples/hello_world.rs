use http::Request;
use lightmux::{ReqBody, Router, Server, handler_fn};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

async fn hello_world(_req: Request<ReqBody>) -> &'static str {
    "Hello, world!"
}

// curl -v http://127.0.0.1:3000/hello
// curl -v -X POST http://127.0.0.1:3000/hello
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut router = Router::new();
    router.route("/hello", [])?.get(handler_fn(hello_world))?;
    router.log_routes();

    Server::builder().router(router).address("127.0.0.1:3000").build()?.run().await?;
    Ok(())
}
