use trellis_web::{Router, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut router = Router::new();
    router
        .get("/", |ctx| {
            ctx.response
                .status(StatusCode::Ok)
                .header("content-type", "text/plain")
                .body("Hello, routes!");
        })
        .unwrap();
    router
        .get("/hi", |ctx| {
            ctx.response.status(StatusCode::Ok).body("hi there");
        })
        .unwrap();

    Server::builder()
        .listener(Server::bind("127.0.0.1:8080".parse().unwrap()).unwrap())
        .router(router)
        .build()
        .launch()
        .await;
}
