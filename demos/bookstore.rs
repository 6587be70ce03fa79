//! Bookstore API: placeholder routes, root middleware and query parsing.
//!
//! ```bash
//! curl http://127.0.0.1:8080/textbook/Shakespear
//! curl http://127.0.0.1:8080/user/foo/books/bar
//! curl 'http://127.0.0.1:8080/search?title=hamlet&year=1603'
//! ```

use trellis_web::{query_parser, Router, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut router = Router::new();
    router.use_handler("/", query_parser()).unwrap();

    router
        .get("/", |ctx| {
            ctx.response.status(StatusCode::Ok).body("bookstore index");
        })
        .unwrap();

    router
        .get("/textbook/<author>", |ctx| {
            let author = ctx.param("author").unwrap_or("unknown").to_string();
            ctx.response
                .status(StatusCode::Ok)
                .body(format!("textbooks by {author}"));
        })
        .unwrap();

    router
        .get("/user/<id>/books/<book_id>", |ctx| {
            let id = ctx.param("id").unwrap_or("?").to_string();
            let book = ctx.param("book_id").unwrap_or("?").to_string();
            ctx.response
                .status(StatusCode::Ok)
                .body(format!("user {id}, book {book}"));
        })
        .unwrap();

    router
        .get("/search", |ctx| {
            let title = ctx.query("title").unwrap_or("").to_string();
            let year = ctx.query("year").unwrap_or("").to_string();
            ctx.response
                .status(StatusCode::Ok)
                .body(format!("searching title={title} year={year}"));
        })
        .unwrap();

    Server::builder()
        .listener(Server::bind("127.0.0.1:8080".parse().unwrap()).unwrap())
        .router(router)
        .build()
        .launch()
        .await;
}
