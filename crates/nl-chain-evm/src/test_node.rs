//! Throwaway HTTP servers standing in for a JSON-RPC node or a metadata host.

use axum::{Json, Router, routing::post};
use serde_json::{Value, json};
use std::sync::Arc;

pub(crate) enum NodeReply {
    Result(Value),
    Error(i64, &'static str),
}

pub(crate) async fn spawn<F>(handler: F) -> anyhow::Result<String>
where
    F: Fn(&str, &Value) -> NodeReply + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let app = Router::new().route(
        "/",
        post(move |Json(request): Json<Value>| {
            let handler = handler.clone();
            async move {
                let method = request["method"].as_str().unwrap_or_default().to_owned();
                let id = request["id"].clone();
                let body = match handler(&method, &request["params"]) {
                    NodeReply::Result(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                    NodeReply::Error(code, message) => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": code, "message": message },
                    }),
                };
                Json(body)
            }
        }),
    );
    serve(app).await
}

pub(crate) async fn serve(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}
