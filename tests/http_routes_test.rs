// ==========================================
// HTTP 路由集成测试
// ==========================================
// 在随机端口启动 axum 服务，用原始 HTTP/1.1 请求验证状态码与 JSON
// ==========================================

mod test_helpers;

use sales_stock_vista::app::create_router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use test_helpers::*;

async fn start_server(sources: &TestSources) -> SocketAddr {
    let state = Arc::new(sources.state(test_config()).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    addr
}

/// 发送请求，返回 (状态码, 响应体)
async fn request(addr: SocketAddr, method: &str, path: &str) -> (u16, serde_json::Value) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        method, path, addr
    );
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();

    let status: u16 = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = text.split("\r\n\r\n").nth(1).unwrap_or("");
    let json = serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_query_endpoints() {
    let sources = standard_sources().unwrap();
    let addr = start_server(&sources).await;

    let (status, body) = request(addr, "GET", "/api/metrics").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_products"], 3);
    assert_eq!(body["top_product"], "Pocket Bullet");

    let (status, body) = request(addr, "GET", "/api/restock-alerts?limit=5").await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));
    assert_eq!(body[0]["product_id"], "P-1");

    let (status, body) = request(addr, "GET", "/api/top-products?limit=2&source=pos").await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(|a| a.len()), Some(2));

    let (status, body) = request(addr, "GET", "/api/category-summary").await;
    assert_eq!(status, 200);
    assert!(body.get("Vibrators").is_some());

    let (status, body) = request(addr, "GET", "/api/warehouse-summary").await;
    assert_eq!(status, 200);
    assert_eq!(body["products_needing_restock"], 1);

    let (status, body) = request(addr, "GET", "/api/restock-worklist").await;
    assert_eq!(status, 200);
    assert_eq!(body["excluded_products"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_and_cache_status() {
    let sources = standard_sources().unwrap();
    let addr = start_server(&sources).await;

    let (status, body) = request(addr, "POST", "/api/refresh-cache").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "success");
    assert_eq!(body["refreshed"], 5);

    let (status, body) = request(addr, "GET", "/api/cache-status").await;
    assert_eq!(status, 200);
    assert_eq!(body["ttl_secs"], 300);
    assert_eq!(body["entries"].as_array().map(|a| a.len()), Some(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_input_is_bad_request() {
    let sources = standard_sources().unwrap();
    let addr = start_server(&sources).await;

    let (status, body) = request(addr, "GET", "/api/restock-alerts?limit=0").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("limit"));

    let (status, _) = request(addr, "GET", "/api/top-products?source=warehouse").await;
    assert_eq!(status, 400);

    let (status, _) = request(addr, "GET", "/health").await;
    assert_eq!(status, 200);
}
