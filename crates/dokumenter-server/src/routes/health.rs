pub async fn live() -> &'static str {
    "live"
}

pub async fn ready() -> &'static str {
    "ready"
}
