//! RSS 2.0 feed of public posts.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use quire_core::{AppConfig, ContentSnapshot, Post};
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::state::SharedState;

const FEED_ITEMS: usize = 20;
const CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

pub async fn rss(State(state): State<SharedState>) -> impl IntoResponse {
    let channel = build_channel(&state.config, &state.cache.read());
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], channel.to_string())
}

fn build_channel(config: &AppConfig, snapshot: &ContentSnapshot) -> Channel {
    let base_url = config.base_url();
    let items: Vec<Item> = snapshot.public_posts().take(FEED_ITEMS).map(|post| item(base_url, post)).collect();

    ChannelBuilder::default()
        .title(&config.site_title)
        .link(base_url)
        .description(&config.site_description)
        .generator("quire".to_string())
        .items(items)
        .build()
}

fn item(base_url: &str, post: &Post) -> Item {
    let link = format!("{base_url}/posts/{}", post.slug);
    let pub_date = post.date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().to_rfc2822());

    ItemBuilder::default()
        .title(post.title.clone())
        .link(Some(link.clone()))
        .guid(GuidBuilder::default().permalink(true).value(link).build())
        .description(post.description.clone())
        .pub_date(pub_date)
        .categories(post.tags.iter().map(|t| rss::Category { name: t.clone(), domain: None }).collect::<Vec<_>>())
        .build()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use quire_core::{AppConfig, ContentSnapshot, Post, PostStatus};

    use super::*;
    use crate::reload::testing::post;
    use crate::routes::testing::TestApp;

    fn snapshot() -> ContentSnapshot {
        ContentSnapshot::new(
            vec![
                Post { tags: vec!["rust".into()], ..post("hello") },
                Post { status: PostStatus::Draft, ..post("draft") },
                Post { private: true, ..post("journal") },
            ],
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_channel_has_only_public_posts() {
        let config = AppConfig { base_url: "https://blog.example.com/".into(), ..AppConfig::default() };
        let channel = build_channel(&config, &snapshot());
        assert_eq!(channel.link(), "https://blog.example.com");
        assert_eq!(channel.items().len(), 1);

        let item = &channel.items()[0];
        assert_eq!(item.link(), Some("https://blog.example.com/posts/hello"));
        assert_eq!(item.categories()[0].name(), "rust");
        assert!(item.pub_date().is_some_and(|d| d.ends_with("+0000")));
    }

    #[tokio::test]
    async fn test_feed_route_serves_xml() {
        let app = TestApp::new(AppConfig::default(), snapshot()).await;
        let request = axum::http::Request::get("/rss.xml").body(axum::body::Body::empty()).unwrap();
        let (status, headers, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], CONTENT_TYPE);
        let xml = String::from_utf8(body.to_vec()).unwrap();
        assert!(xml.contains("<rss"));
        assert!(xml.contains("/posts/hello"));
        assert!(!xml.contains("/posts/draft"));
    }
}
