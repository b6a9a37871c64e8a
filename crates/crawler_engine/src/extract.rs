use once_cell::sync::Lazy;
use regex::Regex;

// The listing and comment pages are matched against one fixed markup
// shape. The patterns silently yield nothing if the site's markup
// changes; callers treat an empty result as "nothing found".
static STORY_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"id='(\d+)'>[\s\S]*?<a href="(.*?)" class="storylink">"#)
        .expect("valid story pattern")
});

static COMMENT_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span class="commtext c00">([\s\S]*?)</span>"#).expect("valid comment pattern")
});

static COMMENT_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<a href="(.*?)""#).expect("valid href pattern"));

/// One entry of the front-page listing: the discussion thread id and the
/// story's target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub thread_id: String,
    pub url: String,
}

/// Extracts every story block from the front-page listing, in document
/// order. Duplicate thread ids are kept; deduplication belongs to the
/// caller.
pub fn extract_top_stories(listing_html: &str) -> Vec<Story> {
    STORY_BLOCK
        .captures_iter(listing_html)
        .map(|caps| Story {
            thread_id: caps[1].to_string(),
            url: caps[2].to_string(),
        })
        .collect()
}

/// Lazily yields every hyperlink target found inside top-level comment
/// bodies, HTML-entity-unescaped. Single pass; consume once.
pub fn extract_comment_links(comment_html: &str) -> impl Iterator<Item = String> + '_ {
    COMMENT_BODY.captures_iter(comment_html).flat_map(|comment| {
        let body = comment.get(1).map_or("", |m| m.as_str());
        COMMENT_HREF.captures_iter(body).filter_map(|link| {
            link.get(1)
                .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
        })
    })
}
