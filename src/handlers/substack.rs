//! Substack: web posts and newsletter emails.

use anyhow::Result;
use async_trait::async_trait;
use scraper::Selector;

use super::{host_matches, og_url};
use crate::dom::Document;
use crate::handler::{Handler, Headers, NewsletterClassifier, NewsletterInput, PreParser};
use crate::newsletter::{angle_token, find_newsletter_url};

const SUBSTACK_HOSTS: &[&str] = &["substack.com"];

// Email chrome inside the post body: header, author card, like/share bar,
// subscribe prompts and footer.
const EMAIL_CHROME: &[&str] = &[
    ".email-body-container .header",
    ".email-body-container .preamble",
    ".email-body-container .meta-author-wrap",
    ".email-body-container .post-meta",
    ".email-body-container .post-cta",
    ".email-body-container .container-border",
    ".email-body-container .footer",
];

pub struct SubstackHandler;

#[async_trait]
impl PreParser for SubstackHandler {
    async fn should_pre_parse(&self, url: &str, dom: &Document) -> Result<bool> {
        // custom domains still declare their substack address in og:url
        Ok(host_matches(url, SUBSTACK_HOSTS)
            || og_url(dom).is_some_and(|og| host_matches(&og, SUBSTACK_HOSTS)))
    }

    async fn pre_parse(&self, _url: &str, dom: Document) -> Result<Document> {
        dom.remove(EMAIL_CHROME)
    }
}

#[async_trait]
impl NewsletterClassifier for SubstackHandler {
    async fn is_newsletter(&self, input: &NewsletterInput) -> Result<bool> {
        if input
            .headers
            .get("list-post")
            .is_some_and(|post| post.contains("substack.com"))
        {
            return Ok(true);
        }
        Ok(has_substack_markup(&Document::parse(input.html.as_str())))
    }

    async fn parse_newsletter_url(&self, headers: &Headers, html: &str) -> Result<Option<String>> {
        if let Some(post) = headers.get("list-post").as_deref().and_then(angle_token) {
            return Ok(Some(post));
        }
        match self.find_newsletter_header_href(&Document::parse(html)) {
            Some(href) => Ok(find_newsletter_url(&href).await),
            None => Ok(None),
        }
    }

    fn find_newsletter_header_href(&self, dom: &Document) -> Option<String> {
        dom.select_attr("h1 a", "href")
    }
}

/// Substack email layout: a post-meta table, or a linked headline next to
/// the like/recommend buttons.
fn has_substack_markup(dom: &Document) -> bool {
    let (Ok(post_meta), Ok(headline), Ok(icons)) = (
        Selector::parse("table[class$=post-meta]"),
        Selector::parse("h1 a"),
        Selector::parse(
            r#"table tbody td span a img[src*="HeartIcon"], table tbody td span a img[src*="RecommendIconRounded"]"#,
        ),
    ) else {
        return false;
    };

    dom.with_tree(|tree| {
        tree.select(&post_meta).next().is_some()
            || (tree.select(&headline).next().is_some() && tree.select(&icons).next().is_some())
    })
}

pub fn handler() -> Handler {
    Handler::new("substack")
        .with_pre_parser(SubstackHandler)
        .with_newsletter(SubstackHandler)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMAIL: &str = r#"<html><body><div class="email-body-container">
        <div class="header">Writer's newsletter</div>
        <div class="post-meta">Like Share</div>
        <div class="body markup"><h1><a href="https://writer.substack.com/p/issue">Issue</a></h1><p>Content</p></div>
        <div class="footer">Unsubscribe</div>
        </div></body></html>"#;

    fn input(html: &str, headers: Headers) -> NewsletterInput {
        NewsletterInput {
            from: "Writer <writer@substack.com>".into(),
            to: "me@reader.test".into(),
            subject: "Issue".into(),
            html: html.into(),
            headers,
        }
    }

    #[tokio::test]
    async fn matches_substack_hosts_and_og_url() {
        let dom = Document::parse("<p>x</p>");
        assert!(SubstackHandler.should_pre_parse("https://writer.substack.com/p/a", &dom).await.unwrap());
        assert!(!SubstackHandler.should_pre_parse("https://writer.test/p/a", &dom).await.unwrap());

        let custom = Document::parse(
            r#"<head><meta property="og:url" content="https://writer.substack.com/p/a"></head>"#,
        );
        assert!(SubstackHandler.should_pre_parse("https://writer.test/p/a", &custom).await.unwrap());
    }

    #[tokio::test]
    async fn strips_email_chrome_idempotently() {
        let once = SubstackHandler
            .pre_parse("https://writer.substack.com/p/issue", Document::parse(EMAIL))
            .await
            .unwrap();
        assert!(!once.exists(".header"));
        assert!(!once.exists(".footer"));
        assert!(!once.exists(".post-meta"));
        assert_eq!(once.select_text(".body p").as_deref(), Some("Content"));

        let twice = SubstackHandler
            .pre_parse("https://writer.substack.com/p/issue", once.clone())
            .await
            .unwrap();
        assert_eq!(twice.select_text("body"), once.select_text("body"));
    }

    #[tokio::test]
    async fn classifies_by_list_post_or_markup() {
        let by_header = input(
            "<p>plain</p>",
            Headers::new().with("List-Post", "<https://writer.substack.com/p/issue>"),
        );
        assert!(SubstackHandler.is_newsletter(&by_header).await.unwrap());

        let by_markup = input(
            r#"<table class="email-post-meta"><tr><td>meta</td></tr></table>"#,
            Headers::new(),
        );
        assert!(SubstackHandler.is_newsletter(&by_markup).await.unwrap());

        let icons = input(
            r##"<h1><a href="https://writer.substack.com/p/issue">Issue</a></h1>
               <table><tbody><tr><td><span><a href="#"><img src="https://cdn.substack.com/HeartIcon.png"></a></span></td></tr></tbody></table>"##,
            Headers::new(),
        );
        assert!(SubstackHandler.is_newsletter(&icons).await.unwrap());

        let other = input("<h1><a href='https://a.test'>Hi</a></h1>", Headers::new());
        assert!(!SubstackHandler.is_newsletter(&other).await.unwrap());
    }

    #[tokio::test]
    async fn url_from_list_post_header() {
        let headers = Headers::new().with("list-post", "<https://writer.substack.com/p/issue>");
        let url = SubstackHandler
            .parse_newsletter_url(&headers, EMAIL)
            .await
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://writer.substack.com/p/issue"));
    }

    #[test]
    fn header_href_is_headline_link() {
        assert_eq!(
            SubstackHandler
                .find_newsletter_header_href(&Document::parse(EMAIL))
                .as_deref(),
            Some("https://writer.substack.com/p/issue")
        );
    }
}
