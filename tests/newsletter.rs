use triage::handler::HeaderValue;
use triage::newsletter::{generate_unique_url, parse_author, parse_unsubscribe};
use triage::{Headers, NewsletterInput, default_registry, get_newsletter_handler, handle_newsletter};

const SUBSTACK_HTML: &str = r#"<html><body><div class="email-body-container">
    <h1><a href="https://jacksonh.substack.com/p/the-first-issue">The first issue</a></h1>
    <p>Welcome to the newsletter.</p>
    </div></body></html>"#;

fn substack_email() -> NewsletterInput {
    NewsletterInput {
        from: "Jackson Harper from Omnivore App <jacksonh@substack.com>".into(),
        to: "reader@inbox.test".into(),
        subject: "The first issue".into(),
        html: SUBSTACK_HTML.into(),
        headers: Headers::new()
            .with("List-Post", "<https://jacksonh.substack.com/p/the-first-issue>")
            .with(
                "List-Unsubscribe",
                "<https://jacksonh.substack.com/unsub?t=1>, <mailto:unsub@substack.com>",
            ),
    }
}

#[tokio::test]
async fn substack_newsletter_round_trip() {
    let result = handle_newsletter(default_registry(), &substack_email())
        .await
        .unwrap()
        .expect("substack email is a newsletter");

    assert_eq!(result.email, "reader@inbox.test");
    assert_eq!(result.title, "The first issue");
    assert_eq!(result.author, "Jackson Harper from Omnivore App");
    assert_eq!(result.url, "https://jacksonh.substack.com/p/the-first-issue");
    assert_eq!(result.content, SUBSTACK_HTML);
    assert_eq!(result.unsub_mail_to, "unsub@substack.com");
    assert_eq!(result.unsub_http_url, "https://jacksonh.substack.com/unsub?t=1");
}

#[tokio::test]
async fn result_serializes_with_camel_case_fields() {
    let result = handle_newsletter(default_registry(), &substack_email())
        .await
        .unwrap()
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["unsubMailTo"], "unsub@substack.com");
    assert!(json.get("unsub_mail_to").is_none());
}

#[tokio::test]
async fn classification_follows_registry_order() {
    let registry = default_registry();

    let substack = get_newsletter_handler(registry, &substack_email()).await.unwrap();
    assert_eq!(substack.name(), "substack");

    let axios = NewsletterInput {
        from: "Mike Allen <mike@axios.com>".into(),
        to: "reader@inbox.test".into(),
        subject: "Axios AM".into(),
        html: "<p>Good morning</p>".into(),
        headers: Headers::new().with("List-Unsubscribe", "<mailto:u@axios.com>"),
    };
    assert_eq!(get_newsletter_handler(registry, &axios).await.unwrap().name(), "axios");

    let mut list_mail = axios.clone();
    list_mail.from = "Someone <someone@lists.test>".into();
    assert_eq!(
        get_newsletter_handler(registry, &list_mail).await.unwrap().name(),
        "generic"
    );
}

#[tokio::test]
async fn personal_email_is_not_a_newsletter() {
    let input = NewsletterInput {
        from: "Friend <friend@mail.test>".into(),
        to: "reader@inbox.test".into(),
        subject: "Lunch?".into(),
        html: "<p>Free on Friday?</p>".into(),
        headers: Headers::new(),
    };
    assert!(get_newsletter_handler(default_registry(), &input).await.is_none());
    assert_eq!(handle_newsletter(default_registry(), &input).await.unwrap(), None);
}

#[tokio::test]
async fn private_read_online_link_is_replaced() {
    let input = NewsletterInput {
        from: "Writer <writer@list.test>".into(),
        to: "reader@inbox.test".into(),
        subject: "Issue 3".into(),
        html: r#"<a href="http://192.168.1.20/p/3">View this email in your browser</a>"#.into(),
        headers: Headers::new().with("List-Unsubscribe", "<mailto:u@list.test>"),
    };

    let result = handle_newsletter(default_registry(), &input)
        .await
        .unwrap()
        .unwrap();
    assert!(
        result.url.starts_with("https://triage.example.com/no_url?q="),
        "{}",
        result.url
    );
    assert_eq!(result.unsub_http_url, "");
}

#[tokio::test]
async fn incomplete_newsletter_is_an_execution_error() {
    let mut input = substack_email();
    input.to = String::new();

    let err = handle_newsletter(default_registry(), &input).await.unwrap_err();
    assert_eq!(err.handler(), "substack");
    assert!(err.to_string().contains("missing to"));
}

#[test]
fn header_helpers_from_json_input() {
    let input: NewsletterInput = serde_json::from_str(
        r#"{
            "from": "\"Allen, Mike\" <mike@axios.com>",
            "html": "<p>x</p>",
            "headers": {"List-Unsubscribe": ["<mailto:a@axios.com>", "<https://axios.com/u>"]}
        }"#,
    )
    .unwrap();

    assert_eq!(parse_author(&input.from), "Allen, Mike");
    let unsubscribe = parse_unsubscribe(&input.headers.get("list-unsubscribe").unwrap());
    assert_eq!(unsubscribe.mail_to.as_deref(), Some("a@axios.com"));
    assert_eq!(unsubscribe.http_url.as_deref(), Some("https://axios.com/u"));
    assert_eq!(input.to, "");

    let mut headers = Headers::new();
    headers.insert("X-Test", HeaderValue::One("1".into()));
    assert!(headers.has("x-test"));
}

#[test]
fn unique_urls_for_many_issues() {
    let urls: std::collections::HashSet<_> = (0..500)
        .map(|_| generate_unique_url("https://triage.example.com/no_url"))
        .collect();
    assert_eq!(urls.len(), 500);
}
