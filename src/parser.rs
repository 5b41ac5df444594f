//! HTML parsing: turns `(html, source_url)` into the fields of a
//! [`ScrapedDocument`].

use indexmap::IndexSet;
use scraper::{Html, Selector};

use crate::lang;
use crate::model::ScrapedDocument;

/// Host and port together: same-host means exact netloc equality (the
/// original crawler keys on `urlparse(url).netloc`, which includes the
/// port). Two origins differing only by port are distinct hosts.
pub fn netloc(url: &reqwest::Url) -> Option<String> {
    let host = url.host_str()?;
    let port = url.port_or_known_default().unwrap_or(0);
    Some(format!("{host}:{port}"))
}

const PUBLISH_DATE_SELECTORS: [(&str, &str); 5] = [
    (r#"meta[property="article:published_time"]"#, "content"),
    (r#"meta[name="pubdate"]"#, "content"),
    (r#"meta[name="publishdate"]"#, "content"),
    (r#"meta[property="og:published_time"]"#, "content"),
    ("time[datetime]", "datetime"),
];

pub fn parse(html: &str, source_url: &str, scraped_at: String) -> ScrapedDocument {
    let document = Html::parse_document(html);
    let title = extract_title(&document);
    let text_content = extract_text_content(&document);
    let publish_date = extract_publish_date(&document);
    let language = extract_language(&document, &text_content);
    let (links_found, links_count) = extract_links(&document, source_url);

    ScrapedDocument {
        url: source_url.to_string(),
        title,
        text_content,
        publish_date,
        language,
        links_found,
        links_count,
        scraped_at,
    }
}

fn extract_title(document: &Html) -> String {
    let selector = Selector::parse("title").expect("static selector");
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "No Title".to_string())
}

fn extract_text_content(document: &Html) -> String {
    let selector = Selector::parse("p").expect("static selector");
    let paragraphs: Vec<String> = document
        .select(&selector)
        .take(10)
        .map(|el| el.text().collect::<Vec<_>>().join("").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    paragraphs.join(" ").chars().take(500).collect()
}

fn extract_publish_date(document: &Html) -> Option<String> {
    for (selector_str, attr) in PUBLISH_DATE_SELECTORS {
        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Some(element) = document.select(&selector).next() {
            if let Some(value) = element.value().attr(attr) {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn extract_language(document: &Html, text_content: &str) -> String {
    if let Ok(selector) = Selector::parse("html") {
        if let Some(element) = document.select(&selector).next() {
            if let Some(value) = element.value().attr("lang") {
                if !value.is_empty() {
                    return value.to_string();
                }
            }
        }
    }
    if text_content.chars().count() > 50 {
        return lang::detect_language(text_content);
    }
    "unknown".to_string()
}

fn extract_links(document: &Html, source_url: &str) -> (Vec<String>, usize) {
    let base = match reqwest::Url::parse(source_url) {
        Ok(url) => url,
        Err(_) => return (Vec::new(), 0),
    };
    let base_netloc = netloc(&base);
    let selector = Selector::parse("a[href]").expect("static selector");

    let mut seen = IndexSet::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else { continue };
        let Ok(mut resolved) = base.join(href) else { continue };
        resolved.set_fragment(None);
        resolved.set_query(None);
        if netloc(&resolved) == base_netloc {
            seen.insert(resolved.to_string());
        }
    }
    let links: Vec<String> = seen.into_iter().collect();
    let count = links.len();
    (links, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html lang="pt">
        <head>
            <title>  Minha Página  </title>
            <meta property="article:published_time" content="2024-01-02T10:00:00Z">
        </head>
        <body>
            <p>Primeiro parágrafo.</p>
            <p>Segundo parágrafo.</p>
            <a href="/outra-pagina">link interno</a>
            <a href="https://outro-dominio.example/x">link externo</a>
            <a href="/outra-pagina?x=1#frag">link interno com query</a>
        </body>
        </html>
    "#;

    #[test]
    fn parses_title_text_date_language_and_links() {
        let doc = parse(PAGE, "https://meusite.example/inicio", "2024-01-02T10:00:00".to_string());
        assert_eq!(doc.title, "Minha Página");
        assert!(doc.text_content.contains("Primeiro parágrafo"));
        assert_eq!(doc.publish_date.as_deref(), Some("2024-01-02T10:00:00Z"));
        assert_eq!(doc.language, "pt");
        assert_eq!(doc.links_found, vec!["https://meusite.example/outra-pagina".to_string()]);
        assert_eq!(doc.links_count, 1);
    }

    #[test]
    fn links_differing_only_by_port_are_not_same_host() {
        let page = r#"<html><body>
            <a href="https://meusite.example:9090/outra-pagina">outra porta</a>
            <a href="/mesma-porta">mesma porta</a>
        </body></html>"#;
        let doc = parse(page, "https://meusite.example:8080/inicio", "t".to_string());
        assert_eq!(doc.links_found, vec!["https://meusite.example:8080/mesma-porta".to_string()]);
    }

    #[test]
    fn missing_title_falls_back() {
        let doc = parse("<html><body><p>x</p></body></html>", "https://a.example", "t".to_string());
        assert_eq!(doc.title, "No Title");
    }
}
