use std::sync::OnceLock;

use deckflow_core::sample::SampleRecord;
use deckflow_core::template;
use regex::{Captures, Regex};

use super::toggle::{ensure_toggle_control, hide_answer_regions};

/// Class of the element that holds a rendered preview; deck CSS is scoped to it.
pub const PREVIEW_SCOPE: &str = ".card-preview";

pub const PLACEHOLDER: &str = "Load sample data from a JSON file to preview your template.";

/// Whole-document selectors that map onto the preview region itself.
const ROOT_SELECTORS: &[&str] = &["html", "body", ":root"];

fn media_src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(<(?:img|audio|source)\b[^>]*?\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)')"#)
            .expect("media src regex is valid")
    })
}

/// Source value of a `media_src_re` match and the quote around it.
fn src_value<'h>(caps: &Captures<'h>) -> (&'h str, char) {
    match (caps.get(2), caps.get(3)) {
        (Some(v), _) => (v.as_str(), '"'),
        (None, Some(v)) => (v.as_str(), '\''),
        (None, None) => ("", '"'),
    }
}

/// Appends `?t=<stamp>` to every `img`, `audio`, and `source` `src` that has
/// no query yet. Sources that already carry a query are left alone, so
/// running this twice changes nothing.
#[must_use]
pub fn cache_bust(html: &str, stamp: i64) -> String {
    media_src_re()
        .replace_all(html, |caps: &Captures<'_>| {
            let (value, quote) = src_value(caps);
            if value.is_empty() || value.contains('?') {
                return caps[0].to_owned();
            }
            format!("{}{quote}{value}?t={stamp}{quote}", &caps[1])
        })
        .into_owned()
}

fn url_scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("url scheme regex is valid"))
}

/// Whether `src` names a file relative to the card rather than an absolute
/// path, a fragment, or a URL with a scheme such as `https:` or `data:`.
fn is_relative_src(src: &str) -> bool {
    !src.is_empty()
        && !src.starts_with('/')
        && !src.starts_with('#')
        && !url_scheme_re().is_match(src)
}

/// Resolves relative `img`, `audio`, and `source` sources against
/// `media_folder`. Sources already under the folder are left alone.
#[must_use]
pub fn resolve_media(html: &str, media_folder: Option<&str>) -> String {
    let Some(folder) = media_folder
        .map(|folder| folder.trim().trim_end_matches('/'))
        .filter(|folder| !folder.is_empty())
    else {
        return html.to_owned();
    };
    let prefix = format!("{folder}/");
    media_src_re()
        .replace_all(html, |caps: &Captures<'_>| {
            let (value, quote) = src_value(caps);
            if !is_relative_src(value) || value.starts_with(&prefix) {
                return caps[0].to_owned();
            }
            format!("{}{quote}{prefix}{value}{quote}", &caps[1])
        })
        .into_owned()
}

fn scope_selector(selector: &str, scope: &str) -> String {
    let selector = selector.trim();
    if selector.is_empty() {
        return String::new();
    }
    if ROOT_SELECTORS.contains(&selector) {
        return scope.to_owned();
    }
    for root in ROOT_SELECTORS {
        if let Some(rest) = selector.strip_prefix(root) {
            if rest.starts_with(char::is_whitespace) || rest.starts_with('>') {
                return format!("{scope}{rest}");
            }
        }
    }
    format!("{scope} {selector}")
}

fn scope_prelude(prelude: &str, scope: &str) -> String {
    prelude
        .split(',')
        .map(|s| scope_selector(s, scope))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Index of the `}` matching the `{` at `open`.
fn closing_brace(css: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in css[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Prefixes every selector in `css` with `scope`.
///
/// Rules nested in `@media`, `@supports`, and `@container` are scoped too.
/// Other at-rules such as `@font-face` and `@keyframes` pass through.
#[must_use]
pub fn scope_css(css: &str, scope: &str) -> String {
    let mut out = String::with_capacity(css.len() + 64);
    let mut rest = css;
    while let Some(open) = rest.find('{') {
        let prelude = rest[..open].trim();
        let (body, next) = match closing_brace(rest, open) {
            Some(close) => (&rest[open + 1..close], close + 1),
            None => (&rest[open + 1..], rest.len()),
        };
        if let Some(at_rule) = prelude.strip_prefix('@') {
            let nested = ["media", "supports", "container"]
                .iter()
                .any(|name| at_rule.starts_with(name));
            if nested {
                out.push_str(&format!("{prelude} {{\n{}}}\n", scope_css(body, scope)));
            } else {
                out.push_str(&format!("{prelude} {{{body}}}\n"));
            }
        } else {
            out.push_str(&format!(
                "{} {{{}}}\n",
                scope_prelude(prelude, scope),
                body
            ));
        }
        rest = &rest[next..];
    }
    out
}

/// Wraps already-substituted markup into the preview region: scoped style,
/// media resolved against `media_folder` and cache-busted, and every answer
/// region hidden behind a toggle.
#[must_use]
pub fn compose(markup: &str, css: &str, media_folder: Option<&str>, stamp: i64) -> String {
    let mut html = String::new();
    if !css.trim().is_empty() {
        html.push_str("<style>\n");
        html.push_str(&scope_css(css, PREVIEW_SCOPE));
        html.push_str("</style>\n");
    }
    let busted = cache_bust(&resolve_media(markup, media_folder), stamp);
    html.push_str(&hide_answer_regions(&ensure_toggle_control(&busted)));
    html
}

/// Inner HTML of the preview region for a template, stylesheet, and sample.
///
/// Without a sample the fixed placeholder is shown and nothing is substituted.
#[must_use]
pub fn render_preview(
    card_template: &str,
    css: &str,
    record: Option<&SampleRecord>,
    media_folder: Option<&str>,
    stamp: i64,
) -> String {
    match record {
        None => format!(r#"<p class="preview-placeholder">{PLACEHOLDER}</p>"#),
        Some(record) => compose(
            &template::render(card_template, record),
            css,
            media_folder,
            stamp,
        ),
    }
}
