use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

pub const SHOW_LABEL: &str = "Show Answer";
pub const HIDE_LABEL: &str = "Hide Answer";

/// Control appended to markup that has an answer region but no toggle of its own.
pub const FALLBACK_TOGGLE: &str =
    r#"<button type="button" class="answer-toggle" data-role="toggle-answer">Show Answer</button>"#;

fn answer_open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<([A-Za-z][\w-]*)(\s[^>]*?\bdata-role\s*=\s*["']answer["'][^>]*?)(/?)>"#)
            .expect("answer tag regex is valid")
    })
}

fn toggle_open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<([A-Za-z][\w-]*)\s[^>]*?\bdata-role\s*=\s*["']toggle-answer["'][^>]*>"#)
            .expect("toggle tag regex is valid")
    })
}

fn quoted_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""[^"]*"|'[^']*'"#).expect("quoted value regex is valid"))
}

fn hidden_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|\s)hidden(?:\s|=|/|$)").expect("hidden attr regex is valid")
    })
}

/// Whether an attribute list carries the `hidden` attribute itself. Quoted
/// values are blanked first so `class="not hidden"` does not count.
fn has_hidden_attr(attrs: &str) -> bool {
    hidden_attr_re().is_match(&quoted_value_re().replace_all(attrs, "\"\""))
}

/// Relabels toggle controls whose content is plain text. Controls holding
/// nested elements keep their markup as written.
fn label_toggle_controls(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    for caps in toggle_open_tag_re().captures_iter(html) {
        let Some(open) = caps.get(0) else { continue };
        let body = &html[open.end()..];
        let Some(text_len) = body.find('<') else { continue };
        let closing = format!("</{}", &caps[1]);
        let closes_here = body[text_len..]
            .get(..closing.len())
            .is_some_and(|tag| tag.eq_ignore_ascii_case(&closing));
        if !closes_here {
            continue;
        }
        out.push_str(&html[copied..open.end()]);
        out.push_str(SHOW_LABEL);
        copied = open.end() + text_len;
    }
    out.push_str(&html[copied..]);
    out
}

/// Appends [`FALLBACK_TOGGLE`] when `html` has an answer region but nothing
/// that reveals it.
#[must_use]
pub fn ensure_toggle_control(html: &str) -> Cow<'_, str> {
    if answer_open_tag_re().is_match(html) && !toggle_open_tag_re().is_match(html) {
        Cow::Owned(format!("{html}{FALLBACK_TOGGLE}"))
    } else {
        Cow::Borrowed(html)
    }
}

/// Puts rendered markup into its initial state: every answer holder carries
/// `hidden` and every plain-text toggle control reads "Show Answer".
#[must_use]
pub fn hide_answer_regions(html: &str) -> String {
    let hidden = answer_open_tag_re().replace_all(html, |caps: &Captures<'_>| {
        let attrs = &caps[2];
        if has_hidden_attr(attrs) {
            caps[0].to_owned()
        } else {
            format!("<{}{attrs} hidden{}>", &caps[1], &caps[3])
        }
    });
    label_toggle_controls(&hidden)
}

/// Script that binds the answer toggles inside the container `container_id`.
///
/// Every toggle flips every answer region together. The container must carry
/// `data-generation="<generation>"`. A script for an older generation finds no
/// match and does nothing, and binding the same generation twice is a no-op.
#[must_use]
pub fn toggle_bind_script(container_id: &str, generation: u64) -> String {
    format!(
        r#"
        const root = document.getElementById("{container_id}");
        if (!root || root.dataset.generation !== "{generation}") {{ return; }}
        const answers = Array.from(root.querySelectorAll('[data-role="answer"]'));
        const toggles = Array.from(root.querySelectorAll('[data-role="toggle-answer"]'));
        if (answers.length === 0 || toggles.length === 0) {{ return; }}
        if (toggles[0].dataset.bound === "{generation}") {{ return; }}
        const relabel = (hidden) => {{
            for (const toggle of toggles) {{
                if (toggle.children.length === 0) {{
                    toggle.textContent = hidden ? "{SHOW_LABEL}" : "{HIDE_LABEL}";
                }}
            }}
        }};
        for (const answer of answers) {{ answer.hidden = true; }}
        relabel(true);
        for (const toggle of toggles) {{
            toggle.dataset.bound = "{generation}";
            toggle.addEventListener("click", (event) => {{
                event.preventDefault();
                const hidden = !answers[0].hidden;
                for (const answer of answers) {{ answer.hidden = hidden; }}
                relabel(hidden);
            }});
        }}
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn answer_regions_start_hidden() {
        let html = r#"<button data-role="toggle-answer">Reveal</button><div class="a" data-role="answer">dog</div>"#;
        assert_eq!(
            hide_answer_regions(html),
            r#"<button data-role="toggle-answer">Show Answer</button><div class="a" data-role="answer" hidden>dog</div>"#
        );
    }

    #[test]
    fn hiding_is_idempotent() {
        let once = hide_answer_regions(r#"<section data-role='answer'><b>x</b></section>"#);
        assert_eq!(once, r#"<section data-role='answer' hidden><b>x</b></section>"#);
        assert_eq!(hide_answer_regions(&once), once);
    }

    #[test]
    fn every_answer_region_is_hidden() {
        let html = r#"<div data-role="answer">dog</div><p>hint</p><div data-role="answer">inu</div>"#;
        assert_eq!(
            hide_answer_regions(html),
            r#"<div data-role="answer" hidden>dog</div><p>hint</p><div data-role="answer" hidden>inu</div>"#
        );
    }

    #[test]
    fn hidden_inside_attribute_value_does_not_count() {
        let html = r#"<div class="not hidden" data-role="answer">dog</div>"#;
        assert_eq!(
            hide_answer_regions(html),
            r#"<div class="not hidden" data-role="answer" hidden>dog</div>"#
        );
        let already = r#"<div data-role="answer" hidden="">dog</div>"#;
        assert_eq!(hide_answer_regions(already), already);
    }

    #[test]
    fn toggle_with_nested_markup_keeps_its_content() {
        let html = r#"<button data-role="toggle-answer"><span>Reveal</span></button><div data-role="answer">dog</div>"#;
        assert_eq!(
            hide_answer_regions(html),
            r#"<button data-role="toggle-answer"><span>Reveal</span></button><div data-role="answer" hidden>dog</div>"#
        );
    }

    #[test]
    fn markup_without_toggle_is_untouched() {
        let html = "<p data-role=\"front\">犬</p>";
        assert_eq!(hide_answer_regions(html), html);
        assert_eq!(ensure_toggle_control(html), html);
    }

    #[test]
    fn answer_without_toggle_gets_fallback_control() {
        let html = r#"<div data-role="answer">dog</div>"#;
        assert_eq!(ensure_toggle_control(html), format!("{html}{FALLBACK_TOGGLE}"));

        let with_toggle = r#"<a data-role="toggle-answer">?</a><div data-role="answer">dog</div>"#;
        assert_eq!(ensure_toggle_control(with_toggle), with_toggle);
    }

    #[test]
    fn bind_script_is_keyed_on_container_and_generation() {
        let script = toggle_bind_script("deck-preview", 3);
        assert!(script.contains(r#"getElementById("deck-preview")"#));
        assert!(script.contains(r#"root.dataset.generation !== "3""#));
        assert!(script.contains(r#"toggles[0].dataset.bound === "3""#));
        assert!(script.contains(HIDE_LABEL));
    }

    #[test]
    fn bind_script_flips_every_answer_region() {
        let script = toggle_bind_script("study-card", 0);
        assert!(script.contains(r#"root.querySelectorAll('[data-role="answer"]')"#));
        assert!(script.contains(r#"root.querySelectorAll('[data-role="toggle-answer"]')"#));
        assert!(script.contains("for (const answer of answers) { answer.hidden = hidden; }"));
        assert!(!script.contains("root.querySelector("));
    }
}
