use std::sync::LazyLock;

use regex::Regex;

static MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static LEADING_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^-\s").unwrap());

/// Convert a GitHub-markdown subset to chat mrkdwn.
///
/// `**bold**` collapses to `*bold*`, `[label](url)` becomes `<url|label>`,
/// and leading `- ` bullets become `• `.
pub fn to_mrkdwn(text: &str) -> String {
    let text = text.replace("**", "*");
    let text = MD_LINK.replace_all(&text, "<${2}|${1}>");
    LEADING_BULLET.replace_all(&text, "• ").into_owned()
}

/// Escape raw text for embedding in chat markup.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Decode JSON escape sequences into real characters.
///
/// Handles `\n`, `\r`, `\t`, `\"`, `\\`, and `\uXXXX`. A broken `\u`
/// (short or invalid hex, including lone surrogates) drops the backslash
/// and keeps the `u`, as does any unknown escape with its own character.
pub fn json_unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            'u' => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        for _ in 0..4 {
                            chars.next();
                        }
                        out.push(ch);
                    }
                    None => out.push('u'),
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_collapses_to_single_marker() {
        assert_eq!(to_mrkdwn("this is **bold** text"), "this is *bold* text");
    }

    #[test]
    fn links_convert_to_chat_syntax() {
        assert_eq!(
            to_mrkdwn("see [the docs](https://example.com/a?b=c) now"),
            "see <https://example.com/a?b=c|the docs> now"
        );
    }

    #[test]
    fn multiple_links_all_convert() {
        assert_eq!(
            to_mrkdwn("[a](http://x) and [b](http://y)"),
            "<http://x|a> and <http://y|b>"
        );
    }

    #[test]
    fn leading_bullets_convert_per_line() {
        assert_eq!(
            to_mrkdwn("- first\n- second\nnot - a bullet"),
            "• first\n• second\nnot - a bullet"
        );
    }

    #[test]
    fn escape_text_neutralizes_markup_chars() {
        assert_eq!(escape_text("a & b <c> d"), "a &amp; b &lt;c&gt; d");
    }

    #[test]
    fn escape_text_handles_ampersand_first() {
        // no double escaping of the entities themselves
        assert_eq!(escape_text("&lt;"), "&amp;lt;");
    }

    #[test]
    fn unescape_common_sequences() {
        assert_eq!(json_unescape(r#"a\nb\tc\"d\\e"#), "a\nb\tc\"d\\e");
    }

    #[test]
    fn unescape_unicode_escape() {
        assert_eq!(json_unescape("caf\\u00e9"), "café");
        assert_eq!(json_unescape("\\u0041BC"), "ABC");
    }

    #[test]
    fn broken_unicode_escape_drops_backslash() {
        assert_eq!(json_unescape(r"\u00"), "u00");
        assert_eq!(json_unescape(r"\uZZZZ!"), "uZZZZ!");
    }

    #[test]
    fn unknown_escape_drops_backslash() {
        assert_eq!(json_unescape(r"\x41"), "x41");
    }

    #[test]
    fn trailing_backslash_is_kept() {
        assert_eq!(json_unescape("end\\"), "end\\");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(json_unescape("no escapes here"), "no escapes here");
    }
}
