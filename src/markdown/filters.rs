//! Cleanup filters for Google Maps derived markdown.
//!
//! Every filter here is a pure `&str -> String` transformation. They are
//! composed in a fixed order by [`FilterChain::google_maps`]; later filters
//! assume the earlier ones already ran.
//!
//! [`FilterChain::google_maps`]: super::FilterChain::google_maps

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `[... Website ...](https://www.google.com/maps/search/<https://real.site>)`
///
/// Group 1 is a bracketed target, which may contain parentheses; group 2 a
/// bare one, which may not.
static WEBSITE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[[^\]\n]*(?i:website)[^\]\n]*\]\(https?://(?:www\.)?google\.[a-z.]+/maps/search/(?:<([^<>\s]+)>|([^<>()\s]+))\)",
    )
    .unwrap()
});

static MAP_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"google\.[a-z.]+/maps|maps\.google\.|maps\.app\.goo\.gl|goo\.gl/maps").unwrap()
});

static DIRECTIONS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Directions").unwrap());

/// Star rating directly followed by review count, e.g. `4.8(54)` or `4.6(1,204)`.
static RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\.\d\(\d[\d,]*\)").unwrap());

/// Business hours status line.
static STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\W*(?:Open|Closed)\b").unwrap());

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[\s.-]?)?(?:\(\d{3}\)|\d{3})[\s.-]?\d{3}[\s.-]?\d{4}").unwrap()
});

static MARKETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"recommend them!|\bexcellent\b|\bBest\b|\bservices\b|Online appointments")
        .unwrap()
});

static CHROME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:Rating|Hours|All filters|Results|Share)\s*$").unwrap()
});

/// Icon font glyphs (private use area) and replacement characters.
static FILLER_GLYPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{E000}-\x{F8FF}\x{FFFD}]").unwrap());

static SEPARATOR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s·⋅•|*_=\-–—]*$").unwrap());

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*[·⋅•][ \t]*").unwrap());

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static NON_SEMANTIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s(){}\[\]<>+\-.,/:?!]").unwrap());

/// Rewrite masked Google Maps website links into plain `[Website](url)` links.
pub fn transform_website_links(text: &str) -> String {
    WEBSITE_LINK
        .replace_all(text, |caps: &Captures| {
            let target = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            format!("[Website]({})", target)
        })
        .into_owned()
}

/// Strip navigation chrome, ratings and status noise, keeping phone numbers.
///
/// Runs, in order: [`blank_noise_lines`], [`reduce_status_lines`],
/// [`replace_bullets`], [`collapse_blank_lines`].
pub fn remove_redundant_data(text: &str) -> String {
    let text = blank_noise_lines(text);
    let text = reduce_status_lines(&text);
    let text = replace_bullets(&text);
    collapse_blank_lines(&text)
}

/// Remove every character that is not a word character, whitespace, or
/// one of `(){}[]<>+-.,/:?!_`.
pub fn remove_special_characters(text: &str) -> String {
    NON_SEMANTIC.replace_all(text, "").into_owned()
}

/// Blank out noise lines. The newline itself is kept so paragraph breaks
/// survive until [`collapse_blank_lines`].
///
/// Status lines that carry a phone number are left for
/// [`reduce_status_lines`].
pub fn blank_noise_lines(text: &str) -> String {
    map_lines(text, |line| {
        if is_status_line(line) {
            return if PHONE.is_match(line) { line } else { "" };
        }
        if is_noise_line(line) {
            ""
        } else {
            line
        }
    })
}

/// Reduce `Open`/`Closed` status lines to the phone number they contain.
pub fn reduce_status_lines(text: &str) -> String {
    map_lines(text, |line| {
        if is_status_line(line) {
            find_phone_number(line).unwrap_or(line)
        } else {
            line
        }
    })
}

/// Replace bullet and separator glyphs (and the spaces around them) with
/// a single space.
pub fn replace_bullets(text: &str) -> String {
    BULLET.replace_all(text, " ").into_owned()
}

/// Collapse runs of three or more newlines down to one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}

/// Extract the first phone number found in `text`.
pub fn find_phone_number(text: &str) -> Option<&str> {
    PHONE.find(text).map(|m| m.as_str())
}

fn is_status_line(line: &str) -> bool {
    STATUS.is_match(line)
}

fn is_noise_line(line: &str) -> bool {
    SEPARATOR_ONLY.is_match(line)
        || MAP_LINK.is_match(line)
        || DIRECTIONS.is_match(line)
        || RATING.is_match(line)
        || MARKETING.is_match(line)
        || CHROME_LABEL.is_match(line)
        || FILLER_GLYPH.is_match(line)
}

fn map_lines<'a>(text: &'a str, f: impl Fn(&'a str) -> &'a str) -> String {
    text.lines().map(f).collect::<Vec<_>>().join("\n")
}
