use std::sync::LazyLock;

use regex::Regex;

static DATE_CONTEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Between (?P<start>.+?) and (?P<date>.+?), your articles").unwrap());
static DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"realpython\.com/(?P<slug>.+?)/: (?P<views>\S+) views, (?P<users>\S+) users, (?P<time>\S+) avg reading time",
    )
    .unwrap()
});

/// One classified line of a digest. Fields are raw captures; nothing is coerced yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    DateContext {
        date: &'a str,
    },
    Data {
        slug: &'a str,
        views: &'a str,
        users: &'a str,
        time: &'a str,
    },
    Unrecognized,
}

/// A line matching the date-context shape is never also a data line.
pub fn classify_line(line: &str) -> Line<'_> {
    if let Some(caps) = DATE_CONTEXT_RE.captures(line) {
        if let Some(date) = caps.name("date") {
            return Line::DateContext { date: date.as_str() };
        }
    }

    if let Some(caps) = DATA_RE.captures(line) {
        if let (Some(slug), Some(views), Some(users), Some(time)) = (
            caps.name("slug"),
            caps.name("views"),
            caps.name("users"),
            caps.name("time"),
        ) {
            return Line::Data {
                slug: slug.as_str(),
                views: views.as_str(),
                users: users.as_str(),
                time: time.as_str(),
            };
        }
    }

    Line::Unrecognized
}

/// Classify every line of `text`, keeping line order.
pub fn classify_lines(text: &str) -> Vec<Line<'_>> {
    text.lines().map(classify_line).collect()
}
