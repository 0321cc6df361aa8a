//! Text extraction from HTML help pages.

use regex::{Captures, Regex};

/// Pulls the title and the searchable text out of an HTML page.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    title: Regex,
    hidden: Regex,
    tag: Regex,
    entity: Regex,
    whitespace: Regex,
}

impl HtmlExtractor {
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            title: Regex::new(r"(?i)<title[^>]*>([^<\r\n]*)")?,
            hidden: Regex::new(
                r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
            )?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            entity: Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Page title with `_no` markers dropped and underscores read as spaces.
    #[must_use]
    pub fn title(&self, html: &str) -> Option<String> {
        let raw = self.title.captures(html)?.get(1)?.as_str();
        let title = raw.replace("_no", "").replace('_', " ");
        let title = self.normalize(&self.decode_entities(&title));
        (!title.is_empty()).then_some(title)
    }

    /// Visible text of the page, whitespace collapsed.
    #[must_use]
    pub fn text(&self, html: &str) -> String {
        let visible = self.hidden.replace_all(html, " ");
        let stripped = self.tag.replace_all(&visible, " ");
        self.normalize(&self.decode_entities(&stripped))
    }

    fn normalize(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }

    fn decode_entities(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &Captures<'_>| {
                decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn decode_entity(name: &str) -> Option<String> {
    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        _ => {
            let hex = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"));
            let code = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><head><title>Patient_no_Selection</title>
        <style>body { color: red; }</style>
        <script type=\"text/javascript\">var x = '<b>';</script></head>
        <body><!-- hidden note --><h1>Selecting&nbsp;a patient</h1>
        <p>Use the <b>search</b> box &amp; press Enter.</p></body></html>";

    #[test]
    fn test_title_cleanup() {
        let extractor = HtmlExtractor::new().unwrap();
        assert_eq!(extractor.title(PAGE).as_deref(), Some("Patient Selection"));
        assert_eq!(extractor.title("<p>no title</p>"), None);
        assert_eq!(extractor.title("<TITLE>  </TITLE>"), None);
    }

    #[test]
    fn test_text_strips_markup() {
        let extractor = HtmlExtractor::new().unwrap();
        let text = extractor.text(PAGE);

        assert!(text.contains("Selecting a patient"));
        assert!(text.contains("Use the search box & press Enter."));
        assert!(!text.contains("color"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("hidden note"));
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entity("lt").as_deref(), Some("<"));
        assert_eq!(decode_entity("#65").as_deref(), Some("A"));
        assert_eq!(decode_entity("#x41").as_deref(), Some("A"));
        assert_eq!(decode_entity("bogus"), None);

        let extractor = HtmlExtractor::new().unwrap();
        assert_eq!(extractor.text("a &bogus; b"), "a &bogus; b");
    }
}
