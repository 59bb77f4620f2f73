//! XML escaping and element extraction for SOAP payloads.
//!
//! Everything interpolated into an envelope MUST go through [`escape`];
//! member names and folder names come from user configuration and from the
//! remote org, neither of which is trusted XML.

/// Escape a string for safe inclusion in XML content.
///
/// Escapes the five predefined XML entities.
///
/// # Example
///
/// ```rust
/// use packforge_soap::xml;
///
/// let safe = xml::escape("Hello <World> & 'Friends'");
/// assert_eq!(safe, "Hello &lt;World&gt; &amp; &apos;Friends&apos;");
/// ```
#[must_use]
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 16);
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Extract a simple element value from XML.
///
/// Tries the bare tag plus the namespace prefixes Salesforce responses use.
pub fn extract_element(xml: &str, tag: &str) -> Option<String> {
    let start_tag = format!("<{}>", tag);
    let end_tag = format!("</{}>", tag);

    let start_patterns = [
        start_tag.clone(),
        format!("<{}:{}>", "sf", tag),
        format!("<{}:{}>", "met", tag),
        format!("<{}:{}>", "tns", tag),
        format!("<{}:{}>", "urn", tag),
    ];

    for start in &start_patterns {
        if let Some(start_idx) = xml.find(start) {
            let content_start = start_idx + start.len();
            let search_from = &xml[content_start..];
            if let Some(end_idx) = search_from.find(&end_tag).or_else(|| {
                search_from.find(&format!("</{}", tag.split(':').next_back().unwrap_or(tag)))
            }) {
                return Some(search_from[..end_idx].to_string());
            }
        }
    }
    None
}

/// Extract all values of a repeated simple element.
pub fn extract_elements(xml: &str, tag: &str) -> Vec<String> {
    let mut results = Vec::new();
    let start_tag = format!("<{}>", tag);
    let end_tag = format!("</{}>", tag);

    let mut search_from = xml;
    while let Some(start_idx) = search_from.find(&start_tag) {
        let content_start = start_idx + start_tag.len();
        let remaining = &search_from[content_start..];
        if let Some(end_idx) = remaining.find(&end_tag) {
            results.push(remaining[..end_idx].to_string());
            search_from = &remaining[end_idx + end_tag.len()..];
        } else {
            break;
        }
    }
    results
}

/// Extract all blocks delimited by `<tag>...</tag>`, inner XML included.
///
/// Used for repeated complex elements like `<result>` and
/// `<metadataObjects>` where fields are extracted per block afterwards.
pub fn extract_blocks<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let start_tag = format!("<{}>", tag);
    let end_tag = format!("</{}>", tag);

    let mut search_from = xml;
    while let Some(start_idx) = search_from.find(&start_tag) {
        let content_start = start_idx + start_tag.len();
        let remaining = &search_from[content_start..];
        if let Some(end_idx) = remaining.find(&end_tag) {
            blocks.push(&remaining[..end_idx]);
            search_from = &remaining[end_idx + end_tag.len()..];
        } else {
            break;
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_entities() {
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape(r#"say "hi"'"#), "say &quot;hi&quot;&apos;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_extract_element_plain_and_prefixed() {
        let xml = "<result><fullName>Foo</fullName></result>";
        assert_eq!(extract_element(xml, "fullName").as_deref(), Some("Foo"));

        let xml = "<sf:sessionId>00D!AQEA</sf:sessionId>";
        assert_eq!(extract_element(xml, "sessionId").as_deref(), Some("00D!AQEA"));

        assert_eq!(extract_element(xml, "missing"), None);
    }

    #[test]
    fn test_extract_elements_repeated() {
        let xml = "<childXmlNames>CustomField</childXmlNames><childXmlNames>ListView</childXmlNames>";
        assert_eq!(
            extract_elements(xml, "childXmlNames"),
            vec!["CustomField", "ListView"]
        );
    }

    #[test]
    fn test_extract_blocks() {
        let xml = "<result><a>1</a></result><result><a>2</a></result>";
        let blocks = extract_blocks(xml, "result");
        assert_eq!(blocks.len(), 2);
        assert_eq!(extract_element(blocks[1], "a").as_deref(), Some("2"));
    }
}
