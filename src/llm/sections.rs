//! Pull labelled sections out of free-form model replies.

use regex::RegexBuilder;

/// Placeholder used when a section cannot be found.
pub const NOT_FOUND: &str = "Not found";

fn strip_list_marker(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*' | '#'))
        .trim_start()
        .trim_start_matches("**")
}

/// Text of the section called `name`.
///
/// First looks for a line that starts with the name (`Music: soft ragas`,
/// `2. **Music** - ...`), then for a bullet list under a line mentioning it.
pub fn extract_section(text: &str, name: &str) -> Option<String> {
    let pattern = RegexBuilder::new(&format!(r"^{}(?:\*\*)?\s*[:\-]?(?:\*\*)?\s*(.*)$", regex::escape(name)))
        .case_insensitive(true)
        .build()
        .ok()?;
    let inline = text.lines().find_map(|line| {
        let caps = pattern.captures(strip_list_marker(line))?;
        let value = caps.get(1)?.as_str().trim();
        (!value.is_empty()).then(|| value.to_string())
    });
    if inline.is_some() {
        return inline;
    }

    let lines: Vec<&str> = text.lines().collect();
    let needle = name.to_lowercase();
    for (idx, line) in lines.iter().enumerate() {
        if !line.to_lowercase().contains(&needle) {
            continue;
        }
        let mut bullets = Vec::new();
        for next in &lines[idx + 1..] {
            let trimmed = next.trim();
            if trimmed.starts_with('-') || trimmed.starts_with('*') {
                bullets.push(trimmed.trim_matches(|c: char| c == '-' || c == '*' || c == ' ').to_string());
            } else if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            } else {
                break;
            }
        }
        if !bullets.is_empty() {
            return Some(bullets.join("\n"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "Here you go:\n\
        1. Self-care: Ten minutes of abhyanga before bathing\n\
        2. **Music** - Soft flute ragas\n\
        ### Exercise\n\
        - Cat-cow stretches\n\
        - Short evening walks\n\
        Ayurveda: Warm milk with a pinch of turmeric";

    #[test]
    fn labelled_lines_are_read_inline() {
        assert_eq!(
            extract_section(REPLY, "self-care").as_deref(),
            Some("Ten minutes of abhyanga before bathing")
        );
        assert_eq!(extract_section(REPLY, "music").as_deref(), Some("Soft flute ragas"));
        assert_eq!(
            extract_section(REPLY, "Ayurveda").as_deref(),
            Some("Warm milk with a pinch of turmeric")
        );
    }

    #[test]
    fn bullets_under_a_heading_are_joined() {
        assert_eq!(
            extract_section(REPLY, "exercise").as_deref(),
            Some("Cat-cow stretches\nShort evening walks")
        );
    }

    #[test]
    fn bold_label_may_close_after_the_colon() {
        assert_eq!(
            extract_section("3. **Exercise:** prenatal yoga", "exercise").as_deref(),
            Some("prenatal yoga")
        );
    }

    #[test]
    fn absent_section_is_none() {
        assert_eq!(extract_section(REPLY, "sleep"), None);
    }
}
