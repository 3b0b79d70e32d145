//! Output rendering - paragraph-aware word wrapping.

/// Default wrap width for terminal output.
pub const WIDTH: usize = 78;

/// Wrap prose for the terminal.
///
/// Blank lines pass through as paragraph breaks; every other line is trimmed
/// and word-wrapped to `width` on its own.
pub fn render(text: &str, width: usize) -> String {
    text.split('\n')
        .map(|line| {
            let line = line.trim();
            if line.is_empty() {
                String::new()
            } else {
                textwrap::fill(line, width)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_lines_pass_through() {
        assert_eq!(render("hello drift", WIDTH), "hello drift");
    }

    #[test]
    fn test_blank_lines_preserved_as_paragraph_breaks() {
        let text = "first paragraph\n\nsecond paragraph";
        assert_eq!(render(text, WIDTH), "first paragraph\n\nsecond paragraph");
    }

    #[test]
    fn test_long_paragraph_wraps_to_width() {
        let text = "one two three four five six seven eight nine ten";
        let wrapped = render(text, 20);
        assert!(wrapped.lines().count() > 1);
        assert!(wrapped.lines().all(|line| line.len() <= 20));
    }

    #[test]
    fn test_each_paragraph_wraps_independently() {
        let text = "alpha beta gamma delta epsilon\n\nzeta eta theta iota kappa";
        let wrapped = render(text, 12);
        let paragraphs: Vec<&str> = wrapped.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].contains("alpha"));
        assert!(paragraphs[1].contains("zeta"));
    }

    #[test]
    fn test_leading_indentation_is_trimmed() {
        assert_eq!(render("   indented line", WIDTH), "indented line");
    }
}
