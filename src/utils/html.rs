/// Clean user-supplied rich text (course and module descriptions).
///
/// Whitelist-based: safe tags such as <b> and <p> survive, <script>,
/// <iframe> and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_keeps_formatting() {
        let cleaned = clean_html("<p>Intro <b>Rust</b></p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>Intro <b>Rust</b></p>");
    }
}
