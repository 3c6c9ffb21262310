/// Strips control bytes and null characters from user-supplied strings
/// before they reach a prompt (`spec.md` §4.6). Tabs and newlines are kept
/// since stage payloads are multi-line.
pub fn sanitize_user_text(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_null_and_control_bytes() {
        let dirty = "hello\u{0}world\u{7}!";
        assert_eq!(sanitize_user_text(dirty), "helloworld!");
    }

    #[test]
    fn preserves_newlines_and_tabs() {
        let text = "line one\n\tindented";
        assert_eq!(sanitize_user_text(text), text);
    }
}
