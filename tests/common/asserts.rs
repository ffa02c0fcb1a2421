use std::path::Path;

#[allow(dead_code)]
pub fn assert_file_content(path: &Path, expected: &str) {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    assert_eq!(
        content,
        expected,
        "unexpected content in {}",
        path.display()
    );
}
