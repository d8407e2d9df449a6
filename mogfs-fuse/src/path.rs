//! Path normalization (§4.8). Every path the dispatcher receives is run
//! through [`normalize`] before it reaches the core.

/// Empty input and `.` both normalize to `/`; anything else gets a
/// leading `/` if it's missing one.
pub fn normalize(input: &str) -> String {
    if input.is_empty() || input == "." {
        return "/".to_string();
    }
    if input.starts_with('/') {
        input.to_string()
    } else {
        format!("/{}", input)
    }
}

/// Directory-cache key form: normalized, with a trailing `/`.
pub fn normalize_dir(input: &str) -> String {
    let n = normalize(input);
    if n.ends_with('/') {
        n
    } else {
        format!("{}/", n)
    }
}

/// The normalized-dir form of `path`'s parent. `/` is its own parent.
pub fn parent_dir(path: &str) -> String {
    let n = normalize(path);
    if n == "/" {
        return "/".to_string();
    }
    let trimmed = n.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalize_dir(&trimmed[..idx]),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_dot_become_root() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("."), "/");
    }

    #[test]
    fn missing_leading_slash_gets_one() {
        assert_eq!(normalize("foo/bar"), "/foo/bar");
        assert_eq!(normalize("/foo/bar"), "/foo/bar");
    }

    #[test]
    fn dir_form_has_trailing_slash() {
        assert_eq!(normalize_dir("/a/b"), "/a/b/");
        assert_eq!(normalize_dir("/"), "/");
    }

    #[test]
    fn parent_of_nested_path() {
        assert_eq!(parent_dir("/a/b/c"), "/a/b/");
        assert_eq!(parent_dir("/a"), "/");
        assert_eq!(parent_dir("/"), "/");
    }
}
