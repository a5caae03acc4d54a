//! Slug derivation.

/// Slug of a post file: the name without `.md` and without a leading
/// `YYYY-MM-DD-` date prefix.
///
/// `2026-02-25-hello-world.md` becomes `hello-world`; `notes.md` stays `notes`.
pub fn post_slug(file_name: &str) -> &str {
    let name = file_name.strip_suffix(".md").unwrap_or(file_name);
    let bytes = name.as_bytes();
    if bytes.len() > 11 && bytes[4] == b'-' && bytes[7] == b'-' && bytes[10] == b'-' {
        &name[11..]
    } else {
        name
    }
}

/// Slug of a page or project file: the name without `.md`.
pub fn file_slug(file_name: &str) -> &str {
    file_name.strip_suffix(".md").unwrap_or(file_name)
}

/// Lowercase URL slug for a title: runs of anything other than `a-z0-9`
/// become one `-`, with none at either end.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}
