//! `Link` header pagination.
//!
//! Servers using this scheme return the URL of the following page in a
//! `rel="next"` directive:
//!
//! ```text
//! <https://api.example.com/products?page=1>; rel="prev",
//! <https://api.example.com/products?page=3>; rel="next"
//! ```

/// Returns the `rel="next"` target of a `Link` header, if any.
///
/// The target is returned as written; relative references are resolved by
/// the caller against the URL of the current page.
#[must_use]
pub fn extract_next_link(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    for segment in header.split(',') {
        let segment = segment.trim();
        let Some((target, params)) = segment.split_once(';') else {
            continue;
        };
        let is_next = params.split(';').any(|p| {
            let p = p.trim().to_ascii_lowercase();
            p == r#"rel="next""# || p == "rel=next"
        });
        if !is_next {
            continue;
        }
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?.trim();
        return (!url.is_empty()).then(|| url.to_owned());
    }

    None
}
