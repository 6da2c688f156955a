//! Remote key helpers

/// Join a key prefix and a relative path into a normalized object key
///
/// Empty and `.` segments are dropped and `..` removes the previous segment,
/// so `join_key("js-app/", "./app.js")` is `js-app/app.js`. The result never
/// starts with `/`.
pub fn join_key(prefix: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in prefix.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
