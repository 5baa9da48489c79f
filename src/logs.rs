use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads the last `lines` lines of the service log.
///
/// A missing log file yields an empty vector rather than an error; the
/// service may simply never have been started.
pub fn tail_log(path: &Path, lines: usize) -> io::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

    let start = if all_lines.len() > lines {
        all_lines.len() - lines
    } else {
        0
    };
    Ok(all_lines[start..].to_vec())
}
