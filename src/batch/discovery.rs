//! Input discovery under the source directory

use std::{
    fs,
    path::{Path, PathBuf},
};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::utils::has_allowed_extension;

/// One input document and where its output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Finds the documents under `input` selected by `glob`, sorted by path.
///
/// A pattern without `/` is matched against file names at any depth unless
/// `recursive` is off, in which case only the top level is searched. A
/// pattern containing `/` is matched against the path relative to `input`.
pub fn discover(input: &Path, output: &Path, glob: &str, recursive: bool) -> Result<Vec<DocumentJob>> {
    if !input.is_dir() {
        return Err(Error::InputNotFound(input.to_path_buf()));
    }

    let matcher = glob_to_regex(glob)?;
    let by_name = !glob.contains('/');

    let mut files = Vec::new();
    walk(input, recursive, &mut files)?;
    files.sort();

    let jobs: Vec<DocumentJob> = files
        .into_iter()
        .filter(|path| has_allowed_extension(path, &["pdf"]))
        .filter_map(|path| {
            let relative = path.strip_prefix(input).ok()?.to_path_buf();
            let candidate = if by_name {
                relative.file_name()?.to_string_lossy().into_owned()
            } else {
                slash_path(&relative)
            };
            matcher.is_match(&candidate).then(|| DocumentJob {
                destination: output.join(&relative),
                source: path,
            })
        })
        .collect();

    debug!(count = jobs.len(), glob, recursive, "inputs discovered");
    Ok(jobs)
}

fn walk(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if file_type.is_dir() {
            if recursive {
                walk(&path, recursive, files)?;
            }
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Translates a shell glob into an anchored regex.
///
/// `*` and `?` stay within one path component, `**` crosses components and
/// `[...]` / `[!...]` are character classes.
pub fn glob_to_regex(glob: &str) -> Result<Regex> {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .skip(1)
                    .position(|c| *c == ']')
                    .map(|p| i + 2 + p);
                match close {
                    Some(end) => {
                        let mut class: String = chars[i + 1..end].iter().collect();
                        if let Some(rest) = class.strip_prefix('!') {
                            class = format!("^{}", rest);
                        }
                        out.push('[');
                        out.push_str(&class.replace('\\', "\\\\"));
                        out.push(']');
                        i = end + 1;
                        continue;
                    }
                    None => out.push_str(r"\["),
                }
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    out.push('$');

    Regex::new(&out).map_err(|e| Error::Config(format!("invalid glob {:?}: {}", glob, e)))
}
