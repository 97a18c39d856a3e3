use anyhow::{Result, anyhow, bail};
use log::{debug, warn};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::{DirEntry, WalkDir};

/// One path component of a [`FilePattern`]: either a literal name or `prefix*suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard { prefix: String, suffix: String },
}

impl Segment {
    fn matches(&self, name: &OsStr) -> bool {
        let Some(name) = name.to_str() else {
            return false;
        };

        match self {
            Segment::Literal(literal) => name == literal,
            // a bare leading `*` never matches hidden entries
            Segment::Wildcard { prefix, .. } if prefix.is_empty() && name.starts_with('.') => {
                false
            }
            Segment::Wildcard { prefix, suffix } => {
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix.as_str())
                    && name.ends_with(suffix.as_str())
            }
        }
    }
}

/// A relative path pattern such as `*/*.mid`. Each `/`-separated segment matches exactly one path
/// component and may contain at most one `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    segments: Vec<Segment>,
}

impl FilePattern {
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True when `relative` has exactly one component per segment and each one matches.
    pub fn matches(&self, relative: &Path) -> bool {
        let components: Vec<&OsStr> = relative.iter().collect();
        components.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(components)
                .all(|(segment, name)| segment.matches(name))
    }

    fn matches_component(&self, depth: usize, name: &OsStr) -> bool {
        depth >= 1
            && self
                .segments
                .get(depth - 1)
                .is_some_and(|segment| segment.matches(name))
    }
}

impl Default for FilePattern {
    fn default() -> Self {
        Self {
            segments: vec![
                Segment::Wildcard {
                    prefix: String::new(),
                    suffix: String::new(),
                },
                Segment::Wildcard {
                    prefix: String::new(),
                    suffix: ".mid".into(),
                },
            ],
        }
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match segment {
                Segment::Literal(literal) => f.write_str(literal)?,
                Segment::Wildcard { prefix, suffix } => write!(f, "{prefix}*{suffix}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FilePattern {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let segments = s
            .split('/')
            .map(|part| {
                if part.is_empty() || part == "." || part == ".." {
                    return Err(anyhow!("Invalid path segment '{}' in pattern '{}'..!", part, s));
                }
                match part.split_once('*') {
                    None => Ok(Segment::Literal(part.to_string())),
                    Some((_, suffix)) if suffix.contains('*') => Err(anyhow!(
                        "Only one '*' is allowed per segment, got '{}'..!",
                        part
                    )),
                    Some((prefix, suffix)) => Ok(Segment::Wildcard {
                        prefix: prefix.to_string(),
                        suffix: suffix.to_string(),
                    }),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }
}

/// Lists every file under `root` matching `pattern`, sorted by name at each directory level.
///
/// A missing or non-directory root is an error. Unreadable entries further down are skipped.
pub fn discover(root: &Path, pattern: &FilePattern) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Root directory {} does not exist..!", root.display());
    }
    if !root.is_dir() {
        bail!("Root {} is not a directory..!", root.display());
    }

    let depth = pattern.depth();
    let keep = |entry: &DirEntry| {
        entry.depth() == 0 || pattern.matches_component(entry.depth(), entry.file_name())
    };

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep);

    for entry in walker {
        match entry {
            Ok(entry) => {
                let matched = entry
                    .path()
                    .strip_prefix(root)
                    .is_ok_and(|relative| pattern.matches(relative));
                if entry.file_type().is_file() && matched {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                if e.depth() == 0 {
                    bail!("Cannot read root directory {}: {}", root.display(), e);
                }
                warn!("Skipping unreadable entry: {}..!", e);
            }
        }
    }

    debug!(
        "Discovered {} file(s) under {}",
        files.len(),
        root.display()
    );

    Ok(files)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn parse_patterns() {
        let pattern: FilePattern = "*/*.mid".parse().unwrap();
        assert_eq!(pattern, FilePattern::default());
        assert_eq!(pattern.depth(), 2);
        assert_eq!(pattern.to_string(), "*/*.mid");

        assert_eq!("a/b/c*.midi".parse::<FilePattern>().unwrap().depth(), 3);
        assert!("".parse::<FilePattern>().is_err());
        assert!("*//*.mid".parse::<FilePattern>().is_err());
        assert!("../*.mid".parse::<FilePattern>().is_err());
        assert!("*/**.mid".parse::<FilePattern>().is_err());
    }

    #[test]
    fn segment_matching() {
        let segment = Segment::Wildcard {
            prefix: "ab".into(),
            suffix: "ba".into(),
        };
        assert!(segment.matches(OsStr::new("abba")));
        assert!(segment.matches(OsStr::new("ab-ba")));
        assert!(!segment.matches(OsStr::new("aba")));

        let any_midi = Segment::Wildcard {
            prefix: String::new(),
            suffix: ".mid".into(),
        };
        assert!(any_midi.matches(OsStr::new("foo.mid")));
        assert!(!any_midi.matches(OsStr::new("._foo.mid")));
        assert!(!any_midi.matches(OsStr::new(".mid")));

        let dotted = Segment::Wildcard {
            prefix: ".".into(),
            suffix: String::new(),
        };
        assert!(dotted.matches(OsStr::new(".git")));
        assert!(Segment::Literal("x.mid".into()).matches(OsStr::new("x.mid")));
        assert!(!Segment::Literal("x.mid".into()).matches(OsStr::new("y.mid")));
    }

    #[test]
    fn relative_path_matching() {
        let pattern = FilePattern::default();
        assert!(pattern.matches(Path::new("A/song.mid")));
        assert!(!pattern.matches(Path::new("song.mid")));
        assert!(!pattern.matches(Path::new("A/B/song.mid")));
        assert!(!pattern.matches(Path::new("A/song.midi")));
    }

    #[test]
    fn discovers_two_levels_in_sorted_order() {
        env_logger::try_init().unwrap_or(());

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "b/2.mid");
        touch(root, "a/9.mid");
        touch(root, "a/10.mid");
        touch(root, "a/notes.txt");
        touch(root, "top.mid");
        touch(root, "c/deeper/3.mid");
        touch(root, ".git/4.mid");
        touch(root, "b/._2.mid");
        fs::create_dir_all(root.join("d/folder.mid")).unwrap();

        let files = discover(root, &FilePattern::default()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("a/10.mid"),
                PathBuf::from("a/9.mid"),
                PathBuf::from("b/2.mid"),
            ]
        );
    }

    #[test]
    fn literal_segments_restrict_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep/x.mid");
        touch(dir.path(), "skip/y.mid");

        let pattern: FilePattern = "keep/*.mid".parse().unwrap();
        let files = discover(dir.path(), &pattern).unwrap();
        assert_eq!(files, vec![dir.path().join("keep/x.mid")]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("nope"), &FilePattern::default()).is_err());

        touch(dir.path(), "file.mid");
        assert!(discover(&dir.path().join("file.mid"), &FilePattern::default()).is_err());
    }
}
