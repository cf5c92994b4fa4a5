//! Input file discovery for directory mode.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::debug;
use walkdir::WalkDir;

use crate::config::YearWindow;
use crate::error::{EngineError, EngineResult};

/// Regular files (or symlinks to them) directly inside `dir` whose file name matches the glob `pattern`, sorted
/// lexicographically by file name. Subdirectories are not descended into.
///
/// Fails with [`EngineError::NoInputFiles`] if nothing matches.
pub fn discover_files(dir: impl AsRef<Path>, pattern: &str) -> EngineResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let matcher = Pattern::new(pattern)?;
    let match_opts = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        // `Path::is_file` follows symlinks; a dangling link is not a file.
        if !entry.path().is_file() {
            if entry.path_is_symlink() {
                debug!("skipping dangling symlink {}", entry.path().display());
            }
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            debug!("skipping non-UTF-8 file name {}", entry.path().display());
            continue;
        };
        if matcher.matches_with(name, match_opts) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(EngineError::NoInputFiles {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    debug!("discovered {} files matching '{pattern}' in {}", files.len(), dir.display());
    Ok(files)
}

/// Report year encoded as a trailing `_YYYY` in the file stem, e.g. `offenses_known_2019.csv`.
pub fn report_year(path: &Path) -> Option<i32> {
    let stem = path.file_stem()?.to_str()?;
    let (_, tail) = stem.rsplit_once('_')?;
    if tail.len() != 4 || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Keep only paths whose [`report_year`] falls inside `window`, preserving order.
pub fn filter_by_year(paths: Vec<PathBuf>, window: &YearWindow) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| match report_year(p) {
            Some(year) => window.contains(year),
            None => {
                debug!("skipping {}: no _YYYY suffix in file name", p.display());
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{filter_by_year, report_year};
    use crate::config::YearWindow;

    #[test]
    fn report_year_reads_trailing_four_digits() {
        assert_eq!(report_year(Path::new("data/offenses_known_monthly_2019.csv")), Some(2019));
        assert_eq!(report_year(Path::new("offenses_2019_v2.csv")), None);
        assert_eq!(report_year(Path::new("offenses_19.csv")), None);
        assert_eq!(report_year(Path::new("2019.csv")), None);
    }

    #[test]
    fn year_filter_keeps_order_and_drops_unnamed() {
        let paths = vec![
            PathBuf::from("a_2011.csv"),
            PathBuf::from("a_2013.csv"),
            PathBuf::from("notes.csv"),
            PathBuf::from("a_2012.csv"),
        ];
        let kept = filter_by_year(paths, &YearWindow { from: 2012, to: 2013 });
        assert_eq!(kept, vec![PathBuf::from("a_2013.csv"), PathBuf::from("a_2012.csv")]);
    }
}
