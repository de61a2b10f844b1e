//! Font loading for the PDF back end.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use log::{debug, warn};

use crate::config::FONTS_DIR_ENV;

/// Preferred report font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "LiberationSans";

/// The four TrueType files making up one family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSet {
    pub name: &'static str,
    pub regular: &'static str,
    pub bold: &'static str,
    pub italic: &'static str,
    pub bold_italic: &'static str,
}

impl FontSet {
    fn files(&self) -> [&'static str; 4] {
        [self.regular, self.bold, self.italic, self.bold_italic]
    }
}

/// Families tried in every candidate directory, in order. DejaVu Sans ships
/// in `assets/fonts`.
pub const FONT_SETS: &[FontSet] = &[
    FontSet {
        name: DEFAULT_FONT_FAMILY_NAME,
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
    },
    FontSet {
        name: "DejaVuSans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
    },
];

/// Where distributions install the supported families.
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/liberation",
    "/usr/local/share/fonts/liberation",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu-sans-fonts",
    "/usr/share/fonts/TTF",
];

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

fn bundled_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env::var_os(FONTS_DIR_ENV).map(PathBuf::from) {
        if !path.as_os_str().is_empty() {
            candidates.push(path);
        }
    }

    if let Some(path) = configured {
        push_unique(&mut candidates, path.to_path_buf());
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }

    push_unique(
        &mut candidates,
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"),
    );
    candidates
}

fn missing_font_files(path: &Path, set: &FontSet) -> Vec<PathBuf> {
    set.files()
        .iter()
        .map(|name| path.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

/// First candidate directory holding a complete font set.
fn resolve_in(
    candidates: Vec<PathBuf>,
    what: &str,
) -> Result<(PathBuf, &'static FontSet), Error> {
    let mut attempts = Vec::new();

    for candidate in candidates {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let mut incomplete = Vec::new();
        for set in FONT_SETS {
            let missing = missing_font_files(&candidate, set);
            if missing.is_empty() {
                return Ok((candidate, set));
            }
            incomplete.push(format!("{} missing {}", set.name, missing.len()));
        }
        attempts.push(format!("{} ({})", candidate.display(), incomplete.join(", ")));
    }

    Err(Error::new(
        format!("Unable to locate {what}. Checked: {}", attempts.join(", ")),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

fn load_family(directory: &Path, set: &FontSet) -> Result<FontFamily<FontData>, Error> {
    debug!("Loading '{}' fonts from {}", set.name, directory.display());
    let load = |file: &str| {
        FontData::load(directory.join(file), None).map_err(|err| {
            Error::new(
                format!(
                    "Failed to load font '{}' from {}: {}",
                    file,
                    directory.display(),
                    err
                ),
                io::Error::new(io::ErrorKind::Other, err.to_string()),
            )
        })
    };
    Ok(FontFamily {
        regular: load(set.regular)?,
        bold: load(set.bold)?,
        italic: load(set.italic)?,
        bold_italic: load(set.bold_italic)?,
    })
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

fn system_candidates() -> Vec<PathBuf> {
    SYSTEM_FONT_DIRS.iter().map(PathBuf::from).collect()
}

/// Loads the report font family, preferring bundled fonts and falling back to
/// a system installation of Liberation Sans or DejaVu Sans.
pub fn font_family(configured: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    let bundled = resolve_in(bundled_candidates(configured), "bundled fonts");
    match bundled {
        Ok((directory, set)) => load_family(&directory, set),
        Err(err) if fonts_missing(&err) => {
            match resolve_in(system_candidates(), "system fonts") {
                Ok((directory, set)) => {
                    warn!(
                        "Bundled fonts unavailable; using system {} fonts from {}",
                        set.name,
                        directory.display()
                    );
                    load_family(&directory, set)
                }
                Err(fallback_err) => Err(Error::new(
                    format!(
                        "{err}. {fallback_err}. Set {FONTS_DIR_ENV} to a directory with {}",
                        FONT_SETS[0].files().join(", ")
                    ),
                    io::Error::new(io::ErrorKind::NotFound, "report fonts are not available"),
                )),
            }
        }
        Err(err) => Err(err),
    }
}

/// Whether [`font_family`] can find a complete font set.
pub fn default_fonts_available(configured: Option<&Path>) -> bool {
    resolve_in(bundled_candidates(configured), "bundled fonts").is_ok()
        || resolve_in(system_candidates(), "system fonts").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_directory_is_searched_before_crate_assets() {
        let configured = PathBuf::from("/opt/claim-report/fonts");
        let candidates = bundled_candidates(Some(&configured));
        let configured_at = candidates.iter().position(|path| path == &configured);
        let manifest_at = candidates
            .iter()
            .position(|path| path.ends_with("assets/fonts") && path.starts_with(env!("CARGO_MANIFEST_DIR")));
        assert!(configured_at.is_some());
        assert!(configured_at < manifest_at);
    }

    #[test]
    fn missing_directory_is_reported_as_not_found() {
        let err = resolve_in(vec![PathBuf::from("/nonexistent/claim-report-fonts")], "fonts")
            .unwrap_err();
        assert!(fonts_missing(&err));
        assert!(err.to_string().contains("directory missing"));
    }

    #[test]
    fn shipped_assets_hold_a_complete_family() {
        let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
        let (directory, set) = resolve_in(vec![assets.clone()], "fonts").unwrap();
        assert_eq!(directory, assets);
        assert_eq!(set.name, "DejaVuSans");
        assert!(font_family(None).is_ok());
    }
}
