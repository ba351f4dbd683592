//! Input discovery: the newest deck and cover image in the input directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::content::TEAM_SLIDE_FILE;

/// Files picked for one report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSet {
    pub deck: PathBuf,
    pub cover_image: PathBuf,
    pub team_slide: Option<PathBuf>,
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Case-insensitive, so no spelling of the team slide is taken as a cover
fn is_team_slide(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(TEAM_SLIDE_FILE))
}

/// Birth time where the filesystem records it, modification time otherwise
fn file_time(path: &Path) -> Result<SystemTime> {
    let meta = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    meta.created()
        .or_else(|_| meta.modified())
        .with_context(|| format!("No timestamp available for {}", path.display()))
}

/// Newest entry by timestamp; equal timestamps resolve to the greatest path
pub fn newest(candidates: Vec<(PathBuf, SystemTime)>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .max_by(|(pa, ta), (pb, tb)| ta.cmp(tb).then_with(|| pa.cmp(pb)))
        .map(|(path, _)| path)
}

fn newest_matching<F>(files: &[PathBuf], keep: F) -> Result<Option<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let candidates = files
        .iter()
        .filter(|p| keep(p))
        .map(|p| file_time(p).map(|time| (p.clone(), time)))
        .collect::<Result<Vec<_>>>()?;
    Ok(newest(candidates))
}

/// Pick the newest PDF and the newest PNG (other than the team slide) in
/// `input_dir`.
///
/// A missing directory is created and reported as "nothing to do", as is a
/// directory without a usable PDF or PNG.
pub fn find_latest_files(input_dir: &Path) -> Result<Option<InputSet>> {
    if !input_dir.exists() {
        fs::create_dir_all(input_dir)
            .with_context(|| format!("Failed to create {}", input_dir.display()))?;
        tracing::info!(
            dir = %input_dir.display(),
            "created input directory; add a PDF deck and a PNG cover image to it"
        );
        return Ok(None);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read directory {}", input_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }

    let Some(deck) = newest_matching(&files, |p| has_extension(p, "pdf"))? else {
        tracing::warn!(dir = %input_dir.display(), "no PDF files found");
        return Ok(None);
    };
    let Some(cover_image) =
        newest_matching(&files, |p| has_extension(p, "png") && !is_team_slide(p))?
    else {
        tracing::warn!(dir = %input_dir.display(), "no cover PNG files found");
        return Ok(None);
    };
    let team_slide = files
        .iter()
        .find(|p| p.file_name().is_some_and(|n| n == TEAM_SLIDE_FILE))
        .cloned();
    if team_slide.is_none() {
        tracing::debug!(file = TEAM_SLIDE_FILE, "no team slide image; closing page will be left out");
    }

    tracing::debug!(
        deck = %deck.display(),
        cover = %cover_image.display(),
        "selected input files"
    );
    Ok(Some(InputSet {
        deck,
        cover_image,
        team_slide,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_newest_prefers_latest_time() {
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + Duration::from_secs(10);
        let picked = newest(vec![
            (PathBuf::from("a.pdf"), t1),
            (PathBuf::from("b.pdf"), t0),
        ]);
        assert_eq!(picked, Some(PathBuf::from("a.pdf")));
    }

    #[test]
    fn test_newest_breaks_ties_by_path() {
        let t = SystemTime::UNIX_EPOCH;
        let picked = newest(vec![
            (PathBuf::from("b.pdf"), t),
            (PathBuf::from("a.pdf"), t),
        ]);
        assert_eq!(picked, Some(PathBuf::from("b.pdf")));
        assert_eq!(newest(Vec::new()), None);
    }

    #[test]
    fn test_missing_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("inputs");
        assert_eq!(find_latest_files(&input).unwrap(), None);
        assert!(input.is_dir());
    }

    #[test]
    fn test_no_pdf_or_no_png() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "cover.png");
        assert_eq!(find_latest_files(dir.path()).unwrap(), None);

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "deck.pdf");
        touch(dir.path(), TEAM_SLIDE_FILE);
        assert_eq!(find_latest_files(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_finds_inputs_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let deck = touch(dir.path(), "Deck.PDF");
        let cover = touch(dir.path(), "Cover.Png");
        let team = touch(dir.path(), TEAM_SLIDE_FILE);
        touch(dir.path(), "notes.txt");

        let inputs = find_latest_files(dir.path()).unwrap().unwrap();
        assert_eq!(inputs.deck, deck);
        assert_eq!(inputs.cover_image, cover);
        assert_eq!(inputs.team_slide, Some(team));
    }

    #[test]
    fn test_team_slide_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "deck.pdf");
        touch(dir.path(), "cover.png");
        let inputs = find_latest_files(dir.path()).unwrap().unwrap();
        assert_eq!(inputs.team_slide, None);
    }

    #[test]
    fn test_team_slide_name_must_match_exactly() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "deck.pdf");
        let cover = touch(dir.path(), "cover.png");
        touch(dir.path(), "Team-Slide.PNG");

        let inputs = find_latest_files(dir.path()).unwrap().unwrap();
        assert_eq!(inputs.cover_image, cover);
        assert_eq!(inputs.team_slide, None);
    }
}
