use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tracing::debug;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav", "flac", "m4a", "opus"];

/// A sound file from the local library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    pub name: String,
    pub path: PathBuf,
}

/// Local library of sound clips, read from a directory tree.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    root: PathBuf,
}

impl SoundLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every audio file under the root, sorted by name.
    pub fn list(&self) -> Result<Vec<Sound>> {
        let mut sounds = Vec::new();
        collect(&self.root, &mut sounds)
            .with_context(|| format!("Failed to read sound library at {}", self.root.display()))?;
        sounds.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("🎵 {} sonidos en {}", sounds.len(), self.root.display());
        Ok(sounds)
    }

    /// Sounds whose name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Result<Vec<Sound>> {
        let query = query.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|sound| sound.name.to_lowercase().contains(&query))
            .collect())
    }

    pub fn random(&self) -> Result<Option<Sound>> {
        let sounds = self.list()?;
        Ok(sounds.choose(&mut rand::thread_rng()).cloned())
    }
}

fn collect(dir: &Path, out: &mut Vec<Sound>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(&path, out)?;
            continue;
        }

        let is_audio = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if !is_audio {
            continue;
        }

        if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
            out.push(Sound {
                name: name.to_string(),
                path: path.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn library() -> (tempfile::TempDir, SoundLibrary) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Angela_Laugh.ogg"), b"").unwrap();
        fs::write(dir.path().join("Roland_Sigh.mp3"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("music")).unwrap();
        fs::write(dir.path().join("music").join("Gone_Angels.WAV"), b"").unwrap();

        let library = SoundLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn lists_audio_files_recursively() {
        let (_dir, library) = library();
        let names: Vec<String> = library.list().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Angela_Laugh", "Gone_Angels", "Roland_Sigh"]);
    }

    #[test]
    fn search_ignores_case() {
        let (_dir, library) = library();
        let found = library.search("angel").unwrap();
        assert_eq!(found.len(), 2);

        let roland = library.search("ROLAND").unwrap();
        assert_eq!(roland.len(), 1);
        assert_eq!(roland[0].name, "Roland_Sigh");
        assert!(library.search("binah").unwrap().is_empty());
    }

    #[test]
    fn random_pick_comes_from_the_library() {
        let (_dir, library) = library();
        let sound = library.random().unwrap().unwrap();
        assert!(["Angela_Laugh", "Gone_Angels", "Roland_Sigh"].contains(&sound.name.as_str()));

        let empty = tempfile::tempdir().unwrap();
        assert!(SoundLibrary::new(empty.path()).random().unwrap().is_none());
    }

    #[test]
    fn missing_root_is_an_error() {
        let library = SoundLibrary::new("/definitely/not/here");
        assert!(library.list().is_err());
    }
}
