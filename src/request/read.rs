use std::{fs, io};
use std::io::Error;
use std::path::{Path, PathBuf};

/// JSON files directly inside `dir`, sorted by path
pub fn get_message_paths(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut paths = fs::read_dir(dir)?
        .map(|res| res.map(|e| e.path()))
        .collect::<Result<Vec<PathBuf>, io::Error>>()?;
    paths.retain(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "json"));
    paths.sort();
    Ok(paths)
}
