use crate::err::ServeError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// A resolved selector target. Absence is not a variant; it surfaces as
/// `ServeError::NotFound`.
pub enum Resource {
    File(File),
    Directory(PathBuf),
}

/// Lookup keys stay inside the served root: "." (the root itself) or
/// slash-separated segments with no empty, "." or ".." components.
fn contained(lookup: &str) -> bool {
    lookup == "."
        || (!lookup.is_empty()
            && lookup
                .split('/')
                .all(|seg| !seg.is_empty() && seg != "." && seg != ".."))
}

/// Open the node a lookup key names. Directories holding a readable `index`
/// child resolve to that file instead, so no listing is ever generated for
/// them.
pub async fn resolve(root: &Path, lookup: &str) -> Result<Resource, ServeError> {
    if !contained(lookup) {
        return Err(ServeError::NotFound(io::Error::new(
            io::ErrorKind::NotFound,
            format!("invalid lookup key {:?}", lookup),
        )));
    }

    let path = root.join(lookup);
    let file = File::open(&path).await.map_err(ServeError::NotFound)?;
    let meta = file.metadata().await.map_err(ServeError::Stat)?;

    if meta.is_dir() {
        match File::open(path.join("index")).await {
            Ok(index) => Ok(Resource::File(index)),
            Err(_) => Ok(Resource::Directory(path)),
        }
    } else {
        Ok(Resource::File(file))
    }
}
