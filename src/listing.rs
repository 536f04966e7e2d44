use crate::err::ServeError;
use std::fs::Metadata;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::SystemTime;

/// World-read permission, the one bit that decides listing visibility.
/// Clearing it on a node hides the node from listings even when the server
/// process itself could still read it.
const OTHER_READ: u32 = 0o004;

enum Order {
    ModifiedDesc,
    NameAsc,
    NameDesc,
}

struct Entry {
    name: String,
    modified: Option<SystemTime>,
    meta: Option<Metadata>,
}

/// Generate the listing body for a directory that has no `index` child.
///
/// Sentinel files in the directory shape the output: `.header` contents are
/// emitted verbatim before the entries, `.modified` selects newest-first
/// order and takes priority, `.desc` reverses the default ascending name
/// order. Dot-named files, entries without readable metadata, and entries
/// lacking the other-read bit are left out. Missing sentinels are never an
/// error; only a failed enumeration of the directory itself is.
pub async fn generate(dir: &Path) -> Result<Vec<u8>, ServeError> {
    let mut out = Vec::new();

    if let Ok(header) = tokio::fs::read(dir.join(".header")).await {
        out.extend_from_slice(&header);
    }

    let modified_order = tokio::fs::metadata(dir.join(".modified")).await.is_ok();
    let ascending = tokio::fs::metadata(dir.join(".desc")).await.is_err();

    let mut entries = Vec::new();
    let mut dirents = tokio::fs::read_dir(dir)
        .await
        .map_err(ServeError::Enumerate)?;
    while let Some(dirent) = dirents
        .next_entry()
        .await
        .map_err(ServeError::Enumerate)?
    {
        let meta = dirent.metadata().await.ok();
        entries.push(Entry {
            name: dirent.file_name().to_string_lossy().into_owned(),
            modified: meta.as_ref().and_then(|m| m.modified().ok()),
            meta,
        });
    }

    let order = if modified_order {
        Order::ModifiedDesc
    } else if ascending {
        Order::NameAsc
    } else {
        Order::NameDesc
    };
    entries.sort_by(|a, b| match order {
        // newest first; an unreadable mtime sorts as oldest
        Order::ModifiedDesc => b.modified.cmp(&a.modified),
        Order::NameAsc => a.name.cmp(&b.name),
        Order::NameDesc => b.name.cmp(&a.name),
    });

    for entry in entries {
        if entry.name.starts_with('.') {
            continue;
        }
        let Some(meta) = entry.meta else { continue };
        if meta.permissions().mode() & OTHER_READ == 0 {
            continue;
        }
        out.extend_from_slice(b"=> ");
        out.extend_from_slice(entry.name.as_bytes());
        if meta.is_dir() {
            out.push(b'/');
        }
        out.push(b'\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn world_readable(dir: &TempDir, name: &str, contents: &[u8]) {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    }

    fn set_mtime(dir: &TempDir, name: &str, time: SystemTime) {
        let file = fs::File::options()
            .write(true)
            .open(dir.path().join(name))
            .unwrap();
        file.set_modified(time).unwrap();
    }

    async fn listing(dir: &TempDir) -> String {
        String::from_utf8(generate(dir.path()).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn header_then_ascending_names() {
        let tmp = TempDir::new().unwrap();
        world_readable(&tmp, "a", b"");
        world_readable(&tmp, "B", b"");
        fs::write(tmp.path().join(".header"), b"Welcome\n").unwrap();

        // byte-wise comparison puts uppercase before lowercase
        assert_eq!(listing(&tmp).await, "Welcome\n=> B\n=> a\n");
    }

    #[tokio::test]
    async fn desc_sentinel_reverses_name_order() {
        let tmp = TempDir::new().unwrap();
        world_readable(&tmp, "a", b"");
        world_readable(&tmp, "B", b"");
        fs::write(tmp.path().join(".header"), b"Welcome\n").unwrap();
        fs::write(tmp.path().join(".desc"), b"").unwrap();

        assert_eq!(listing(&tmp).await, "Welcome\n=> a\n=> B\n");
    }

    #[tokio::test]
    async fn modified_sentinel_overrides_desc() {
        let tmp = TempDir::new().unwrap();
        world_readable(&tmp, "a", b"");
        world_readable(&tmp, "B", b"");
        world_readable(&tmp, "c", b"");
        fs::write(tmp.path().join(".desc"), b"").unwrap();
        fs::write(tmp.path().join(".modified"), b"").unwrap();

        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        set_mtime(&tmp, "B", base);
        set_mtime(&tmp, "c", base + Duration::from_secs(60));
        set_mtime(&tmp, "a", base + Duration::from_secs(120));

        // newest first, matching neither name ordering
        assert_eq!(listing(&tmp).await, "=> a\n=> c\n=> B\n");
    }

    #[tokio::test]
    async fn directories_get_a_slash_suffix() {
        let tmp = TempDir::new().unwrap();
        world_readable(&tmp, "file", b"");
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::set_permissions(tmp.path().join("sub"), fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(listing(&tmp).await, "=> file\n=> sub/\n");
    }

    #[tokio::test]
    async fn other_read_bit_gates_visibility() {
        let tmp = TempDir::new().unwrap();
        world_readable(&tmp, "public", b"");
        world_readable(&tmp, "secret", b"");
        fs::set_permissions(
            tmp.path().join("secret"),
            fs::Permissions::from_mode(0o640),
        )
        .unwrap();

        assert_eq!(listing(&tmp).await, "=> public\n");

        // restoring the bit is the only change needed to relist it
        fs::set_permissions(
            tmp.path().join("secret"),
            fs::Permissions::from_mode(0o644),
        )
        .unwrap();
        assert_eq!(listing(&tmp).await, "=> public\n=> secret\n");
    }

    #[tokio::test]
    async fn hidden_entry_stays_hidden_under_every_ordering() {
        let tmp = TempDir::new().unwrap();
        world_readable(&tmp, "visible", b"");
        world_readable(&tmp, "secret", b"");
        fs::set_permissions(
            tmp.path().join("secret"),
            fs::Permissions::from_mode(0o600),
        )
        .unwrap();

        assert_eq!(listing(&tmp).await, "=> visible\n");
        fs::write(tmp.path().join(".desc"), b"").unwrap();
        assert_eq!(listing(&tmp).await, "=> visible\n");
        fs::write(tmp.path().join(".modified"), b"").unwrap();
        assert_eq!(listing(&tmp).await, "=> visible\n");
    }

    #[tokio::test]
    async fn dotfiles_never_listed() {
        let tmp = TempDir::new().unwrap();
        world_readable(&tmp, "shown", b"");
        world_readable(&tmp, ".hidden", b"");
        fs::write(tmp.path().join(".header"), b"").unwrap();
        fs::write(tmp.path().join(".modified"), b"").unwrap();
        fs::write(tmp.path().join(".desc"), b"").unwrap();

        assert_eq!(listing(&tmp).await, "=> shown\n");
    }

    #[tokio::test]
    async fn empty_directory_yields_empty_body() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(listing(&tmp).await, "");
    }

    #[tokio::test]
    async fn unlistable_directory_is_an_enumeration_error() {
        let tmp = TempDir::new().unwrap();
        match generate(&tmp.path().join("gone")).await {
            Err(ServeError::Enumerate(_)) => {}
            _ => panic!("expected Enumerate"),
        }
    }
}
