use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::env;

const KEY_BYTES: usize = 64;

/// Signing key kept on disk so issued tokens stay valid across restarts.
/// Falls back to an in-memory key when the file cannot be written.
pub(super) fn persisted_key() -> String {
    let path = key_path();
    if let Some(existing) = read_key(&path) {
        return existing;
    }

    let mut bytes = [0_u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let fresh = URL_SAFE_NO_PAD.encode(bytes);

    match write_key(&path, &fresh) {
        Ok(()) => fresh,
        // Lost a race with another process starting at the same time.
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => read_key(&path).unwrap_or(fresh),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "secret key not persisted");
            fresh
        }
    }
}

fn write_key(path: &Path, key: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(key.as_bytes())
}

fn read_key(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    Some(contents.trim().to_string()).filter(|key| !key.is_empty())
}

fn key_path() -> PathBuf {
    env::var("SECRET_KEY_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".secret_key"))
}
