use std::path::{Component, Path};

use crate::error::TransferError;

/// Checks that a destination path relative to a base directory cannot
/// escape it.
///
/// Rejects empty paths, absolute paths, `..` components, and Windows drive
/// or UNC prefixes (on every platform, so a path accepted here is safe to
/// hand to any agent).
pub fn validate_relative_path(relative: &str) -> Result<(), TransferError> {
    if relative.is_empty() {
        return Err(invalid("empty destination path"));
    }

    let bytes = relative.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(invalid(format!("drive prefix not allowed: {relative}")));
    }
    if relative.starts_with("\\\\") {
        return Err(invalid(format!("UNC path not allowed: {relative}")));
    }

    for component in Path::new(relative).components() {
        match component {
            Component::ParentDir => {
                return Err(invalid(format!(
                    "parent directory traversal not allowed: {relative}"
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid(format!("absolute path not allowed: {relative}")));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

fn invalid(msg: impl Into<String>) -> TransferError {
    TransferError::InvalidArgument(msg.into())
}
