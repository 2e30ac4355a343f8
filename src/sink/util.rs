use std::{fs, io, path::Path};

/// 确保输出文件的父目录存在
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty() && !p.exists())
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
