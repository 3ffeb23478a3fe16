use std::io;
use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::crypto::{ALPHA_NUM, pseudorandom_string};

/// Atomically creates a file with the given contents, overwriting
/// it if one exists.
///
/// The buffer is written into a temporary sibling of `path`, synced,
/// and then renamed over the destination.
pub async fn safe_write_all<P: AsRef<Path>, B: AsRef<[u8]>>(path: P, buf: B) -> io::Result<()> {
    let tmp_ext = format!("sync-{}", pseudorandom_string(ALPHA_NUM, 6));
    let tmp_path = path.as_ref().with_extension(tmp_ext);

    let mut tmp_file = fs::File::create(&tmp_path).await?;
    tmp_file.write_all(buf.as_ref()).await?;
    tmp_file.flush().await?;
    tmp_file.sync_all().await?;
    drop(tmp_file);

    fs::rename(&tmp_path, path.as_ref()).await
}
