use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::task::JoinSet;

use super::CrawlRequest;
use crate::{info_time, warn_time, Error, Result};

struct FetchedImage {
    url: String,
    bytes: Vec<u8>,
    extension: &'static str,
}

/// Downloads `urls` in blocks of `threads` concurrent requests and writes them
/// as `{index:06}.{ext}` into the request's root directory.
/// Returns the number of files written, never more than `request.max_num`.
pub(crate) async fn download_images(
    client: &Client,
    urls: Vec<String>,
    request: &CrawlRequest,
    threads: usize,
) -> Result<usize> {
    tokio::fs::create_dir_all(&request.root_dir).await?;

    let mut index = request.file_idx_offset;
    let mut saved = 0;

    for block in urls.chunks(threads.max(1)) {
        if saved >= request.max_num {
            break;
        }

        let mut task_set = JoinSet::new();
        for url in block {
            task_set.spawn({
                // Client uses Arc so we can clone cheaply
                let client = client.clone();
                let url = url.clone();
                async move { fetch_image(client, url).await }
            });
        }

        while let Some(task) = task_set.join_next().await {
            let image = match task? {
                Ok(image) => image,
                Err(e) => {
                    warn_time!("Skipping image: {}", e);
                    continue;
                }
            };
            if saved >= request.max_num {
                continue;
            }

            let (next_index, path) = next_file_path(
                &request.root_dir,
                index,
                image.extension,
                request.overwrite,
            );
            index = next_index;
            tokio::fs::write(&path, &image.bytes).await?;
            saved += 1;
            info_time!("Saved {} as {}", image.url, path.display());
        }
    }
    Ok(saved)
}

async fn fetch_image(client: Client, url: String) -> Result<FetchedImage> {
    let res = client.get(&url).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(Error::UnexpectedStatus { url, status });
    }

    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let Some(extension) = image_extension(&content_type, &url) else {
        return Err(Error::NotAnImage { url, content_type });
    };

    let bytes = res.bytes().await?.to_vec();
    Ok(FetchedImage {
        url,
        bytes,
        extension,
    })
}

/// Picks the file extension from the content type, falling back to the URL
/// path when the server is vague. `None` when the response is not an image.
fn image_extension(content_type: &str, url: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/bmp" => Some("bmp"),
        "" | "application/octet-stream" | "binary/octet-stream" => extension_from_url(url),
        m if m.starts_with("image/") => extension_from_url(url).or(Some("jpg")),
        _ => None,
    }
}

fn extension_from_url(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let ext = path.rsplit_once('.')?.1.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        "bmp" => Some("bmp"),
        _ => None,
    }
}

/// Next numbered path after `index`. Without `overwrite`, occupied indices are
/// skipped.
fn next_file_path(dir: &Path, index: usize, extension: &str, overwrite: bool) -> (usize, PathBuf) {
    let mut index = index + 1;
    loop {
        let path = dir.join(format!("{index:06}.{extension}"));
        if overwrite || !path.exists() {
            return (index, path);
        }
        index += 1;
    }
}
