use crate::core::io::Storage;
use crate::core::story::{ImageRef, Story};
use crate::services::image::image_error;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

/// Writes a finished story to disk as `story.json`, image files and `book.md`.
pub struct BookBinder {
    storage: Arc<dyn Storage>,
    output_folder: String,
}

impl BookBinder {
    pub fn new(storage: Arc<dyn Storage>, output_folder: &str) -> Self {
        Self {
            storage,
            output_folder: output_folder.to_string(),
        }
    }

    /// Returns the directory the book was written to.
    pub async fn bind(&self, story: &Story) -> Result<String> {
        let book_dir = self.unique_book_dir(&story.title).await?;
        info!("Binding \"{}\" into {}", story.title, book_dir);

        let cover_link = self.write_image(&book_dir, "cover", &story.cover).await?;

        let mut page_links = Vec::with_capacity(story.pages.len());
        for (i, page) in story.pages.iter().enumerate() {
            let name = format!("page_{:02}", i + 1);
            page_links.push(self.write_image(&book_dir, &name, &page.image).await?);
        }

        let json = serde_json::to_string_pretty(story)?;
        self.storage
            .write(&join(&book_dir, "story.json"), json.as_bytes())
            .await
            .context("Failed to write story.json")?;

        let markdown = render_markdown(story, &cover_link, &page_links);
        self.storage
            .write(&join(&book_dir, "book.md"), markdown.as_bytes())
            .await
            .context("Failed to write book.md")?;

        Ok(book_dir)
    }

    async fn unique_book_dir(&self, title: &str) -> Result<String> {
        let slug = slugify(title);
        let mut candidate = join(&self.output_folder, &slug);
        let mut n = 2;
        while self.storage.exists(&candidate).await? {
            candidate = join(&self.output_folder, &format!("{}-{}", slug, n));
            n += 1;
        }
        Ok(candidate)
    }

    /// Decodes inline images to a file and returns its name; URLs are linked as-is.
    async fn write_image(&self, book_dir: &str, name: &str, image: &ImageRef) -> Result<String> {
        let (mime_type, bytes) = match image.decode_inline() {
            Ok(Some(decoded)) => decoded,
            Ok(None) => return Ok(image.to_string()),
            Err(e) => {
                warn!("Could not decode {} image: {:#}", name, e);
                return Ok(image_error().to_string());
            }
        };

        let file_name = format!("{}.{}", name, extension_for(&mime_type));
        self.storage
            .write(&join(book_dir, &file_name), &bytes)
            .await
            .with_context(|| format!("Failed to write {}", file_name))?;
        Ok(file_name)
    }
}

fn join(dir: &str, name: &str) -> String {
    Path::new(dir).join(name).to_string_lossy().to_string()
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Lowercase ASCII alphanumerics separated by single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "storybook".to_string()
    } else {
        slug
    }
}

fn render_markdown(story: &Story, cover_link: &str, page_links: &[String]) -> String {
    let mut out = format!("# {}\n\n![Cover]({})\n", story.title, cover_link);
    for (i, (page, link)) in story.pages.iter().zip(page_links).enumerate() {
        out.push_str(&format!(
            "\n## Page {}\n\n![Page {}]({})\n\n{}\n",
            i + 1,
            i + 1,
            link,
            page.text
        ));
    }
    out
}
