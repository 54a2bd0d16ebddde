use crate::{NarrationError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where article bodies come from.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Raw markdown/MDX body for an already validated slug
    async fn load(&self, slug: &[String]) -> Result<String>;
}

/// Articles stored as `.mdx`/`.md` files below a content root.
pub struct FsArticleSource {
    root: PathBuf,
}

impl FsArticleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate files in lookup order
    fn candidates(&self, slug: &[String]) -> Vec<PathBuf> {
        let mut base = self.root.clone();
        for segment in slug {
            base.push(segment);
        }
        let mut out = Vec::with_capacity(4);
        for ext in ["mdx", "md"] {
            out.push(base.with_extension(ext));
        }
        for index in ["index.mdx", "index.md"] {
            out.push(base.join(index));
        }
        out
    }
}

#[async_trait]
impl ArticleSource for FsArticleSource {
    async fn load(&self, slug: &[String]) -> Result<String> {
        for path in self.candidates(slug) {
            // a directory named like a candidate file is not an article
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(NarrationError::IoError(e)),
            }
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => {
                    debug!(target: "narration", path = %path.display(), "Loaded article source");
                    return Ok(body);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(NarrationError::IoError(e)),
            }
        }
        Err(NarrationError::ArticleNotFound(slug.join("/")))
    }
}
