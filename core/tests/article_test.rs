/// Article lookup, slug validation and text extraction tests
use narration_core::article::{
    extract_speakable_text, parse_slug, validate_slug, ArticleSource, FsArticleSource,
};
use narration_core::{NarrationError, SlugParam};
use std::fs;

fn segs(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

mod extraction {
    use super::*;

    #[test]
    fn test_end_to_end_scenario() {
        let src = "---\ntitle: X\n---\nHello `world` *there*";
        assert_eq!(extract_speakable_text(src), "Hello there");
    }

    #[test]
    fn test_full_article() {
        let src = r#"---
title: "Streams"
tags: [rust]
---

import Callout from '../components/Callout'

# Working with streams

Streams are **lazy**. See [the guide](/guide) for details.

```rust
let s = stream::iter(vec![1, 2, 3]);
```

<Callout type="info">
Polling drives them.
</Callout>

---

1. Create
2. Poll
"#;
        assert_eq!(
            extract_speakable_text(src),
            "Working with streams\n\nStreams are lazy. See the guide for details.\n\nPolling drives them.\n\nCreate\nPoll"
        );
    }

    #[test]
    fn test_code_only_article_is_empty() {
        assert_eq!(extract_speakable_text("```\nfn main() {}\n```\n"), "");
    }
}

mod slugs {
    use super::*;

    #[test]
    fn test_accepts_string_and_list_forms() {
        let from_path = parse_slug(Some(&SlugParam::from("guides/intro-1"))).unwrap();
        let from_list =
            parse_slug(Some(&SlugParam::Segments(segs(&["guides", "intro-1"])))).unwrap();
        assert_eq!(from_path, segs(&["guides", "intro-1"]));
        assert_eq!(from_path, from_list);
    }

    #[test]
    fn test_rejects_traversal_and_empty() {
        for bad in [
            segs(&[]),
            segs(&[""]),
            segs(&["..", "etc"]),
            segs(&["a/b"]),
            segs(&["a b"]),
            segs(&["a", ""]),
            segs(&["post.mdx"]),
        ] {
            assert!(
                matches!(validate_slug(&bad), Err(NarrationError::InvalidSlug(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(matches!(parse_slug(None), Err(NarrationError::InvalidSlug(_))));
        assert!(matches!(
            parse_slug(Some(&SlugParam::from("a//b"))),
            Err(NarrationError::InvalidSlug(_))
        ));
    }
}

mod fs_source {
    use super::*;

    #[tokio::test]
    async fn test_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog/post")).unwrap();
        fs::write(dir.path().join("blog/post.md"), "from md").unwrap();
        fs::write(dir.path().join("blog/post/index.mdx"), "from index").unwrap();

        let source = FsArticleSource::new(dir.path());
        assert_eq!(source.load(&segs(&["blog", "post"])).await.unwrap(), "from md");

        fs::write(dir.path().join("blog/post.mdx"), "from mdx").unwrap();
        assert_eq!(source.load(&segs(&["blog", "post"])).await.unwrap(), "from mdx");

        fs::remove_file(dir.path().join("blog/post.mdx")).unwrap();
        fs::remove_file(dir.path().join("blog/post.md")).unwrap();
        assert_eq!(source.load(&segs(&["blog", "post"])).await.unwrap(), "from index");
    }

    #[tokio::test]
    async fn test_directory_named_like_candidate_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs/b.mdx")).unwrap();
        fs::create_dir_all(dir.path().join("docs/b.md")).unwrap();
        fs::create_dir_all(dir.path().join("docs/b")).unwrap();
        fs::write(dir.path().join("docs/b/index.md"), "from index").unwrap();

        let source = FsArticleSource::new(dir.path());
        assert_eq!(source.load(&segs(&["docs", "b"])).await.unwrap(), "from index");

        fs::remove_file(dir.path().join("docs/b/index.md")).unwrap();
        match source.load(&segs(&["docs", "b"])).await {
            Err(NarrationError::ArticleNotFound(slug)) => assert_eq!(slug, "docs/b"),
            other => panic!("expected ArticleNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_article() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsArticleSource::new(dir.path());
        match source.load(&segs(&["nope"])).await {
            Err(NarrationError::ArticleNotFound(slug)) => assert_eq!(slug, "nope"),
            other => panic!("expected ArticleNotFound, got {other:?}"),
        }
    }
}
