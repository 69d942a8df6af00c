use docsage_core::config::{Config, IndexBackend, Settings};
use docsage_core::types::keys;
use docsage_core::{Chunker, ChunkingConfig, DocStatus, DocType, Error, RawDocument};

fn prose(len: usize) -> String {
    let text: String = (0..100)
        .map(|i| format!("Sentence {i:03} explains how the documentation assistant splits long technical text. "))
        .collect();
    text.chars().take(len).collect()
}

#[test]
fn long_prose_splits_on_sentence_ends() {
    let text = prose(2500);
    let doc = RawDocument::new("guide.md", text.clone());
    let chunks = Chunker::default().chunk(&doc);

    assert!((3..=4).contains(&chunks.len()), "got {} chunks", chunks.len());
    for c in &chunks {
        assert!(c.content.chars().count() <= 1100, "chunk too long: {}", c.content.len());
        // chunks cut inside the text stop right after a sentence
        if !text.trim_end().ends_with(&c.content) {
            assert!(c.content.ends_with('.'), "chunk should end on a sentence: {:?}", &c.content[c.content.len() - 20..]);
        }
    }
}

#[test]
fn consecutive_chunks_overlap() {
    let chunks = Chunker::default().split_text(&prose(2500));
    for pair in chunks.windows(2) {
        let head: String = pair[1].chars().take(30).collect();
        assert!(pair[0].contains(&head), "next chunk should start inside the previous one");
    }
}

#[test]
fn short_content_is_one_trimmed_chunk() {
    let doc = RawDocument::new("notes.txt", "  Short text\n\n");
    let chunks = Chunker::default().chunk(&doc);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "Short text");
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].total_chunks, 1);
    assert_eq!(chunks[0].doc_type, DocType::Text);
    assert_eq!(chunks[0].metadata.original_length, 14);
    assert_eq!(chunks[0].metadata.chunk_length, 10);
}

#[test]
fn empty_or_blank_content_yields_nothing() {
    let chunker = Chunker::default();
    assert!(chunker.chunk(&RawDocument::new("a.md", "")).is_empty());
    assert!(chunker.chunk(&RawDocument::new("a.md", "   \n\t ")).is_empty());
}

#[test]
fn overlap_must_be_smaller_than_size() {
    let err = Chunker::new(ChunkingConfig { chunk_size: 100, chunk_overlap: 100 }).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    let err = Chunker::new(ChunkingConfig { chunk_size: 0, chunk_overlap: 0 }).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(Chunker::new(ChunkingConfig { chunk_size: 100, chunk_overlap: 99 }).is_ok());
}

#[test]
fn chunk_indices_are_contiguous() {
    let chunker = Chunker::new(ChunkingConfig { chunk_size: 300, chunk_overlap: 50 }).unwrap();
    let chunks = chunker.chunk(&RawDocument::new("https://docs.example.com/page", prose(2000)));
    assert!(chunks.len() > 1);
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.chunk_index, i);
        assert_eq!(c.total_chunks, chunks.len());
        assert_eq!(c.doc_type, DocType::Web);
        assert_eq!(c.source, "https://docs.example.com/page");
    }
}

#[test]
fn text_without_markers_uses_fixed_windows() {
    let chunker = Chunker::new(ChunkingConfig { chunk_size: 10, chunk_overlap: 2 }).unwrap();
    let chunks = chunker.split_text("abcdefghijklmnopqrstuvwxyz");
    assert_eq!(chunks[0], "abcdefghij");
    assert_eq!(chunks[1], "ijklmnopqr");
    assert!(chunks.iter().all(|c| c.chars().count() <= 10));
}

#[test]
fn flattened_metadata_lets_explicit_fields_win() {
    let doc = RawDocument::new("api/openapi.yaml", "Some endpoint docs.")
        .with_metadata("team", "platform")
        .with_metadata(keys::SOURCE, "overridden-source")
        .with_metadata(keys::CHUNK_LENGTH, "999");
    let chunk = Chunker::default().chunk(&doc).remove(0);
    let meta = chunk.flatten_metadata();

    assert_eq!(meta["team"], "platform");
    assert_eq!(meta[keys::SOURCE], "overridden-source");
    assert_eq!(meta[keys::CHUNK_LENGTH], "19");
    assert_eq!(meta[keys::ORIGINAL_LENGTH], "19");
    assert_eq!(meta[keys::DOC_TYPE], "api_spec");
    assert_eq!(meta[keys::STATUS], "success");
    assert_eq!(meta[keys::CHUNK_INDEX], "0");
    assert_eq!(meta[keys::TOTAL_CHUNKS], "1");
}

#[test]
fn doc_type_classification_table() {
    let cases = [
        ("docs/readme.md", DocType::Markdown),
        ("Guide.MARKDOWN", DocType::Markdown),
        ("site/index.html", DocType::Html),
        ("page.htm", DocType::Html),
        ("manual.pdf", DocType::Pdf),
        ("specs/openapi.json", DocType::ApiSpec),
        ("swagger.yml", DocType::ApiSpec),
        ("settings.yaml", DocType::Config),
        ("package.json", DocType::Config),
        ("https://example.com/docs", DocType::Web),
        ("notes.txt", DocType::Text),
    ];
    for (source, expected) in cases {
        assert_eq!(DocType::classify(source), expected, "source {source}");
        assert_eq!(expected.as_str().parse::<DocType>().unwrap(), expected);
    }
    // substring, not suffix, matching
    assert_eq!(DocType::classify("https://example.com/readme.md?raw=1"), DocType::Markdown);
}

#[test]
fn unknown_doc_type_name_is_rejected() {
    let err = "spreadsheet".parse::<DocType>().unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(err.to_string().contains("spreadsheet"));
    assert!("Markdown".parse::<DocType>().is_err(), "names are case-sensitive");
}

#[test]
fn doc_status_renders_reasons() {
    assert_eq!(DocStatus::Success.to_string(), "success");
    assert_eq!(DocStatus::UnsupportedFormat(".exe".into()).to_string(), "Unsupported format: .exe");
    assert_eq!(DocStatus::Error("boom".into()).to_string(), "Error: boom");
    assert!(!RawDocument::failed("x", "boom").is_indexable());
    assert!(RawDocument::new("x", "text").is_indexable());
}

#[test]
fn config_defaults_without_files() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.retrieval.max_results, 5);
        assert_eq!(settings.index.collection, "documentation_chunks");
        assert_eq!(settings.embedding.model, "all-MiniLM-L6-v2");
        Ok(())
    });
}

#[test]
fn config_layers_file_env_file_and_env_vars() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file(
            "config.toml",
            r#"
            [chunking]
            chunk_size = 600
            chunk_overlap = 100
            [index]
            backend = "memory"
            collection = "base"
            "#,
        )?;
        jail.create_file("config.test.toml", "[index]\ncollection = \"test_chunks\"\n")?;
        jail.set_env("APP_CHUNKING__CHUNK_OVERLAP", "50");

        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.chunking.chunk_size, 600);
        assert_eq!(settings.chunking.chunk_overlap, 50);
        assert_eq!(settings.index.backend, IndexBackend::Memory);
        assert_eq!(settings.index.collection, "test_chunks");
        let size: usize = config.get("chunking.chunk_size").map_err(|e| e.to_string())?;
        assert_eq!(size, 600);
        Ok(())
    });
}

#[test]
fn config_rejects_invalid_chunking() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file("config.toml", "[chunking]\nchunk_size = 100\nchunk_overlap = 150\n")?;
        let config = Config::load().map_err(|e| e.to_string())?;
        assert!(matches!(config.settings(), Err(Error::InvalidConfig(_))));
        Ok(())
    });
}

#[test]
fn expand_path_handles_env_vars() {
    std::env::set_var("DOCSAGE_TEST_ROOT", "/tmp/docsage-root");
    let p = docsage_core::config::expand_path("${DOCSAGE_TEST_ROOT}/lancedb");
    assert_eq!(p, std::path::PathBuf::from("/tmp/docsage-root/lancedb"));
    let base = std::path::Path::new("/srv");
    assert_eq!(docsage_core::config::resolve_with_base(base, "data"), std::path::PathBuf::from("/srv/data"));
    assert_eq!(docsage_core::config::resolve_with_base(base, "/abs"), std::path::PathBuf::from("/abs"));
}
