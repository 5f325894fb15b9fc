use std::path::Path;

use codevec_core::config::{resolve_with_base, Config};
use codevec_core::types::Distance;
use figment::Jail;

#[test]
fn defaults_apply_without_files() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.store.collection, "code_embeddings");
        assert_eq!(settings.store.distance, Distance::Cosine);
        assert_eq!(settings.embedding.dimension, 1536);
        assert_eq!(settings.embedding.model, "text-embedding-ada-002");
        assert_eq!((settings.chunking.max_size, settings.chunking.overlap), (1000, 200));
        assert_eq!(settings.source.extensions, vec![".ts", ".tsx", ".js", ".jsx"]);
        assert_eq!(settings.query.limit, 5);
        Ok(())
    });
}

#[test]
fn file_then_env_layering() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file(
            "config.toml",
            r#"
            [store]
            collection = "from_file"
            distance = "dot"

            [chunking]
            max_size = 400
            overlap = 40
            "#,
        )?;
        jail.set_env("APP_STORE__COLLECTION", "from_env");
        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.store.collection, "from_env");
        assert_eq!(settings.store.distance, Distance::Dot);
        assert_eq!(settings.chunking.max_size, 400);
        let overlap: usize = config.get("chunking.overlap").map_err(|e| e.to_string())?;
        assert_eq!(overlap, 40);
        Ok(())
    });
}

#[test]
fn env_specific_file_overrides_base() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("RUST_ENV", "prod");
        jail.create_file("config.toml", "[query]\nlimit = 3\n")?;
        jail.create_file("config.prod.toml", "[query]\nlimit = 9\n")?;
        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.query.limit, 9);
        Ok(())
    });
}

#[test]
fn invalid_chunking_is_rejected_at_load() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file("config.toml", "[chunking]\nmax_size = 100\noverlap = 100\n")?;
        assert!(Config::load().is_err());
        Ok(())
    });
}

#[test]
fn resolve_relative_and_absolute_paths() {
    let base = Path::new("/srv/project");
    assert_eq!(resolve_with_base(base, "data/lancedb"), Path::new("/srv/project/data/lancedb"));
    assert_eq!(resolve_with_base(base, "/var/lib/codevec"), Path::new("/var/lib/codevec"));
}
