//! Behavioral tests for CustomGenerator: formatting, caching and error propagation.

use ai_lib_textgen::cache::{
    CacheBackend, CacheConfig, CacheKey, CacheKeyGenerator, CacheManager, DiskCache, MemoryCache,
};
use ai_lib_textgen::generator::infallible;
use ai_lib_textgen::{
    CustomGenerator, Error, GenerationConfig, GenerationResponse, Message, Prompt, TextGenerator,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Uppercasing generator that records how often it was invoked.
fn counting_upper() -> (CustomGenerator, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let generator = CustomGenerator::new(infallible(move |p: &str| {
        seen.fetch_add(1, Ordering::SeqCst);
        p.to_uppercase()
    }));
    (generator, calls)
}

fn user_hi() -> Prompt {
    Prompt::from(vec![Message::user("hi")])
}

#[tokio::test]
async fn test_uppercase_function_wraps_formatted_prompt() {
    let (generator, calls) = counting_upper();
    let response = generator
        .generate(&user_hi(), &GenerationConfig::default())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.text, vec![Message::system("USER: HI\n")]);
    assert!(response.logprobs.is_empty());
    assert!(response.usage.is_empty());
    assert!(response.config.is_empty());
}

#[tokio::test]
async fn test_second_identical_call_is_served_from_cache() {
    let (generator, calls) = counting_upper();
    let config = GenerationConfig::default();

    let first = generator.generate(&user_hi(), &config).await.unwrap();
    let second = generator.generate(&user_hi(), &config).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    let stats = generator.cache().stats();
    assert_eq!((stats.hits, stats.misses, stats.sets), (1, 1, 1));
}

#[tokio::test]
async fn test_config_change_misses_cache() {
    let (generator, calls) = counting_upper();
    let base = GenerationConfig::default();

    generator.generate(&user_hi(), &base).await.unwrap();
    generator
        .generate(&user_hi(), &base.clone().with_temperature(0.9))
        .await
        .unwrap();
    generator
        .generate(&user_hi(), &base.clone().with_model("other"))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_cache_disabled_calls_every_time() {
    let (generator, calls) = counting_upper();
    let config = GenerationConfig::default().with_cache(false);

    for _ in 0..3 {
        generator.generate(&user_hi(), &config).await.unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(generator.cache().len().await.unwrap(), 0);
    assert_eq!(generator.cache().stats().misses, 0);
}

#[tokio::test]
async fn test_text_prompt_is_passed_verbatim() {
    let seen = Arc::new(std::sync::Mutex::new(String::new()));
    let sink = seen.clone();
    let generator = CustomGenerator::new(infallible(move |p: &str| {
        *sink.lock().unwrap() = p.to_string();
        "ok".to_string()
    }));

    generator
        .generate(&Prompt::from("already: formatted"), &GenerationConfig::default())
        .await
        .unwrap();

    assert_eq!(seen.lock().unwrap().as_str(), "already: formatted");
}

#[tokio::test]
async fn test_text_and_equivalent_messages_share_a_cache_entry() {
    let (generator, calls) = counting_upper();
    let config = GenerationConfig::default();

    generator.generate(&user_hi(), &config).await.unwrap();
    generator
        .generate(&Prompt::from("user: hi\n"), &config)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_function_error_propagates_and_nothing_is_cached() {
    let generator = CustomGenerator::builder(|_: &str| {
        Err::<String, _>(std::io::Error::new(std::io::ErrorKind::Other, "backend down"))
    })
    .provider("flaky")
    .build();

    let err = generator
        .generate(&user_hi(), &GenerationConfig::default())
        .await
        .unwrap_err();

    match &err {
        Error::Generation { provider, .. } => assert_eq!(provider, "flaky"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("backend down"));
    assert_eq!(generator.cache().stats().sets, 0);
}

struct BrokenBackend;

#[async_trait]
impl CacheBackend for BrokenBackend {
    async fn get(&self, _: &CacheKey) -> ai_lib_textgen::Result<Option<Vec<u8>>> {
        Err(Error::cache_with_context("unreachable", Default::default()))
    }
    async fn set(&self, _: &CacheKey, _: &[u8], _: Option<Duration>) -> ai_lib_textgen::Result<()> {
        Err(Error::cache_with_context("unreachable", Default::default()))
    }
    async fn delete(&self, _: &CacheKey) -> ai_lib_textgen::Result<bool> {
        Ok(false)
    }
    async fn exists(&self, _: &CacheKey) -> ai_lib_textgen::Result<bool> {
        Ok(false)
    }
    async fn clear(&self) -> ai_lib_textgen::Result<()> {
        Ok(())
    }
    async fn len(&self) -> ai_lib_textgen::Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn test_cache_backend_error_propagates_without_calling_function() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let generator = CustomGenerator::builder(infallible(move |p: &str| {
        seen.fetch_add(1, Ordering::SeqCst);
        p.to_string()
    }))
    .cache(Arc::new(CacheManager::new(
        CacheConfig::new(),
        Box::new(BrokenBackend),
    )))
    .build();

    let err = generator
        .generate(&user_hi(), &GenerationConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cache { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // with caching off the broken backend is never touched
    let ok = generator
        .generate(&user_hi(), &GenerationConfig::default().with_cache(false))
        .await
        .unwrap();
    assert_eq!(ok.first_text(), Some("user: hi\n"));
}

#[tokio::test]
async fn test_disk_cache_survives_generator_restart() {
    let dir = std::env::temp_dir().join(format!("textgen-it-{}", uuid::Uuid::new_v4()));
    let config = GenerationConfig::default();
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let seen = calls.clone();
        let cache = CacheManager::new(
            CacheConfig::new().with_key_prefix("disk-test"),
            Box::new(DiskCache::open(&dir).await.unwrap()),
        );
        let generator = CustomGenerator::builder(infallible(move |p: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
            p.to_uppercase()
        }))
        .cache(Arc::new(cache))
        .build();
        let response = generator.generate(&user_hi(), &config).await.unwrap();
        assert_eq!(response.first_text(), Some("USER: HI\n"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_generators_sharing_a_manager_share_entries() {
    let shared = Arc::new(CacheManager::new(
        CacheConfig::new().with_key_prefix("shared"),
        Box::new(MemoryCache::new(16)),
    ));
    let first = CustomGenerator::builder(infallible(|_: &str| "first".to_string()))
        .cache(shared.clone())
        .build();
    let second = CustomGenerator::builder(infallible(|_: &str| "second".to_string()))
        .cache(shared)
        .build();

    let config = GenerationConfig::default();
    first.generate(&user_hi(), &config).await.unwrap();
    // same manager, same fingerprint: the second generator reads the first's entry
    let r = second.generate(&user_hi(), &config).await.unwrap();
    assert_eq!(r.first_text(), Some("first"));
}

#[tokio::test]
async fn test_generators_are_usable_as_trait_objects() {
    let generators: Vec<Arc<dyn TextGenerator>> = vec![
        Arc::new(CustomGenerator::new(infallible(|p: &str| p.len().to_string()))),
        Arc::new(
            CustomGenerator::builder(infallible(|_: &str| "x".to_string()))
                .provider("fixed")
                .build(),
        ),
    ];

    let mut out: Vec<GenerationResponse> = Vec::new();
    for g in &generators {
        out.push(g.generate_default(&user_hi()).await.unwrap());
    }
    assert_eq!(out[0].first_text(), Some("9"));
    assert_eq!(generators[1].provider(), "fixed");
    assert_eq!(generators[0].count_tokens(&Prompt::from("abcd")), 1);
}

#[tokio::test]
async fn test_large_responses_are_cached_by_default() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let generator = CustomGenerator::new(infallible(move |_: &str| {
        seen.fetch_add(1, Ordering::SeqCst);
        "y".repeat(11 * 1024 * 1024)
    }));
    let config = GenerationConfig::default();

    generator.generate(&user_hi(), &config).await.unwrap();
    let again = generator.generate(&user_hi(), &config).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(again.first_text().map(str::len), Some(11 * 1024 * 1024));
}

#[tokio::test]
async fn test_corrupt_cached_entry_is_an_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let cache = Arc::new(CacheManager::new(
        CacheConfig::new().with_key_prefix("custom"),
        Box::new(MemoryCache::new(16)),
    ));
    let generator = CustomGenerator::builder(infallible(move |p: &str| {
        seen.fetch_add(1, Ordering::SeqCst);
        p.to_string()
    }))
    .cache(cache.clone())
    .build();

    let config = GenerationConfig::default();
    let key = CacheKeyGenerator::new().generate("user: hi\n", &config).unwrap();
    cache.set(&key, &"not a response").await.unwrap();

    let err = generator.generate(&user_hi(), &config).await.unwrap_err();
    assert!(matches!(err, Error::Cache { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_identical_requests_on_disk_cache_all_succeed() {
    let dir = std::env::temp_dir().join(format!("textgen-race-{}", uuid::Uuid::new_v4()));
    let cache = CacheManager::new(
        CacheConfig::new().with_key_prefix("race"),
        Box::new(DiskCache::open(&dir).await.unwrap()),
    );
    let generator = Arc::new(
        CustomGenerator::builder(infallible(|p: &str| p.to_uppercase()))
            .cache(Arc::new(cache))
            .build(),
    );

    for _ in 0..5 {
        generator.cache().clear().await.unwrap();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let g = generator.clone();
            handles.push(tokio::spawn(async move {
                g.generate(&user_hi(), &GenerationConfig::default()).await
            }));
        }
        for h in handles {
            let response = h.await.unwrap().unwrap();
            assert_eq!(response.first_text(), Some("USER: HI\n"));
        }
    }

    assert_eq!(generator.cache().len().await.unwrap(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}
