//! End-to-end refresh and lookup flows against in-memory collaborators.

use docdex_cache::CacheConfig;
use docdex_core::{DocLookup, DocResolver, InstallOutcome, ResolverConfig};
use docdex_source::{DocStore, MemoryDocStore, PackageRegistry, PackageSpec};
use docdex_symbol::Inventory;
use docdex_test_utils::{
    location, CountingExtractor, CountingStore, FakeInventories, FakePages, MemoryRegistry,
};
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("docdex=debug")
        .with_test_writer()
        .try_init();
}

struct Harness {
    resolver: DocResolver,
    registry: Arc<MemoryRegistry>,
    inventories: Arc<FakeInventories>,
    pages: Arc<FakePages>,
    extractor: Arc<CountingExtractor>,
    store: Arc<MemoryDocStore>,
}

fn harness(registry: MemoryRegistry, inventories: FakeInventories, pages: FakePages) -> Harness {
    init_tracing();
    let registry = Arc::new(registry);
    let inventories = Arc::new(inventories);
    let pages = Arc::new(pages);
    let extractor = Arc::new(CountingExtractor::new());
    let store = Arc::new(MemoryDocStore::default());
    let config = ResolverConfig::new()
        .with_cache(CacheConfig::default().with_parse_cooldown(Duration::from_millis(1)));
    let resolver = DocResolver::new(
        Arc::clone(&registry) as _,
        Arc::clone(&inventories) as _,
        Arc::clone(&pages) as _,
        Arc::clone(&extractor) as _,
        Arc::clone(&store) as _,
        config,
    );
    Harness {
        resolver,
        registry,
        inventories,
        pages,
        extractor,
        store,
    }
}

fn aiohttp_spec() -> PackageSpec {
    PackageSpec::new(
        "aiohttp",
        "https://docs.aiohttp.org/en/stable/",
        "https://docs.aiohttp.org/en/stable/objects.inv",
    )
}

fn aiohttp_inventory() -> Inventory {
    Inventory::new()
        .with_entry("py:class", "ClientSession", "client.html#aiohttp.ClientSession")
        .with_entry("py:function", "request", "client.html#aiohttp.request")
}

#[tokio::test(start_paused = true)]
async fn refresh_builds_namespace_and_resolves_symbols() {
    let registry = MemoryRegistry::new().with_package(aiohttp_spec());
    let inventories = FakeInventories::new()
        .with_inventory(&aiohttp_spec().inventory_url, aiohttp_inventory());
    let pages =
        FakePages::new().with_page("https://docs.aiohttp.org/en/stable/client.html", "<html>");
    let h = harness(registry, inventories, pages);

    let report = h.resolver.refresh().await.unwrap();
    assert_eq!(report.added, ["aiohttp"]);
    assert!(report.removed.is_empty());
    assert!(report.failed.is_empty());
    assert!(h.resolver.is_ready());
    assert_eq!(
        h.resolver.all_inventories(),
        [("aiohttp".to_owned(), "https://docs.aiohttp.org/en/stable/".to_owned())]
    );

    let lookup = h.resolver.resolve("ClientSession").await.unwrap();
    let doc = lookup.doc().expect("symbol should resolve");
    assert_eq!(
        doc.url,
        "https://docs.aiohttp.org/en/stable/client.html#aiohttp.ClientSession"
    );
    assert_eq!(doc.markdown, format!("docs for `{}`", doc.url));
    assert!(doc.alternates.is_empty());

    assert!(matches!(
        h.resolver.resolve("NoSuchThing").await.unwrap(),
        DocLookup::NotFound
    ));
}

#[tokio::test(start_paused = true)]
async fn priority_package_wins_bare_name_and_reports_alternates() {
    let otherlib = PackageSpec::new(
        "otherlib",
        "https://otherlib.example/",
        "https://otherlib.example/objects.inv",
    );
    let python = PackageSpec::new(
        "python",
        "https://docs.python.org/3/",
        "https://docs.python.org/3/objects.inv",
    );
    // otherlib listed first so it holds "open" when python merges.
    let registry = MemoryRegistry::new().with_package(otherlib.clone()).with_package(python.clone());
    let inventories = FakeInventories::new()
        .with_inventory(
            &otherlib.inventory_url,
            Inventory::new().with_entry("py:function", "open", "api.html#open"),
        )
        .with_inventory(
            &python.inventory_url,
            Inventory::new().with_entry("py:function", "open", "library/functions.html#open"),
        );
    let pages = FakePages::new()
        .with_page("https://otherlib.example/api.html", "<html>")
        .with_page("https://docs.python.org/3/library/functions.html", "<html>");
    let h = harness(registry, inventories, pages);

    h.resolver.refresh().await.unwrap();

    let open = h.resolver.resolve("open").await.unwrap();
    let doc = open.doc().unwrap();
    assert_eq!(doc.location.package(), "python");
    assert_eq!(doc.alternates, ["otherlib.open"]);

    let displaced = h.resolver.resolve("otherlib.open").await.unwrap();
    assert_eq!(displaced.doc().unwrap().location.package(), "otherlib");
}

#[tokio::test(start_paused = true)]
async fn store_is_written_through_and_consulted_first() {
    let registry = MemoryRegistry::new().with_package(aiohttp_spec());
    let inventories = Arc::new(
        FakeInventories::new().with_inventory(&aiohttp_spec().inventory_url, aiohttp_inventory()),
    );
    let pages = Arc::new(
        FakePages::new().with_page("https://docs.aiohttp.org/en/stable/client.html", "<html>"),
    );
    let extractor = Arc::new(CountingExtractor::new());
    let store = Arc::new(CountingStore::new(MemoryDocStore::default()));
    let resolver = DocResolver::new(
        Arc::new(registry) as _,
        inventories as _,
        pages as _,
        Arc::clone(&extractor) as _,
        Arc::clone(&store) as _,
        ResolverConfig::new()
            .with_cache(CacheConfig::default().with_parse_cooldown(Duration::from_millis(1))),
    );

    resolver.refresh().await.unwrap();

    let first = resolver.resolve("ClientSession").await.unwrap();
    let second = resolver.resolve("ClientSession").await.unwrap();
    assert_eq!(first.doc().unwrap().markdown, second.doc().unwrap().markdown);

    // One parse, one write-through; the second lookup came from the store.
    let session = location(
        "aiohttp",
        "class",
        "https://docs.aiohttp.org/en/stable/",
        "client.html",
        "aiohttp.ClientSession",
    );
    assert_eq!(extractor.calls(&session), 1);
    assert!(store.writes() >= 1);
    assert!(store.reads() >= 2);
}

#[tokio::test(start_paused = true)]
async fn remove_package_rebuilds_and_evicts_stored_docs() {
    let yarl = PackageSpec::new(
        "yarl",
        "https://yarl.aio-libs.org/en/latest/",
        "https://yarl.aio-libs.org/en/latest/objects.inv",
    );
    let registry = MemoryRegistry::new().with_package(aiohttp_spec()).with_package(yarl.clone());
    let inventories = FakeInventories::new()
        .with_inventory(&aiohttp_spec().inventory_url, aiohttp_inventory())
        .with_inventory(
            &yarl.inventory_url,
            Inventory::new().with_entry("py:class", "URL", "api.html#yarl.URL"),
        );
    let pages = FakePages::new()
        .with_page("https://docs.aiohttp.org/en/stable/client.html", "<html>")
        .with_page("https://yarl.aio-libs.org/en/latest/api.html", "<html>");
    let h = harness(registry, inventories, pages);

    h.resolver.refresh().await.unwrap();
    assert!(h.resolver.resolve("ClientSession").await.unwrap().is_found());

    let report = h.resolver.remove_package("aiohttp").await.unwrap();
    assert_eq!(report.removed, ["aiohttp"]);
    assert_eq!(h.resolver.package_count(), 1);

    assert!(matches!(
        h.resolver.resolve("ClientSession").await.unwrap(),
        DocLookup::NotFound
    ));
    assert!(h.resolver.resolve("URL").await.unwrap().is_found());

    // The persisted markdown went with the package.
    let session = location(
        "aiohttp",
        "class",
        "https://docs.aiohttp.org/en/stable/",
        "client.html",
        "aiohttp.ClientSession",
    );
    assert!(h.store.get(&session).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn install_package_merges_without_full_rebuild() {
    let registry = MemoryRegistry::new();
    let inventories = FakeInventories::new()
        .with_inventory(&aiohttp_spec().inventory_url, aiohttp_inventory());
    let pages =
        FakePages::new().with_page("https://docs.aiohttp.org/en/stable/client.html", "<html>");
    let h = harness(registry, inventories, pages);

    h.resolver.refresh().await.unwrap();
    assert_eq!(h.resolver.package_count(), 0);

    let outcome = h.resolver.install_package(aiohttp_spec()).await.unwrap();
    assert_eq!(outcome, InstallOutcome::Refreshed);
    assert!(h.resolver.resolve("ClientSession").await.unwrap().is_found());
    assert_eq!(h.registry.list_packages().await.unwrap().len(), 1);

    // Unreachable inventory: registered, recorded, rescheduled.
    let broken = PackageSpec::new(
        "broken",
        "https://broken.example/",
        "https://broken.example/objects.inv",
    );
    let outcome = h.resolver.install_package(broken).await.unwrap();
    assert_eq!(outcome, InstallOutcome::FetchRescheduled);
    assert_eq!(h.resolver.package_count(), 2);
    assert_eq!(
        h.inventories.fetch_attempts("https://broken.example/objects.inv"),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn refresh_reports_the_package_diff() {
    let yarl = PackageSpec::new(
        "yarl",
        "https://yarl.aio-libs.org/en/latest/",
        "https://yarl.aio-libs.org/en/latest/objects.inv",
    );
    let registry = MemoryRegistry::new().with_package(aiohttp_spec());
    let inventories = FakeInventories::new()
        .with_inventory(&aiohttp_spec().inventory_url, aiohttp_inventory())
        .with_inventory(
            &yarl.inventory_url,
            Inventory::new().with_entry("py:class", "URL", "api.html#yarl.URL"),
        );
    let pages = FakePages::new();
    let h = harness(registry, inventories, pages);

    let report = h.resolver.refresh().await.unwrap();
    assert_eq!(report.added, ["aiohttp"]);

    h.registry.add_package(yarl).await.unwrap();
    h.registry.remove_package("aiohttp").await.unwrap();

    let report = h.resolver.refresh().await.unwrap();
    assert_eq!(report.added, ["yarl"]);
    assert_eq!(report.removed, ["aiohttp"]);
    assert!(h.extractor.total_calls() == 0, "no lookups, no parsing");
    assert_eq!(h.pages.fetch_attempts("https://docs.aiohttp.org/en/stable/client.html"), 0);
}
