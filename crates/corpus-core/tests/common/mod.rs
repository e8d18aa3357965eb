//! Shared fixture corpus for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use corpus_core::catalog::VirtualCorpus;
use corpus_core::{
    CancellationToken, Collection, Corpus, CorpusError, Fetcher, Result, VirtualWork,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;

pub const COLTRANE_URL: &str = "http://example.org/coltrane/giantSteps.xml";
pub const REMOTE_TUNES_URL: &str = "http://example.org/misc/tunes.abc";
pub const MISSING_URL: &str = "http://example.org/missing/score.xml";

/// Numbers of the Taiwanese tunes in each archive file.
pub const HAN1_TAIWAN: &[u32] = &[269, 270, 271, 272, 273, 274, 335, 528, 529, 530];
pub const HAN1_SICHUAN: &[u32] = &[1, 2, 600];
pub const HAN2_TAIWAN: std::ops::RangeInclusive<u32> = 204..=220;
pub const HAN2_SICHUAN: &[u32] = &[221, 222];

/// Fetcher serving fixed bodies and counting calls.
#[derive(Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn with_fixture() -> Self {
        let mut bodies = HashMap::new();
        bodies.insert(
            COLTRANE_URL.to_string(),
            musicxml("Giant Steps", "J. Coltrane", 5, "major", &[(4, 4)]).into_bytes(),
        );
        bodies.insert(
            REMOTE_TUNES_URL.to_string(),
            format!(
                "{}{}",
                abc_tune(1, "Remote One", "Europe, Ireland", "6/8", "D"),
                abc_tune(2, "Remote Two", "Europe, Scotland", "9/8", "Ador")
            )
            .into_bytes(),
        );
        Self {
            bodies,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| CorpusError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Fetcher for a host that cannot be reached.
#[derive(Default)]
pub struct OfflineFetcher {
    calls: AtomicUsize,
}

impl OfflineFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CorpusError::Network {
            url: url.to_string(),
            message: "connection refused".to_string(),
        })
    }
}

/// Serves the fixture bodies, cancelling an armed token on the next fetch.
pub struct CancellingFetcher {
    inner: StaticFetcher,
    armed: Mutex<Option<CancellationToken>>,
}

impl CancellingFetcher {
    pub fn new() -> Self {
        Self {
            inner: StaticFetcher::with_fixture(),
            armed: Mutex::new(None),
        }
    }

    pub fn cancel_on_next_fetch(&self, token: CancellationToken) {
        *self.armed.lock().unwrap() = Some(token);
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl Fetcher for CancellingFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let armed = self.armed.lock().unwrap().take();
        if let Some(token) = armed {
            token.cancel();
        }
        self.inner.fetch(url).await
    }
}

pub fn abc_tune(number: u32, title: &str, origin: &str, meter: &str, key: &str) -> String {
    format!(
        "X:{}\nT:{}\nO:{}\nM:{}\nL:1/8\nK:{}\nGA Bc|d2 d2|]\n\n",
        number, title, origin, meter, key
    )
}

pub fn musicxml(title: &str, composer: &str, fifths: i32, mode: &str, times: &[(u32, u32)]) -> String {
    let measures: String = times
        .iter()
        .enumerate()
        .map(|(i, (beats, beat_type))| {
            let key = if i == 0 {
                format!("<key><fifths>{}</fifths><mode>{}</mode></key>", fifths, mode)
            } else {
                String::new()
            };
            format!(
                "<measure number=\"{}\"><attributes>{}<time><beats>{}</beats><beat-type>{}</beat-type></time></attributes></measure>",
                i + 1,
                key,
                beats,
                beat_type
            )
        })
        .collect();

    format!(
        "<?xml version=\"1.0\"?>\n<score-partwise version=\"3.1\">\
         <work><work-title>{}</work-title></work>\
         <identification><creator type=\"composer\">{}</creator></identification>\
         <part id=\"P1\">{}</part></score-partwise>",
        title, composer, measures
    )
}

fn han1() -> String {
    let mut numbers: Vec<u32> = HAN1_TAIWAN.iter().chain(HAN1_SICHUAN).copied().collect();
    numbers.push(300);
    numbers.sort_unstable();

    let mut text = String::from("%abc-2.1\nC:Trad.\n\n");
    for n in numbers {
        let (origin, meter) = if HAN1_TAIWAN.contains(&n) {
            let meter = if n >= 335 { "3/8" } else { "2/4" };
            ("Asia, China, Han, Taiwan", meter)
        } else if HAN1_SICHUAN.contains(&n) {
            ("Asia, China, Han, Sichuan", "2/4")
        } else {
            ("Asia, China, Han, Hunan", "2/4")
        };
        text.push_str(&abc_tune(n, &format!("Han {}", n), origin, meter, "G"));
    }
    text
}

fn han2() -> String {
    let mut text = String::from("%abc-2.1\n\n");
    for n in HAN2_TAIWAN {
        let meter = if n % 2 == 1 { "3/8" } else { "2/4" };
        text.push_str(&abc_tune(n, &format!("Han {}", n), "Asia, China, Han, Taiwan", meter, "C"));
    }
    for &n in HAN2_SICHUAN {
        text.push_str(&abc_tune(n, &format!("Han {}", n), "Asia, China, Han, Sichuan", "2/4", "C"));
    }
    text
}

/// Tunes in 3/8 across both archives.
pub fn three_eight_count() -> usize {
    HAN1_TAIWAN.iter().filter(|n| **n >= 335).count() + HAN2_TAIWAN.filter(|n| n % 2 == 1).count()
}

pub fn write(root: &Path, relative: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Local files of the fixture corpus, relative to its root.
pub fn write_fixture(root: &Path) {
    write(
        root,
        "bach/bwv846/movement1.xml",
        musicxml("Prelude in C", "J.S. Bach", 0, "major", &[(4, 4)]),
    );
    write(
        root,
        "bach/bwv846/movement2.xml",
        musicxml("Fugue in C", "J.S. Bach", 0, "major", &[(4, 4)]),
    );
    write(root, "bach/bwv1.krn", "**kern\n*M4/4\n4c\n*-\n");
    write(
        root,
        "beethoven/opus18no1/movement1.xml",
        musicxml("String Quartet Op. 18 No. 1", "Ludwig van Beethoven", -1, "major", &[(3, 4)]),
    );
    write(root, "essenFolksong/han1.abc", han1());
    write(root, "essenFolksong/han2.abc", han2());
    write(root, "essenFolksong/broken.xml", "<html><body>not a score</body></html>");
    write(root, "handel/hwv56/movement1-01.md", "musedata");
    write(root, "handel/hwv56/movement1-02.md", "musedata");
    write(
        root,
        "josquin/fortunaDunGranTempo.abc",
        "T:Fortuna d'un gran tempo\nC:Josquin des Prez\nM:C\nK:G dor\nG4 A4|]\n",
    );
}

pub fn collections() -> Vec<Collection> {
    vec![
        Collection::new("bach").with_alias("bwv"),
        Collection::new("beethoven"),
        Collection::new("essenFolksong"),
        Collection::new("handel").with_alias("hwv"),
        Collection::new("josquin"),
    ]
}

pub fn virtual_corpus() -> VirtualCorpus {
    let mut corpus = VirtualCorpus::new();
    corpus.register(
        VirtualWork::new("coltrane/giantSteps", COLTRANE_URL, "John Coltrane")
            .unwrap()
            .with_title("Giant Steps"),
    );
    corpus.register(
        VirtualWork::new("misc/remoteTunes", REMOTE_TUNES_URL, "Trad.")
            .unwrap()
            .with_number("2"),
    );
    corpus.register(VirtualWork::new("missing/score", MISSING_URL, "Nobody").unwrap());
    corpus
}

pub struct Fixture {
    pub root: TempDir,
    pub cache: TempDir,
    pub fetcher: Arc<StaticFetcher>,
    pub corpus: Corpus,
}

/// Fixture corpus with caching disabled.
pub async fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    write_fixture(root.path());
    let cache = TempDir::new().unwrap();
    let fetcher = Arc::new(StaticFetcher::with_fixture());
    let corpus = open(root.path(), None, fetcher.clone()).await;
    Fixture {
        root,
        cache,
        fetcher,
        corpus,
    }
}

/// Open a corpus over `root`; `cache_dir` enables the snapshot cache.
pub async fn open(root: &Path, cache_dir: Option<&Path>, fetcher: Arc<dyn Fetcher>) -> Corpus {
    let mut builder = Corpus::builder(root)
        .collections(collections())
        .virtual_corpus(virtual_corpus())
        .fetcher(fetcher)
        .workers(4);
    builder = match cache_dir {
        Some(dir) => builder.cache_dir(dir),
        None => builder.cache_enabled(false),
    };
    builder.build().await.unwrap()
}
