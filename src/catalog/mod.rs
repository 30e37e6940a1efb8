pub mod payloads;

use rand::Rng;
use serde::Serialize;

pub const VALID_PAGES_GROUP: &str = "Valid Pages";
pub const PATH_TRAVERSAL_GROUP: &str = "Path Traversal";
pub const MALICIOUS_PATHS_GROUP: &str = "Malicious Paths";
pub const SPECIAL_CHARS_GROUP: &str = "Special Characters";
pub const RANDOM_PATHS_GROUP: &str = "Random Paths";

/// Attack categories that get a row in the security summary.
pub const SECURITY_GROUPS: [&str; 3] = [
    PATH_TRAVERSAL_GROUP,
    MALICIOUS_PATHS_GROUP,
    SPECIAL_CHARS_GROUP,
];

pub const DEFAULT_RANDOM_PATH_COUNT: usize = 5;
pub const RANDOM_PATH_MIN_LEN: usize = 100;
pub const RANDOM_PATH_MAX_LEN: usize = 500;

const RANDOM_PATH_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathGroup {
    pub name: String,
    pub paths: Vec<String>,
}

impl PathGroup {
    pub fn new<S: AsRef<str>>(name: &str, paths: &[S]) -> Self {
        Self {
            name: name.to_string(),
            paths: paths.iter().map(|p| p.as_ref().to_string()).collect(),
        }
    }

    pub fn is_security_group(&self) -> bool {
        SECURITY_GROUPS.contains(&self.name.as_str())
    }

    /// Paths in declaration order with repeats removed.
    pub fn distinct_paths(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.paths.len());
        for p in self.paths.iter() {
            if !out.contains(&p.as_str()) {
                out.push(p.as_str());
            }
        }
        out
    }
}

/// Grouped request paths for a single run.
///
/// Built once before dispatch starts. The random group is filled at
/// construction time and never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathCatalog {
    groups: Vec<PathGroup>,
}

impl PathCatalog {
    /// Catalog with the built-in attack lists and `random_path_count`
    /// freshly generated random paths.
    pub fn new<S: AsRef<str>>(valid_pages: &[S], random_path_count: usize) -> Self {
        Self::with_random_paths(valid_pages, generate_random_paths(random_path_count))
    }

    pub fn with_random_paths<S: AsRef<str>>(valid_pages: &[S], random_paths: Vec<String>) -> Self {
        Self {
            groups: vec![
                PathGroup::new(VALID_PAGES_GROUP, valid_pages),
                PathGroup::new(PATH_TRAVERSAL_GROUP, payloads::PATH_TRAVERSAL_ATTEMPTS),
                PathGroup::new(MALICIOUS_PATHS_GROUP, payloads::MALICIOUS_PATHS),
                PathGroup::new(SPECIAL_CHARS_GROUP, payloads::SPECIAL_CHARS),
                PathGroup {
                    name: RANDOM_PATHS_GROUP.to_string(),
                    paths: random_paths,
                },
            ],
        }
    }

    pub fn group(&self, name: &str) -> Option<&PathGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Groups that take part in a run of the given mode, skipping empty ones.
    pub fn active_groups(&self, include_security: bool) -> Vec<&PathGroup> {
        self.groups
            .iter()
            .filter(|g| include_security || g.name == VALID_PAGES_GROUP)
            .filter(|g| !g.paths.is_empty())
            .collect()
    }

    /// Flatten the catalog into the sampling pool. Duplicates are kept, so a
    /// path listed twice is drawn twice as often.
    pub fn expand(&self, include_security: bool) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| include_security || g.name == VALID_PAGES_GROUP)
            .flat_map(|g| g.paths.iter().cloned())
            .collect()
    }
}

pub fn generate_random_path<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(RANDOM_PATH_MIN_LEN..=RANDOM_PATH_MAX_LEN);
    (0..len)
        .map(|_| RANDOM_PATH_ALPHABET[rng.gen_range(0..RANDOM_PATH_ALPHABET.len())] as char)
        .collect()
}

pub fn generate_random_paths(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| generate_random_path(&mut rng)).collect()
}
