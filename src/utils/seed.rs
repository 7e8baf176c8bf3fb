//! # Seed Scope
//!
//! Deterministic, nestable random number source keyed off a root seed.
//!
//! Every random decision made during path generation goes through [`SeedRng`].
//! Sub-systems never share a raw RNG stream: each one derives its own subseed from
//! the root seed and a purpose label, then enters a [`SeedScope`] for the duration
//! of its work. Leaving the scope restores the outer stream exactly, so adding or
//! removing draws inside one sub-system never shifts the results of another.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

/// Hashes `root + purpose` (plus an attempt suffix when `attempt > 0`) into a subseed.
///
/// # Examples
///
/// ```
/// use wavepath::hash_seed;
///
/// assert_eq!(hash_seed("ABC123", "_rival", 0), hash_seed("ABC123", "_rival", 0));
/// assert_ne!(hash_seed("ABC123", "_rival", 0), hash_seed("ABC123", "_rival", 1));
/// ```
pub fn hash_seed(root: &str, purpose: &str, attempt: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(root.as_bytes());
    hasher.update(purpose.as_bytes());
    if attempt > 0 {
        hasher.update(format!("_{attempt}").as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}

/// Issues collision-free subseeds for one generation run.
///
/// A subseed that was already handed out is never handed out again: on a
/// collision the attempt suffix is incremented until an unused value appears.
#[derive(Debug, Clone)]
pub struct SubseedRegistry {
    root: String,
    issued: BTreeSet<u64>,
}

impl SubseedRegistry {
    /// Creates a registry for the given root seed.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            issued: BTreeSet::new(),
        }
    }

    /// The root seed this registry derives from.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Number of subseeds issued so far.
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    /// Derives a fresh subseed for `purpose`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wavepath::{hash_seed, SubseedRegistry};
    ///
    /// let mut registry = SubseedRegistry::new("ABC123");
    /// let first = registry.derive_subseed("_layers");
    /// let again = registry.derive_subseed("_layers");
    /// assert_eq!(first, hash_seed("ABC123", "_layers", 0));
    /// assert_eq!(again, hash_seed("ABC123", "_layers", 1));
    /// ```
    pub fn derive_subseed(&mut self, purpose: &str) -> u64 {
        let mut attempt = 0;
        loop {
            let candidate = hash_seed(&self.root, purpose, attempt);
            if self.issued.insert(candidate) {
                return candidate;
            }
            attempt += 1;
        }
    }
}

/// Seeded random number source with scoped reseeding.
///
/// Wraps a [`StdRng`] together with the bookkeeping that a scope has to save and
/// restore: the number of draws taken from the current stream, the active seed
/// offset and the active seed override.
#[derive(Debug, Clone)]
pub struct SeedRng {
    rng: StdRng,
    counter: u64,
    offset: u32,
    seed_override: Option<String>,
}

#[derive(Debug)]
struct SavedState {
    rng: StdRng,
    counter: u64,
    offset: u32,
    seed_override: Option<String>,
}

impl SeedRng {
    /// Creates a generator seeded with a numeric seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            counter: 0,
            offset: 0,
            seed_override: None,
        }
    }

    /// Creates a generator seeded from a string root seed.
    pub fn from_root(root: &str) -> Self {
        Self::new(hash_seed(root, "", 0))
    }

    /// Number of draws taken since the current stream was seeded.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Offset of the innermost active scope.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Seed override of the innermost active scope, if any.
    pub fn seed_override(&self) -> Option<&str> {
        self.seed_override.as_deref()
    }

    /// Enters a scope reseeded with `subseed`.
    pub fn enter(&mut self, subseed: u64) -> SeedScope<'_> {
        self.enter_with(subseed, 0, None)
    }

    /// Enters a scope reseeded with `subseed`, shifted by `offset` and optionally
    /// keyed off a different string seed.
    ///
    /// The previous stream and bookkeeping come back when the returned guard is
    /// dropped, on every exit path.
    pub fn enter_with(
        &mut self,
        subseed: u64,
        offset: u32,
        seed_override: Option<&str>,
    ) -> SeedScope<'_> {
        let saved = SavedState {
            rng: self.rng.clone(),
            counter: self.counter,
            offset: self.offset,
            seed_override: self.seed_override.take(),
        };

        let base = match seed_override {
            Some(root) => hash_seed(root, "", 0) ^ subseed,
            None => subseed,
        };
        self.rng = StdRng::seed_from_u64(base.wrapping_add(u64::from(offset) << 8));
        self.counter = 0;
        self.offset = offset;
        self.seed_override = seed_override.map(str::to_string);

        SeedScope {
            rng: self,
            saved: Some(saved),
        }
    }

    /// Runs `f` inside a scope reseeded with `subseed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wavepath::SeedRng;
    ///
    /// let mut rng = SeedRng::new(7);
    /// let inside = rng.with_seed(99, |scoped| scoped.rand_int(1000));
    /// let again = rng.with_seed(99, |scoped| scoped.rand_int(1000));
    /// assert_eq!(inside, again);
    /// ```
    pub fn with_seed<R>(&mut self, subseed: u64, f: impl FnOnce(&mut SeedRng) -> R) -> R {
        let mut scope = self.enter(subseed);
        f(&mut scope)
    }

    /// Uniform integer in `[0, n)`; `0` when `n <= 1`.
    pub fn rand_int(&mut self, n: u32) -> u32 {
        if n <= 1 {
            return 0;
        }
        self.counter += 1;
        self.rng.gen_range(0..n)
    }

    /// Uniform integer in `[min, max)`; `min` when the range is empty or a single value.
    pub fn rand_range(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.rand_int(max - min)
    }

    /// Returns true with `pct` percent probability.
    pub fn rand_chance(&mut self, pct: u32) -> bool {
        self.rand_int(100) + 1 <= pct
    }

    /// Picks one element, or `None` for an empty slice.
    pub fn rand_item<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        match items.len() {
            0 => None,
            1 => items.first(),
            len => items.get(self.rand_int(len as u32) as usize),
        }
    }

    /// Picks an index with probability proportional to its weight.
    ///
    /// Returns `0` when every weight is zero.
    pub fn rand_weighted(&mut self, weights: &[u32]) -> usize {
        let total: u32 = weights.iter().sum();
        if total == 0 {
            return 0;
        }
        let mut roll = self.rand_int(total);
        for (index, &weight) in weights.iter().enumerate() {
            if roll < weight {
                return index;
            }
            roll -= weight;
        }
        weights.len() - 1
    }

    /// Uniform float in `[0, 1)`.
    pub fn rand_float(&mut self) -> f64 {
        self.counter += 1;
        self.rng.gen::<f64>()
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rand_int(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

/// Guard returned by [`SeedRng::enter`]; restores the outer stream on drop.
#[derive(Debug)]
pub struct SeedScope<'a> {
    rng: &'a mut SeedRng,
    saved: Option<SavedState>,
}

impl Deref for SeedScope<'_> {
    type Target = SeedRng;

    fn deref(&self) -> &SeedRng {
        self.rng
    }
}

impl DerefMut for SeedScope<'_> {
    fn deref_mut(&mut self) -> &mut SeedRng {
        self.rng
    }
}

impl Drop for SeedScope<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.rng.rng = saved.rng;
            self.rng.counter = saved.counter;
            self.rng.offset = saved.offset;
            self.rng.seed_override = saved.seed_override;
        }
    }
}
