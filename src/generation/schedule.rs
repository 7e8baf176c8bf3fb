//! # Special-Wave Scheduler
//!
//! Places the battles every run must offer (rivals, elite four and champion, evil
//! team arcs, major and recovery bosses, milestone battles) onto distinct waves.
//!
//! The run is split into 500-wave segments that are scheduled independently, each
//! category under its own subseed. All categories share one set of claimed waves,
//! so no two special battles ever land on the same wave. A slot whose search runs
//! out of attempts is skipped and recorded; it never aborts the run.

use crate::generation::utils::{percent_window, segments};
use crate::{
    GenerationConfig, Generator, SeedRng, SubseedRegistry, WavepathError, WavepathResult,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attempts a random probe makes before its slot is skipped.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;

/// Percentage windows of a segment for rival stages 1 to 6.
pub const RIVAL_STAGE_WINDOWS: [(u32, u32); 6] =
    [(0, 8), (8, 20), (20, 35), (35, 55), (55, 70), (70, 95)];

/// Rival stage taken by the first rival of a segment; later rivals take the next ones.
pub const FIRST_SCHEDULED_RIVAL_STAGE: u8 = 2;

/// Percentage windows of a segment for the three elite-four sets.
pub const ELITE_FOUR_WINDOWS: [(u32, u32); 3] = [(30, 45), (60, 75), (85, 99)];

/// Contiguous free waves an elite-four set needs.
pub const ELITE_FOUR_BLOCK: u32 = 10;

/// Window of the ordered evil-team arc's grunts.
pub const EVIL_GRUNT_WINDOW: (u32, u32) = (10, 40);

/// Window of the batch evil-team arc.
pub const EVIL_BATCH_WINDOW: (u32, u32) = (50, 95);

/// Window major bosses are drawn from.
pub const MAJOR_BOSS_WINDOW: (u32, u32) = (10, 100);

/// Upper bound of major bosses per segment.
pub const MAJOR_BOSSES_PER_SEGMENT: usize = 5;

/// Recovery bosses land on every multiple of this wave count.
pub const RECOVERY_BOSS_INTERVAL: u32 = 30;

/// Segment-final waves divisible by this hold a milestone battle.
pub const MILESTONE_INTERVAL: u32 = 1000;

/// Number of scheduled rivals for a run length.
pub fn rival_count(total_waves: u32) -> u32 {
    if total_waves <= 500 {
        5
    } else {
        10
    }
}

/// Splits the run's rivals across `segments`, earlier segments taking the remainder.
///
/// # Examples
///
/// ```
/// use wavepath::rivals_per_segment;
///
/// assert_eq!(rivals_per_segment(1500, 3), vec![4, 3, 3]);
/// assert_eq!(rivals_per_segment(500, 1), vec![5]);
/// ```
pub fn rivals_per_segment(total_waves: u32, segments: usize) -> Vec<u32> {
    if segments == 0 {
        return Vec::new();
    }
    let total = rival_count(total_waves);
    let base = total / segments as u32;
    let extra = (total % segments as u32) as usize;
    (0..segments)
        .map(|index| base + u32::from(index < extra))
        .collect()
}

/// Draws `count` distinct rival identities from a pool of `pool_size`.
///
/// The pool is shuffled under the caller's seed, so the same seed always picks the
/// same rivals in the same order.
pub fn select_rivals(pool_size: u32, count: u32, rng: &mut SeedRng) -> Vec<u32> {
    let mut pool: Vec<u32> = (0..pool_size).collect();
    rng.shuffle(&mut pool);
    pool.truncate(count as usize);
    pool
}

/// Minimum distance between two major bosses of one segment.
///
/// # Examples
///
/// ```
/// use wavepath::major_boss_separation;
///
/// assert_eq!(major_boss_separation(500), 65);
/// assert_eq!(major_boss_separation(40), 10);
/// ```
pub fn major_boss_separation(segment_len: u32) -> u32 {
    (segment_len * 13).div_ceil(100).max(10)
}

/// Inclusive wave window of a rival stage (1 to 6) inside a segment.
pub fn rival_stage_window(segment_start: u32, segment_len: u32, stage: u8) -> (u32, u32) {
    let index = usize::from(stage.clamp(1, 6) - 1);
    let (low, high) = RIVAL_STAGE_WINDOWS[index];
    percent_window(segment_start, segment_len, low, high)
}

/// Rival stage whose window contains `wave`, if any.
pub fn rival_stage_for_wave(segment_start: u32, segment_len: u32, wave: u32) -> Option<u8> {
    (1..=6u8).find(|&stage| {
        let (start, end) = rival_stage_window(segment_start, segment_len, stage);
        (start..=end).contains(&wave)
    })
}

/// Categories of scheduled battles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpecialCategory {
    Rival,
    MajorBoss,
    RecoveryBoss,
    EliteFour,
    Champion,
    Milestone,
    EvilGrunt,
    EvilAdmin,
    EvilBoss,
}

impl SpecialCategory {
    /// Whether every route must pass through a battle of this category.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            SpecialCategory::Rival | SpecialCategory::MajorBoss | SpecialCategory::Milestone
        )
    }
}

/// Rival scheduled on a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RivalPlacement {
    pub stage: u8,
    pub rival_id: u32,
    pub corrupted: bool,
}

/// A slot the scheduler had to give up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSlot {
    pub category: SpecialCategory,
    /// Zero-based segment index
    pub segment: u32,
    pub reason: String,
}

/// Evil-team waves by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvilTeamWaves {
    pub grunts: BTreeSet<u32>,
    pub admins: BTreeSet<u32>,
    pub bosses: BTreeSet<u32>,
}

/// Every scheduled special wave, by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialWaveSet {
    pub rival: BTreeSet<u32>,
    pub major_boss: BTreeSet<u32>,
    pub recovery_boss: BTreeSet<u32>,
    pub elite_four: BTreeSet<u32>,
    pub champion: BTreeSet<u32>,
    pub milestone: BTreeSet<u32>,
    pub evil_team: EvilTeamWaves,
    /// Stage and identity of the rival on each rival wave
    pub rival_info: BTreeMap<u32, RivalPlacement>,
    /// Elite-four slot (1 to 4) of each elite-four wave
    pub elite_four_slots: BTreeMap<u32, u8>,
    /// Set index (0 to 2) of each champion wave
    pub champion_sets: BTreeMap<u32, u8>,
    /// Slots that could not be placed
    pub skipped: Vec<SkippedSlot>,
}

impl SpecialWaveSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn category_sets(&self) -> [(SpecialCategory, &BTreeSet<u32>); 9] {
        [
            (SpecialCategory::Rival, &self.rival),
            (SpecialCategory::MajorBoss, &self.major_boss),
            (SpecialCategory::RecoveryBoss, &self.recovery_boss),
            (SpecialCategory::EliteFour, &self.elite_four),
            (SpecialCategory::Champion, &self.champion),
            (SpecialCategory::Milestone, &self.milestone),
            (SpecialCategory::EvilGrunt, &self.evil_team.grunts),
            (SpecialCategory::EvilAdmin, &self.evil_team.admins),
            (SpecialCategory::EvilBoss, &self.evil_team.bosses),
        ]
    }

    /// Category scheduled on `wave`, if any.
    pub fn category_at(&self, wave: u32) -> Option<SpecialCategory> {
        self.category_sets()
            .into_iter()
            .find(|(_, waves)| waves.contains(&wave))
            .map(|(category, _)| category)
    }

    /// Every scheduled wave.
    pub fn all_waves(&self) -> BTreeSet<u32> {
        self.category_sets()
            .into_iter()
            .flat_map(|(_, waves)| waves.iter().copied())
            .collect()
    }

    /// Number of scheduled battles.
    pub fn len(&self) -> usize {
        self.category_sets()
            .iter()
            .map(|(_, waves)| waves.len())
            .sum()
    }

    /// Whether nothing was scheduled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the battle on `wave` must be passed by every route.
    pub fn is_required(&self, wave: u32) -> bool {
        self.category_at(wave)
            .map(SpecialCategory::is_required)
            .unwrap_or(false)
    }

    fn insert(&mut self, category: SpecialCategory, wave: u32) {
        let set = match category {
            SpecialCategory::Rival => &mut self.rival,
            SpecialCategory::MajorBoss => &mut self.major_boss,
            SpecialCategory::RecoveryBoss => &mut self.recovery_boss,
            SpecialCategory::EliteFour => &mut self.elite_four,
            SpecialCategory::Champion => &mut self.champion,
            SpecialCategory::Milestone => &mut self.milestone,
            SpecialCategory::EvilGrunt => &mut self.evil_team.grunts,
            SpecialCategory::EvilAdmin => &mut self.evil_team.admins,
            SpecialCategory::EvilBoss => &mut self.evil_team.bosses,
        };
        set.insert(wave);
    }
}

/// How a placement searches its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    /// Random waves of the window, retried until free
    Probe { attempts: u32 },
    /// Aligned blocks of the window with enough free waves; one block is picked at
    /// random and the waves are drawn from it
    Block { block_len: u32, required_free: usize },
}

/// One request to the placement primitive.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    /// Inclusive wave window
    pub window: (u32, u32),
    /// Waves to place
    pub count: usize,
    pub strategy: PlacementStrategy,
    /// Waves the new ones must keep `min_separation` away from
    pub keep_away_from: &'a [u32],
    pub min_separation: u32,
}

impl<'a> Placement<'a> {
    /// Single wave drawn by random probing.
    pub fn probe(window: (u32, u32)) -> Self {
        Self {
            window,
            count: 1,
            strategy: PlacementStrategy::Probe {
                attempts: MAX_PLACEMENT_ATTEMPTS,
            },
            keep_away_from: &[],
            min_separation: 0,
        }
    }

    /// `count` waves drawn from one aligned block.
    pub fn block(window: (u32, u32), block_len: u32, required_free: usize, count: usize) -> Self {
        Self {
            window,
            count,
            strategy: PlacementStrategy::Block {
                block_len,
                required_free,
            },
            keep_away_from: &[],
            min_separation: 0,
        }
    }

    /// Adds a separation constraint.
    pub fn separated_from(mut self, waves: &'a [u32], min_separation: u32) -> Self {
        self.keep_away_from = waves;
        self.min_separation = min_separation;
        self
    }
}

/// Waves already taken by a special battle.
#[derive(Debug, Clone, Default)]
pub struct WaveClaims {
    claimed: BTreeSet<u32>,
}

impl WaveClaims {
    /// Creates an empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `wave` is still available.
    pub fn is_free(&self, wave: u32) -> bool {
        !self.claimed.contains(&wave)
    }

    /// Claims `wave`; returns false if it was already taken.
    pub fn claim(&mut self, wave: u32) -> bool {
        self.claimed.insert(wave)
    }

    fn is_eligible(&self, wave: u32, request: &Placement<'_>, chosen: &[u32]) -> bool {
        self.is_free(wave)
            && !chosen.contains(&wave)
            && request
                .keep_away_from
                .iter()
                .chain(chosen.iter())
                .all(|&other| other.abs_diff(wave) >= request.min_separation.max(1))
    }

    /// Finds and claims waves for `request`, or claims nothing and returns `None`.
    ///
    /// Returned waves are sorted ascending.
    pub fn place(&mut self, rng: &mut SeedRng, request: Placement<'_>) -> Option<Vec<u32>> {
        let (start, end) = request.window;
        if start > end || request.count == 0 {
            return None;
        }

        let mut chosen = match request.strategy {
            PlacementStrategy::Probe { attempts } => {
                let mut chosen = Vec::with_capacity(request.count);
                for _ in 0..request.count {
                    let mut found = None;
                    for _ in 0..attempts {
                        let wave = rng.rand_range(start, end + 1);
                        if self.is_eligible(wave, &request, &chosen) {
                            found = Some(wave);
                            break;
                        }
                    }
                    chosen.push(found?);
                }
                chosen
            }
            PlacementStrategy::Block {
                block_len,
                required_free,
            } => {
                let block_len = block_len.max(1);
                let mut blocks: Vec<Vec<u32>> = Vec::new();
                let mut block_start = start;
                while block_start + block_len - 1 <= end {
                    let free: Vec<u32> = (block_start..block_start + block_len)
                        .filter(|&wave| self.is_free(wave))
                        .collect();
                    if free.len() >= required_free.max(request.count) {
                        blocks.push(free);
                    }
                    block_start += block_len;
                }
                let index = rng.rand_int(blocks.len() as u32) as usize;
                let mut pool = blocks.into_iter().nth(index)?;

                let mut chosen = Vec::with_capacity(request.count);
                while chosen.len() < request.count && !pool.is_empty() {
                    let pick = rng.rand_int(pool.len() as u32) as usize;
                    let wave = pool.remove(pick);
                    if self.is_eligible(wave, &request, &chosen) {
                        chosen.push(wave);
                    }
                }
                if chosen.len() < request.count {
                    return None;
                }
                chosen
            }
        };

        chosen.sort_unstable();
        for &wave in &chosen {
            self.claim(wave);
        }
        Some(chosen)
    }
}

/// Places special battles for a whole run.
#[derive(Debug, Clone)]
pub struct SpecialWaveScheduler {
    /// Attempts a random probe makes before its slot is skipped
    pub max_placement_attempts: u32,
}

struct SegmentPlan {
    index: u32,
    start: u32,
    end: u32,
}

impl SegmentPlan {
    fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    fn window(&self, (low, high): (u32, u32)) -> (u32, u32) {
        percent_window(self.start, self.len(), low, high)
    }
}

impl SpecialWaveScheduler {
    /// Creates a scheduler with the default attempt budget.
    pub fn new() -> Self {
        Self {
            max_placement_attempts: MAX_PLACEMENT_ATTEMPTS,
        }
    }

    fn probe<'a>(&self, window: (u32, u32)) -> Placement<'a> {
        Placement {
            strategy: PlacementStrategy::Probe {
                attempts: self.max_placement_attempts,
            },
            ..Placement::probe(window)
        }
    }

    /// Schedules every segment of the run, drawing subseeds from `registry`.
    pub fn schedule(
        &self,
        config: &GenerationConfig,
        rng: &mut SeedRng,
        registry: &mut SubseedRegistry,
    ) -> WavepathResult<SpecialWaveSet> {
        config.validate()?;

        let mut set = SpecialWaveSet::new();
        let mut claims = WaveClaims::new();
        let bounds = segments(config.total_waves, config.segment_size);
        let rival_split = rivals_per_segment(config.total_waves, bounds.len());

        let subseed = registry.derive_subseed("_rivalselect");
        let rival_ids = rng.with_seed(subseed, |scoped| {
            select_rivals(config.rival_pool_size, rival_count(config.total_waves), scoped)
        });
        let mut remaining_ids = rival_ids.as_slice();

        for (index, &(start, end)) in bounds.iter().enumerate() {
            let segment = SegmentPlan {
                index: index as u32,
                start,
                end,
            };
            debug!(
                "Scheduling segment {} (waves {}..={})",
                segment.index, segment.start, segment.end
            );

            self.place_milestone(&segment, &mut set, &mut claims);

            let subseed = registry.derive_subseed(&format!("_rival{}", segment.index));
            let take = (rival_split[index] as usize).min(remaining_ids.len());
            let (segment_ids, rest) = remaining_ids.split_at(take);
            remaining_ids = rest;
            rng.with_seed(subseed, |scoped| {
                self.place_rivals(&segment, segment_ids, scoped, &mut set, &mut claims)
            });

            self.place_recovery_bosses(&segment, &mut set, &mut claims);

            for set_index in 0..ELITE_FOUR_WINDOWS.len() {
                let subseed =
                    registry.derive_subseed(&format!("_elite{}_{}", segment.index, set_index));
                rng.with_seed(subseed, |scoped| {
                    self.place_elite_four(&segment, set_index, scoped, &mut set, &mut claims)
                });
            }

            let subseed = registry.derive_subseed(&format!("_evil{}", segment.index));
            rng.with_seed(subseed, |scoped| {
                self.place_ordered_evil_arc(&segment, scoped, &mut set, &mut claims)
            });

            let subseed = registry.derive_subseed(&format!("_evilbatch{}", segment.index));
            rng.with_seed(subseed, |scoped| {
                self.place_batch_evil_arc(&segment, scoped, &mut set, &mut claims)
            });

            let subseed = registry.derive_subseed(&format!("_major{}", segment.index));
            rng.with_seed(subseed, |scoped| {
                self.place_major_bosses(&segment, scoped, &mut set, &mut claims)
            });
        }

        for skipped in &set.skipped {
            warn!(
                "Skipped {:?} slot in segment {}: {}",
                skipped.category, skipped.segment, skipped.reason
            );
        }
        debug!(
            "Scheduled {} special waves ({} skipped slots)",
            set.len(),
            set.skipped.len()
        );
        Ok(set)
    }

    fn skip(set: &mut SpecialWaveSet, category: SpecialCategory, segment: &SegmentPlan, reason: String) {
        set.skipped.push(SkippedSlot {
            category,
            segment: segment.index,
            reason,
        });
    }

    fn place_milestone(&self, segment: &SegmentPlan, set: &mut SpecialWaveSet, claims: &mut WaveClaims) {
        if segment.end % MILESTONE_INTERVAL == 0 && claims.claim(segment.end) {
            set.insert(SpecialCategory::Milestone, segment.end);
        }
    }

    fn place_rivals(
        &self,
        segment: &SegmentPlan,
        rival_ids: &[u32],
        rng: &mut SeedRng,
        set: &mut SpecialWaveSet,
        claims: &mut WaveClaims,
    ) {
        for (slot, &rival_id) in rival_ids.iter().enumerate() {
            let stage = (FIRST_SCHEDULED_RIVAL_STAGE + slot as u8).min(6);
            let window = rival_stage_window(segment.start, segment.len(), stage);
            match claims.place(rng, self.probe(window)) {
                Some(waves) => {
                    let wave = waves[0];
                    set.insert(SpecialCategory::Rival, wave);
                    set.rival_info.insert(
                        wave,
                        RivalPlacement {
                            stage,
                            rival_id,
                            corrupted: segment.index > 0,
                        },
                    );
                }
                None => Self::skip(
                    set,
                    SpecialCategory::Rival,
                    segment,
                    format!("no free wave for stage {stage} in {window:?}"),
                ),
            }
        }
    }

    fn place_recovery_bosses(&self, segment: &SegmentPlan, set: &mut SpecialWaveSet, claims: &mut WaveClaims) {
        let first = segment.start.div_ceil(RECOVERY_BOSS_INTERVAL) * RECOVERY_BOSS_INTERVAL;
        for wave in (first..=segment.end).step_by(RECOVERY_BOSS_INTERVAL as usize) {
            // The final wave belongs to convergence or milestone nodes.
            if wave == 0 || wave == segment.end {
                continue;
            }
            if claims.claim(wave) {
                set.insert(SpecialCategory::RecoveryBoss, wave);
            } else {
                Self::skip(
                    set,
                    SpecialCategory::RecoveryBoss,
                    segment,
                    format!("wave {wave} already claimed"),
                );
            }
        }
    }

    fn place_elite_four(
        &self,
        segment: &SegmentPlan,
        set_index: usize,
        rng: &mut SeedRng,
        set: &mut SpecialWaveSet,
        claims: &mut WaveClaims,
    ) {
        let window = segment.window(ELITE_FOUR_WINDOWS[set_index]);
        let request = Placement::block(window, ELITE_FOUR_BLOCK, ELITE_FOUR_BLOCK as usize, 5);
        let Some(waves) = claims.place(rng, request) else {
            Self::skip(
                set,
                SpecialCategory::EliteFour,
                segment,
                format!("no fully free {ELITE_FOUR_BLOCK}-wave block in {window:?}"),
            );
            return;
        };

        for (slot, &wave) in waves.iter().take(4).enumerate() {
            set.insert(SpecialCategory::EliteFour, wave);
            set.elite_four_slots.insert(wave, slot as u8 + 1);
        }
        set.insert(SpecialCategory::Champion, waves[4]);
        set.champion_sets.insert(waves[4], set_index as u8);
    }

    fn place_ordered_evil_arc(
        &self,
        segment: &SegmentPlan,
        rng: &mut SeedRng,
        set: &mut SpecialWaveSet,
        claims: &mut WaveClaims,
    ) {
        let grunt_window = segment.window(EVIL_GRUNT_WINDOW);
        let Some(grunts) = claims.place(rng, Placement::block(grunt_window, 10, 3, 3)) else {
            Self::skip(
                set,
                SpecialCategory::EvilGrunt,
                segment,
                format!("no block with 3 free waves in {grunt_window:?}"),
            );
            return;
        };
        for &wave in &grunts {
            set.insert(SpecialCategory::EvilGrunt, wave);
        }

        let last_grunt = grunts[grunts.len() - 1];
        let stage_span = (segment.len() * 15 / 100).max(5);
        let admin_window = (last_grunt + 1, (last_grunt + stage_span).min(segment.end));

        match claims.place(rng, self.probe(admin_window)) {
            Some(admin) => {
                set.insert(SpecialCategory::EvilAdmin, admin[0]);
                let boss_window = (admin[0] + 1, (admin[0] + stage_span).min(segment.end));
                match claims.place(rng, self.probe(boss_window)) {
                    Some(boss) => set.insert(SpecialCategory::EvilBoss, boss[0]),
                    None => Self::skip(
                        set,
                        SpecialCategory::EvilBoss,
                        segment,
                        format!("no free wave in {boss_window:?}"),
                    ),
                }
            }
            None => {
                Self::skip(
                    set,
                    SpecialCategory::EvilAdmin,
                    segment,
                    format!("no free wave in {admin_window:?}"),
                );
                let fallback_end = segment.window((0, 90)).1.max(last_grunt + 1);
                let fallback = (last_grunt + 1, fallback_end.min(segment.end));
                match claims.place(rng, self.probe(fallback)) {
                    Some(boss) => set.insert(SpecialCategory::EvilBoss, boss[0]),
                    None => Self::skip(
                        set,
                        SpecialCategory::EvilBoss,
                        segment,
                        format!("no free fallback wave in {fallback:?}"),
                    ),
                }
            }
        }
    }

    fn place_batch_evil_arc(
        &self,
        segment: &SegmentPlan,
        rng: &mut SeedRng,
        set: &mut SpecialWaveSet,
        claims: &mut WaveClaims,
    ) {
        let window = segment.window(EVIL_BATCH_WINDOW);
        let Some(waves) = claims.place(rng, Placement::block(window, 10, 5, 5)) else {
            Self::skip(
                set,
                SpecialCategory::EvilBoss,
                segment,
                format!("no block with 5 free waves in {window:?}"),
            );
            return;
        };
        let roles = [
            SpecialCategory::EvilGrunt,
            SpecialCategory::EvilGrunt,
            SpecialCategory::EvilAdmin,
            SpecialCategory::EvilAdmin,
            SpecialCategory::EvilBoss,
        ];
        for (category, wave) in roles.into_iter().zip(waves) {
            set.insert(category, wave);
        }
    }

    fn place_major_bosses(
        &self,
        segment: &SegmentPlan,
        rng: &mut SeedRng,
        set: &mut SpecialWaveSet,
        claims: &mut WaveClaims,
    ) {
        let window = segment.window(MAJOR_BOSS_WINDOW);
        let separation = major_boss_separation(segment.len());
        let mut placed: Vec<u32> = Vec::new();

        for _ in 0..MAJOR_BOSSES_PER_SEGMENT {
            let request = self.probe(window).separated_from(&placed, separation);
            match claims.place(rng, request) {
                Some(waves) => placed.extend(waves),
                None => Self::skip(
                    set,
                    SpecialCategory::MajorBoss,
                    segment,
                    format!("no wave {separation}+ away from {placed:?} in {window:?}"),
                ),
            }
        }
        for wave in placed {
            set.insert(SpecialCategory::MajorBoss, wave);
        }
    }
}

impl Default for SpecialWaveScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator<SpecialWaveSet> for SpecialWaveScheduler {
    fn generate(&self, config: &GenerationConfig, rng: &mut SeedRng) -> WavepathResult<SpecialWaveSet> {
        let mut registry = SubseedRegistry::new(config.seed.clone());
        self.schedule(config, rng, &mut registry)
    }

    fn validate(&self, set: &SpecialWaveSet, config: &GenerationConfig) -> WavepathResult<()> {
        let all = set.all_waves();
        if all.len() != set.len() {
            return Err(WavepathError::GenerationFailed(
                "Two special battles share a wave".to_string(),
            ));
        }
        if let Some(wave) = all
            .iter()
            .find(|&&wave| wave == 0 || wave > config.total_waves)
        {
            return Err(WavepathError::GenerationFailed(format!(
                "Special wave {wave} is outside the run"
            )));
        }

        for (start, end) in segments(config.total_waves, config.segment_size) {
            let separation = major_boss_separation(end - start + 1);
            let bosses: Vec<u32> = set.major_boss.range(start..=end).copied().collect();
            for pair in bosses.windows(2) {
                if pair[1] - pair[0] < separation {
                    return Err(WavepathError::GenerationFailed(format!(
                        "Major bosses on waves {} and {} are closer than {}",
                        pair[0], pair[1], separation
                    )));
                }
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "SpecialWaveScheduler"
    }
}
