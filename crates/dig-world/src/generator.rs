//! Seeded three-pass site generation.
//!
//! 1. **Skeleton** -- recursively create directories down to `max_depth`.
//! 2. **Population** -- fill every leaf directory with files and debris.
//! 3. **Artifact seeding** -- give each file an artifact with probability
//!    `artifact_density`.
//!
//! All three passes draw from one [`ChaCha8Rng`] seeded once per call, in a
//! fixed order, so `(profile, seed)` fully determines the tree. Every random
//! decision consumes the same number of draws regardless of its outcome.

use std::f64::consts::TAU;

use dig_types::{ArtifactId, NodeId, NodeKind};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::error::WorldError;
use crate::node::NodeTree;
use crate::profile::SiteProfile;

/// Name given to every site's root directory.
pub const ROOT_NAME: &str = "root";

/// Upper bound on corruption assigned at generation time.
const MAX_BASE_CORRUPTION: f64 = 0.99;

/// Builds [`NodeTree`]s from a [`SiteProfile`].
#[derive(Debug, Clone)]
pub struct SiteGenerator {
    profile: SiteProfile,
}

/// Generate a site in one call. See [`SiteGenerator::generate`].
///
/// # Errors
///
/// Propagates [`WorldError`] from tree construction.
pub fn generate(profile: &SiteProfile, seed: u64) -> Result<NodeTree, WorldError> {
    SiteGenerator::new(profile.clone()).generate(seed)
}

impl SiteGenerator {
    /// Wrap a profile. Numeric fields are sanitized here: ratios are
    /// clamped to `[0, 1]`, means and spreads floored at 0.
    pub fn new(profile: SiteProfile) -> Self {
        Self {
            profile: sanitize(profile),
        }
    }

    /// The sanitized profile in use.
    pub const fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Run all three passes with a fresh RNG seeded from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TreeFull`] if the profile asks for more nodes
    /// than the arena can index.
    pub fn generate(&self, seed: u64) -> Result<NodeTree, WorldError> {
        let profile = &self.profile;
        info!(site = %profile.name, theme = %profile.theme, seed, "generating site");

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut tree = NodeTree::with_root(ROOT_NAME);
        let root = tree.root();
        self.stamp(&mut tree, root, &mut rng);

        self.build_skeleton(&mut tree, root, 0, &mut rng)?;
        self.populate(&mut tree, &mut rng)?;
        let artifacts = self.seed_artifacts(&mut tree, &mut rng)?;

        info!(
            nodes = tree.len(),
            directories = tree.count_kind(NodeKind::Directory),
            files = tree.count_kind(NodeKind::File),
            debris = tree.count_kind(NodeKind::Debris),
            artifacts,
            "site generated"
        );
        Ok(tree)
    }

    // -----------------------------------------------------------------------
    // Pass 1: skeleton
    // -----------------------------------------------------------------------

    fn build_skeleton(
        &self,
        tree: &mut NodeTree,
        parent: NodeId,
        depth: u32,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), WorldError> {
        if depth >= self.profile.max_depth {
            return Ok(());
        }
        let branches = bounded_gauss(rng, self.profile.branch_factor, self.profile.branch_spread);
        let mut pool = self.profile.dir_names.clone();
        pool.shuffle(rng);

        for slot in 0..branches {
            let name = pick_name(tree, parent, &pool, slot, "dir");
            let child = tree.add_node(parent, name, NodeKind::Directory)?;
            self.stamp(tree, child, rng);
            self.build_skeleton(tree, child, depth.saturating_add(1), rng)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pass 2: population
    // -----------------------------------------------------------------------

    fn populate(&self, tree: &mut NodeTree, rng: &mut ChaCha8Rng) -> Result<(), WorldError> {
        let leaves: Vec<NodeId> = tree
            .iter()
            .filter(|n| n.is_directory())
            .filter(|n| {
                !n.children()
                    .iter()
                    .any(|c| tree.get(*c).is_some_and(|child| child.is_directory()))
            })
            .map(|n| n.id())
            .collect();

        for leaf in leaves {
            let count = bounded_gauss(rng, self.profile.files_per_dir, self.profile.file_spread);
            let mut file_pool = self.profile.file_names.clone();
            let mut debris_pool = self.profile.debris_names.clone();
            file_pool.shuffle(rng);
            debris_pool.shuffle(rng);

            for slot in 0..count {
                let is_debris = rng.random::<f64>() < self.profile.debris_ratio;
                let (kind, pool, fallback) = if is_debris {
                    (NodeKind::Debris, &debris_pool, "debris")
                } else {
                    (NodeKind::File, &file_pool, "file")
                };
                let name = pick_name(tree, leaf, pool, slot, fallback);
                let child = tree.add_node(leaf, name, kind)?;
                self.stamp(tree, child, rng);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pass 3: artifact seeding
    // -----------------------------------------------------------------------

    fn seed_artifacts(&self, tree: &mut NodeTree, rng: &mut ChaCha8Rng) -> Result<usize, WorldError> {
        let files: Vec<NodeId> = tree.iter().filter(|n| n.is_file()).map(|n| n.id()).collect();
        let mut seeded: usize = 0;
        for (ordinal, id) in files.into_iter().enumerate() {
            if rng.random::<f64>() < self.profile.artifact_density {
                let artifact = ArtifactId::for_theme(&self.profile.theme, ordinal);
                debug!(node = %id, artifact = %artifact, "artifact seeded");
                tree.attach_artifact(id, artifact)?;
                if let Some(node) = tree.get_mut(id) {
                    node.insert_metadata("artifact", "true");
                }
                seeded = seeded.saturating_add(1);
            }
        }
        Ok(seeded)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Apply base corruption (with jitter) and site metadata to a new node.
    fn stamp(&self, tree: &mut NodeTree, id: NodeId, rng: &mut ChaCha8Rng) {
        let profile = &self.profile;
        let noise = rng.random::<f64>().mul_add(2.0, -1.0) * profile.corruption_jitter;
        let corruption = (profile.base_corruption + noise).clamp(0.0, MAX_BASE_CORRUPTION);
        if let Some(node) = tree.get_mut(id) {
            node.set_corruption(corruption);
            node.insert_metadata("theme", profile.theme.as_str());
            node.insert_metadata("site", profile.name.as_str());
        }
    }
}

/// Clamp ratios into `[0, 1]` and floor means/spreads at zero. NaN becomes
/// zero throughout.
fn sanitize(mut profile: SiteProfile) -> SiteProfile {
    let unit = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    let non_negative = |v: f64| if v.is_nan() { 0.0 } else { v.max(0.0) };
    profile.branch_factor = non_negative(profile.branch_factor);
    profile.branch_spread = non_negative(profile.branch_spread);
    profile.files_per_dir = non_negative(profile.files_per_dir);
    profile.file_spread = non_negative(profile.file_spread);
    profile.debris_ratio = unit(profile.debris_ratio);
    profile.artifact_density = unit(profile.artifact_density);
    profile.base_corruption = non_negative(profile.base_corruption).min(MAX_BASE_CORRUPTION);
    profile.corruption_jitter = non_negative(profile.corruption_jitter);
    profile
}

/// Draw a count from a Gaussian (Box-Muller), rounded, floored at 0 and
/// capped at `mean + 3 * sigma`. Always consumes exactly two draws.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bounded_gauss(rng: &mut ChaCha8Rng, mean: f64, sigma: f64) -> usize {
    let u1: f64 = rng.random::<f64>().max(1e-300);
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
    let cap = sigma.mul_add(3.0, mean).round().max(0.0);
    let sample = sigma.mul_add(z, mean).round().clamp(0.0, cap);
    sample as usize
}

/// Pick the `slot`-th name from a shuffled pool, suffixing `_<n>` until it
/// is unique among `parent`'s children.
fn pick_name(tree: &NodeTree, parent: NodeId, pool: &[String], slot: usize, fallback: &str) -> String {
    let base = if pool.is_empty() {
        fallback.to_owned()
    } else {
        pool.get(slot % pool.len())
            .cloned()
            .unwrap_or_else(|| fallback.to_owned())
    };
    let mut name = base.clone();
    let mut suffix = slot;
    while tree.child_named(parent, &name).is_some() {
        name = format!("{base}_{suffix}");
        suffix = suffix.saturating_add(1);
    }
    name
}
