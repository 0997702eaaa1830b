use serde::{Deserialize, Serialize};

use super::targets::Category;

/// Number of configurable phase weights: one per category plus finalize
pub const PHASE_COUNT: usize = Category::ALL.len() + 1;

/// One step of an orchestrated run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "category")]
pub enum Phase {
    Scan(Category),
    Finalize,
}

impl Phase {
    pub fn label(&self) -> String {
        match self {
            Phase::Scan(category) => format!("Scanning {}", category.name().to_lowercase()),
            Phase::Finalize => "Finalizing".to_string(),
        }
    }

    /// Position of this phase's weight in `TierConfig::phase_weights`
    fn weight_index(&self) -> usize {
        match self {
            Phase::Scan(Category::Cache) => 0,
            Phase::Scan(Category::Logs) => 1,
            Phase::Scan(Category::Downloads) => 2,
            Phase::Scan(Category::Trash) => 3,
            Phase::Finalize => 4,
        }
    }
}

/// Ordered phases of a run with weights normalised to sum to 100
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    scans: Vec<(Category, u8)>,
    finalize: u8,
}

impl PhasePlan {
    /// Plan the given categories (deduplicated, in declared order) plus
    /// finalize. Weights of phases that do not run are dropped before
    /// normalising; missing weights count as zero.
    pub fn new(categories: &[Category], weights: &[u32]) -> Self {
        let mut phases: Vec<Phase> = Category::ALL
            .into_iter()
            .filter(|c| categories.contains(c))
            .map(Phase::Scan)
            .collect();
        phases.push(Phase::Finalize);

        let raw: Vec<u32> = phases
            .iter()
            .map(|p| weights.get(p.weight_index()).copied().unwrap_or(0))
            .collect();
        let shares = normalize_weights(&raw);

        let mut scans = Vec::with_capacity(phases.len() - 1);
        let mut finalize = 0;
        for (phase, share) in phases.into_iter().zip(shares) {
            match phase {
                Phase::Scan(category) => scans.push((category, share)),
                Phase::Finalize => finalize = share,
            }
        }

        Self { scans, finalize }
    }

    pub fn scans(&self) -> &[(Category, u8)] {
        &self.scans
    }

    pub fn finalize_weight(&self) -> u8 {
        self.finalize
    }
}

/// Scale weights to integers summing to exactly 100 using largest
/// remainders. An all-zero input is split evenly.
pub fn normalize_weights(raw: &[u32]) -> Vec<u8> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut weights: Vec<u64> = raw.iter().map(|&w| u64::from(w)).collect();
    if weights.iter().all(|&w| w == 0) {
        weights = vec![1; raw.len()];
    }
    let total: u64 = weights.iter().sum();

    let mut shares: Vec<u64> = weights.iter().map(|w| w * 100 / total).collect();
    let mut remainders: Vec<(usize, u64)> = weights
        .iter()
        .enumerate()
        .map(|(i, w)| (i, w * 100 % total))
        .collect();
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let missing = 100 - shares.iter().sum::<u64>();
    for (i, _) in remainders.into_iter().take(missing as usize) {
        shares[i] += 1;
    }

    shares.into_iter().map(|s| s as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(plan: &PhasePlan) -> u32 {
        plan.scans().iter().map(|(_, w)| *w as u32).sum::<u32>() + plan.finalize_weight() as u32
    }

    #[test]
    fn test_exact_weights_unchanged() {
        assert_eq!(normalize_weights(&[30, 20, 20, 10, 20]), vec![30, 20, 20, 10, 20]);
    }

    #[test]
    fn test_short_sum_scaled_up() {
        // 20 + 15 + 20 + 10 + 20 = 85
        let shares = normalize_weights(&[20, 15, 20, 10, 20]);
        assert_eq!(shares.iter().map(|&s| s as u32).sum::<u32>(), 100);
        assert!(shares[1] < shares[0]);
    }

    #[test]
    fn test_thirds() {
        let shares = normalize_weights(&[1, 1, 1]);
        assert_eq!(shares, vec![34, 33, 33]);
    }

    #[test]
    fn test_all_zero_split_evenly() {
        assert_eq!(normalize_weights(&[0, 0, 0, 0]), vec![25, 25, 25, 25]);
    }

    #[test]
    fn test_huge_weights_do_not_overflow() {
        let shares = normalize_weights(&[u32::MAX, u32::MAX]);
        assert_eq!(shares, vec![50, 50]);
    }

    #[test]
    fn test_plan_all_categories() {
        let plan = PhasePlan::new(&Category::ALL, &[30, 20, 20, 10, 20]);
        assert_eq!(plan.scans().len(), 4);
        assert_eq!(plan.scans()[0], (Category::Cache, 30));
        assert_eq!(plan.finalize_weight(), 20);
        assert_eq!(sum(&plan), 100);
    }

    #[test]
    fn test_skipped_phases_renormalised() {
        let plan = PhasePlan::new(&[Category::Trash, Category::Cache], &[30, 20, 20, 10, 20]);
        let order: Vec<Category> = plan.scans().iter().map(|(c, _)| *c).collect();
        assert_eq!(order, vec![Category::Cache, Category::Trash]);
        assert_eq!(sum(&plan), 100);
    }

    #[test]
    fn test_duplicates_collapse() {
        let plan = PhasePlan::new(&[Category::Logs, Category::Logs], &[1, 1, 1, 1, 1]);
        assert_eq!(plan.scans().len(), 1);
        assert_eq!(sum(&plan), 100);
    }

    #[test]
    fn test_no_categories_is_finalize_only() {
        let plan = PhasePlan::new(&[], &[30, 20, 20, 10, 20]);
        assert!(plan.scans().is_empty());
        assert_eq!(plan.finalize_weight(), 100);
    }

    #[test]
    fn test_missing_weights_count_as_zero() {
        let plan = PhasePlan::new(&Category::ALL, &[50]);
        assert_eq!(plan.scans()[0].1, 100);
        assert_eq!(sum(&plan), 100);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Phase::Scan(Category::Cache).label(), "Scanning user cache");
        assert_eq!(Phase::Finalize.label(), "Finalizing");
    }
}
