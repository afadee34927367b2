use crate::error::{Result, TrainerError};
use crate::layout::{KeyId, Layout};
use rand::Rng;

/// Choose the next key to prompt.
///
/// Candidates are every key of `layout` except `exclude`. When both masked
/// and unmasked candidates exist a fair coin picks the partition first, so
/// the smaller group gets half of the prompts. Otherwise the pick is uniform
/// over all candidates.
pub fn pick<R: Rng + ?Sized>(
    layout: &Layout,
    mask: &[bool],
    exclude: Option<KeyId>,
    rng: &mut R,
) -> Result<(KeyId, char)> {
    if layout.is_empty() {
        return Err(TrainerError::EmptyCandidateSet);
    }
    if mask.len() != layout.len() {
        return Err(TrainerError::InconsistentLayout(format!(
            "mask has {} entries for {} keys",
            mask.len(),
            layout.len()
        )));
    }

    let mut candidates: Vec<usize> = (0..layout.len())
        .filter(|&idx| Some(layout.entries()[idx].0) != exclude)
        .collect();
    // A single-key layout cannot avoid repeating itself
    if candidates.is_empty() {
        candidates = (0..layout.len()).collect();
    }

    let (masked, unmasked): (Vec<usize>, Vec<usize>) =
        candidates.iter().partition(|&&idx| mask[idx]);

    let pool = if masked.is_empty() || unmasked.is_empty() {
        &candidates
    } else if rng.gen_bool(0.5) {
        &masked
    } else {
        &unmasked
    };

    let idx = pool[rng.gen_range(0..pool.len())];
    Ok(layout.entries()[idx])
}
