use super::contour::Contour;
use super::mask::Mask;

/// Derives region boundaries from a mask.
///
/// Implementations return only the outermost boundary of each connected
/// region; holes and anything nested inside them are ignored. An empty mask
/// yields an empty list. Ordering is stable but carries no meaning.
pub trait ContourExtractor: Send + Sync {
    fn extract(&self, mask: &Mask) -> Vec<Contour>;
}
