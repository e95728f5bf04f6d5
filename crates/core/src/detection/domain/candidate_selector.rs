use super::contour::Contour;

/// Picks the contour enclosing the largest area.
///
/// Ties go to the first contour encountered. An empty slice has no
/// candidate.
pub fn select_candidate(contours: &[Contour]) -> Option<&Contour> {
    let mut best: Option<(&Contour, f64)> = None;
    for contour in contours {
        let area = contour.area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best.map(|(contour, _)| contour)
}
