//! Plot palette for the registration views.

use egui::Color32;

/// Layer colors matching the reference rendering
pub mod colors {
    use super::Color32;

    // === Replay layers ===
    pub const SOURCE: Color32 = Color32::from_rgb(255, 69, 0);     // orangered - moving cloud
    pub const TARGET: Color32 = Color32::from_rgb(51, 102, 153);   // #336699 - fixed cloud
    pub const CORRESPONDENCE: Color32 = Color32::from_rgb(150, 150, 150); // grey edges

    // === Grid layers ===
    pub const GRID_LINE: Color32 = Color32::from_rgb(70, 110, 220);
    pub const CELL_POINTS: Color32 = Color32::from_rgb(220, 50, 40);

    pub const TEXT_MUTED: Color32 = Color32::from_rgb(140, 140, 140);
}

/// Map a normalized density value (0..=1) to a dark-to-bright heat color,
/// approximating the reference field rendering.
pub fn density_color(t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    // Three-stop gradient: deep blue -> teal -> yellow
    let (r, g, b) = if t < 0.5 {
        let u = t * 2.0;
        (
            (68.0 * (1.0 - u) + 33.0 * u) as u8,
            (1.0 * (1.0 - u) + 144.0 * u) as u8,
            (84.0 * (1.0 - u) + 140.0 * u) as u8,
        )
    } else {
        let u = (t - 0.5) * 2.0;
        (
            (33.0 * (1.0 - u) + 253.0 * u) as u8,
            (144.0 * (1.0 - u) + 231.0 * u) as u8,
            (140.0 * (1.0 - u) + 37.0 * u) as u8,
        )
    };
    Color32::from_rgb(r, g, b)
}
