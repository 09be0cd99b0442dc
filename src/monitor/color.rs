//! Route display colours.

/// Derives a stable display colour for a `FROM>TO` route.
pub trait RouteColor: Send + Sync {
    fn color_for(&self, route: &str) -> String;
}

/// Hashes the route onto the HSL hue wheel at fixed saturation/lightness.
#[derive(Debug, Clone, Copy, Default)]
pub struct HslRouteColor;

impl HslRouteColor {
    const SATURATION: u32 = 60;
    const LIGHTNESS: u32 = 67;
}

impl RouteColor for HslRouteColor {
    fn color_for(&self, route: &str) -> String {
        let hue = crc32fast::hash(route.as_bytes()) % 360;
        format!(
            "hsl({}, {}%, {}%)",
            hue,
            Self::SATURATION,
            Self::LIGHTNESS
        )
    }
}
