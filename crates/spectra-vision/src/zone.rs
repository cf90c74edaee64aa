use spectra_types::{snapshot::ZONE_COUNT, Result};

use crate::vision_error;

/// One zone's pixel block, in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The sampled band: 7 equal-height zones stacked vertically, centered in the
/// frame. Zone width is a fifth of the frame width; zone height is a seventh
/// of a fifth of the frame height, both floor divisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneGrid {
    zone_width: u32,
    zone_height: u32,
    start_x: u32,
    start_y: u32,
}

impl ZoneGrid {
    pub fn for_frame(width: u32, height: u32) -> Result<Self> {
        let zone_width = width / 5;
        let zone_height = (height / 5) / ZONE_COUNT as u32;
        if zone_width == 0 || zone_height == 0 {
            return Err(vision_error(format!(
                "frame {width}x{height} is too small to fit the zone band"
            )));
        }
        Ok(Self {
            zone_width,
            zone_height,
            start_x: (width - zone_width) / 2,
            start_y: (height - zone_height * ZONE_COUNT as u32) / 2,
        })
    }

    pub fn zone_width(&self) -> u32 {
        self.zone_width
    }

    pub fn zone_height(&self) -> u32 {
        self.zone_height
    }

    /// Zone rects top to bottom.
    pub fn zones(&self) -> impl Iterator<Item = ZoneRect> + '_ {
        (0..ZONE_COUNT as u32).map(|i| ZoneRect {
            x: self.start_x,
            y: self.start_y + i * self.zone_height,
            width: self.zone_width,
            height: self.zone_height,
        })
    }
}
