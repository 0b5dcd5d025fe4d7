// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Sidebearing drags

use super::edit_types::Edit;
use super::item::{Item, ItemKind, SpacingSide};
use crate::model::ConstructedGlyph;
use kurbo::Point;

/// New spacing value for dragging a spacing handle to `target`.
///
/// The value is the spacing override the letter should end up with: the
/// left handle sits at x = 0, the right one at the advance width.
pub fn modify_spacing(glyph: &ConstructedGlyph, item: &Item, target: Point) -> Option<Edit> {
    let ItemKind::Spacing { side } = item.kind else {
        return None;
    };
    let letter = glyph.character()?;
    let value = match side {
        SpacingSide::Left => glyph.spacing_left - glyph.base_spacing_left - target.x,
        SpacingSide::Right => {
            target.x - glyph.advance_width + glyph.spacing_right - glyph.base_spacing_right
        }
    };
    Some(Edit::Spacing {
        side,
        value,
        letter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::glyph::tests::glyph_with;

    #[test]
    fn left_and_right_values() {
        let mut glyph = glyph_with(Vec::new());
        glyph.spacing_left = 45.0;
        glyph.base_spacing_left = 40.0;

        let left = Item::spacing(&glyph, SpacingSide::Left);
        assert_eq!(
            modify_spacing(&glyph, &left, Point::new(-10.0, 3.0)),
            Some(Edit::Spacing {
                side: SpacingSide::Left,
                value: 15.0,
                letter: 'a',
            })
        );

        let right = Item::spacing(&glyph, SpacingSide::Right);
        assert_eq!(
            modify_spacing(&glyph, &right, Point::new(520.0, 0.0)),
            Some(Edit::Spacing {
                side: SpacingSide::Right,
                value: 20.0,
                letter: 'a',
            })
        );
    }

    #[test]
    fn glyph_without_character_is_skipped() {
        let mut glyph = glyph_with(Vec::new());
        glyph.unicode = None;
        let left = Item::spacing(&glyph, SpacingSide::Left);
        assert!(modify_spacing(&glyph, &left, Point::ZERO).is_none());
    }
}
