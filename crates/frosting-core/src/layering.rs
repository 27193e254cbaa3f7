//! Layering policy for the stage.
//!
//! There is no layering state to store: the stacking rules are re-asserted
//! from scratch after every structural change. The backdrop photo must always
//! be topmost (it occludes the canvas's lower edge), the plinth sits
//! immediately beneath it, grid lines stay at the very back, and user content
//! layers predictably in between. Recomputing from absolute rules instead of
//! patching incrementally means no drift after arbitrary add/remove
//! sequences.

use crate::paint::PaintColor;
use crate::scene::{GridLine, NodeId, NodeRole, NodeVisual, Photo, Plinth, SceneNode, Stage};
use kurbo::Point;

/// Backdrop display width: 8 inches at 96 px/inch.
pub const BACKDROP_DISPLAY_WIDTH: f64 = 8.0 * 96.0;

/// Height of the plinth slab in scene units.
pub const PLINTH_HEIGHT: f64 = 24.0;

/// Regenerate all grid lines for the current viewport and send them to the
/// very back. Old grid lines are always cleared first, never patched.
pub fn regenerate_grid(stage: &mut Stage, grid_size: f64) {
    for id in stage.grid_ids() {
        stage.remove(id);
    }
    if !stage.is_ready() || grid_size <= 0.0 {
        return;
    }

    let viewport = stage.viewport();
    let mut lines = Vec::new();

    // Vertical lines
    let mut x = 0.0;
    while x <= viewport.width {
        lines.push(GridLine {
            start: Point::new(x, 0.0),
            end: Point::new(x, viewport.height),
        });
        x += grid_size;
    }
    // Horizontal lines
    let mut y = 0.0;
    while y <= viewport.height {
        lines.push(GridLine {
            start: Point::new(0.0, y),
            end: Point::new(viewport.width, y),
        });
        y += grid_size;
    }

    let mut ids: Vec<NodeId> = Vec::with_capacity(lines.len());
    for line in lines {
        let midpoint = Point::new(
            (line.start.x + line.end.x) / 2.0,
            (line.start.y + line.end.y) / 2.0,
        );
        ids.push(stage.insert(SceneNode::system(
            NodeRole::Grid,
            midpoint,
            NodeVisual::GridLine(line),
        )));
    }
    // Send to back in reverse so the lines keep their generation order.
    for id in ids.into_iter().rev() {
        stage.send_to_back(id);
    }
}

/// Create or replace the backdrop photo and its plinth for the current
/// viewport, bottom-center anchored.
///
/// Returns the backdrop node id, or `None` when the surface is not ready.
pub fn install_backdrop(
    stage: &mut Stage,
    natural_width: f64,
    natural_height: f64,
) -> Option<NodeId> {
    if let Some(id) = stage.find_role(NodeRole::Backdrop) {
        stage.remove(id);
    }
    if let Some(id) = stage.find_role(NodeRole::Base) {
        stage.remove(id);
    }
    if !stage.is_ready() || natural_width <= 0.0 || natural_height <= 0.0 {
        return None;
    }

    let viewport = stage.viewport();
    let display_scale = BACKDROP_DISPLAY_WIDTH / natural_width;
    let display_height = natural_height * display_scale;
    let center_x = viewport.width / 2.0;
    let top_y = viewport.height - display_height;

    let backdrop = stage.insert(SceneNode::system(
        NodeRole::Backdrop,
        Point::new(center_x, viewport.height - display_height / 2.0),
        NodeVisual::Photo(Photo {
            natural_width,
            natural_height,
            display_scale,
        }),
    ));

    stage.insert(SceneNode::system(
        NodeRole::Base,
        Point::new(center_x, top_y + PLINTH_HEIGHT / 2.0),
        NodeVisual::Plinth(Plinth {
            width: BACKDROP_DISPLAY_WIDTH,
            height: PLINTH_HEIGHT,
            fill: PaintColor::black(),
        }),
    ));

    assert_layering(stage);
    Some(backdrop)
}

/// Re-assert the layering invariant over the whole stack:
/// grid lines at the very back, backdrop topmost, plinth immediately beneath
/// the backdrop, user content in between.
pub fn assert_layering(stage: &mut Stage) {
    let grid = stage.grid_ids();
    for id in grid.into_iter().rev() {
        stage.send_to_back(id);
    }
    if let Some(base) = stage.find_role(NodeRole::Base) {
        stage.bring_to_front(base);
    }
    if let Some(backdrop) = stage.find_role(NodeRole::Backdrop) {
        stage.bring_to_front(backdrop);
    }
}

/// Place newly created user content: inserted immediately beneath the
/// backdrop's current position (above all prior content), then the backdrop
/// is re-pinned so the invariant survives the insertion.
pub fn place_new_content(stage: &mut Stage, id: NodeId) {
    if let Some(backdrop) = stage.find_role(NodeRole::Backdrop) {
        if let Some(index) = stage.z_index_of(backdrop) {
            if index > 0 {
                stage.move_to(id, index);
            }
        }
    }
    assert_layering(stage);
}

/// Top edge of the backdrop in scene coordinates, for overlay alignment.
pub fn backdrop_top_y(stage: &Stage) -> Option<f64> {
    let id = stage.find_role(NodeRole::Backdrop)?;
    let node = stage.get(id)?;
    Some(node.position.y - node.size().height / 2.0)
}
