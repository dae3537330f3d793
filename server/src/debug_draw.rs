//! Capture of collider geometry for debug-mode clients.

use shared::{ColliderInfo, Color, Vector2};

/// Receives geometry during a debug draw pass. Coordinates are in pixels.
pub trait DebugDrawSink {
    fn solid_polygon(&mut self, vertices: &[Vector2], color: Color);
    fn solid_circle(&mut self, center: Vector2, radius: f32, color: Color);
}

/// A single captured shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeRecord {
    Rectangle { vertices: [Vector2; 4], color: Color },
    Circle {
        center: Vector2,
        radius: f32,
        color: Color,
    },
}

impl ShapeRecord {
    pub fn to_collider_info(&self) -> ColliderInfo {
        match self {
            ShapeRecord::Rectangle { vertices, color } => ColliderInfo::Rectangle {
                vertices: vertices.to_vec(),
                color: *color,
            },
            ShapeRecord::Circle {
                center,
                radius,
                color,
            } => ColliderInfo::Circle {
                position: *center,
                radius: *radius,
                color: *color,
            },
        }
    }
}

/// Sink that keeps every shape of one pass.
#[derive(Debug, Default)]
pub struct ShapeCollector {
    shapes: Vec<ShapeRecord>,
}

impl ShapeCollector {
    pub fn into_shapes(self) -> Vec<ShapeRecord> {
        self.shapes
    }
}

impl DebugDrawSink for ShapeCollector {
    fn solid_polygon(&mut self, vertices: &[Vector2], color: Color) {
        // Only boxes are ever registered, anything else is not a rectangle.
        if let Ok(vertices) = <[Vector2; 4]>::try_from(vertices) {
            self.shapes.push(ShapeRecord::Rectangle { vertices, color });
        }
    }

    fn solid_circle(&mut self, center: Vector2, radius: f32, color: Color) {
        self.shapes.push(ShapeRecord::Circle {
            center,
            radius,
            color,
        });
    }
}
