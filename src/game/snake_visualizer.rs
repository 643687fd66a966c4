//! Draw the session onto a tilemap, one tile per grid cell.

use bevy::prelude::*;
use bevy_ecs_tilemap::map::TilemapId;
use bevy_ecs_tilemap::map::TilemapSize;
use bevy_ecs_tilemap::map::TilemapTexture;
use bevy_ecs_tilemap::map::TilemapTileSize;
use bevy_ecs_tilemap::map::TilemapType;
use bevy_ecs_tilemap::prelude::get_tilemap_center_transform;
use bevy_ecs_tilemap::tiles::TileBundle;
use bevy_ecs_tilemap::tiles::TilePos;
use bevy_ecs_tilemap::tiles::TileStorage;
use bevy_ecs_tilemap::tiles::TileTextureIndex;
use bevy_ecs_tilemap::tiles::TileVisible;
use bevy_ecs_tilemap::TilemapBundle;
use bevy_ecs_tilemap::TilemapPlugin;

use crate::game::assets::{HandleMap, ImageKey};
use crate::game::hud::HUD_HEIGHT;
use crate::game::session::Session;
use crate::settings::Settings;
use crate::snake_game::{GridPoint, RenderState};
use crate::AppSet;

/// Side of one tile in `images/tiles.png`.
const TILE_PIXELS: f32 = 16.0;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(TilemapPlugin);
    app.add_systems(Startup, spawn_board);
    app.add_systems(Update, update_tilemap.after(AppSet::Update));
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum CellKind {
    Empty,
    Head,
    Food,
    Body,
}

/// Index into the tile sheet; `None` leaves the cell blank.
fn tile_texture_index_of_cell_kind(kind: CellKind) -> Option<u32> {
    match kind {
        CellKind::Empty => None,
        CellKind::Head => Some(0),
        CellKind::Food => Some(1),
        CellKind::Body => Some(3),
    }
}

/// Row-major cell kinds for one frame. Food is drawn under the snake.
fn paint(state: &RenderState) -> Vec<CellKind> {
    let n = state.tile_count as usize;
    let mut cells = vec![CellKind::Empty; n * n];
    let index = |pt: GridPoint| pt.y as usize * n + pt.x as usize;
    cells[index(state.food)] = CellKind::Food;
    for pt in state.snake.segments().skip(1) {
        cells[index(pt)] = CellKind::Body;
    }
    cells[index(state.snake.head())] = CellKind::Head;
    cells
}

/// Grid rows grow downward, tilemap rows grow upward.
fn tile_pos_of(x: usize, y: usize, tile_count: usize) -> TilePos {
    TilePos { x: x as u32, y: (tile_count - 1 - y) as u32 }
}

fn spawn_board(mut commands: Commands, settings: Res<Settings>, images: Res<HandleMap<ImageKey>>) {
    let tile_count = settings.tile_count() as u32;
    let map_size = TilemapSize { x: tile_count, y: tile_count };
    let mut tile_storage = TileStorage::empty(map_size);
    let map_type = TilemapType::Square;
    let tilemap_entity = commands.spawn_empty().id();
    for x in 0..map_size.x {
        for y in 0..map_size.y {
            let tile_pos = TilePos { x, y };
            let tile_entity = commands
                .spawn(TileBundle {
                    position: tile_pos,
                    tilemap_id: TilemapId(tilemap_entity),
                    visible: TileVisible(false),
                    ..Default::default()
                })
                .id();
            tile_storage.set(&tile_pos, tile_entity);
        }
    }

    let tile_pixel_size = TilemapTileSize { x: TILE_PIXELS, y: TILE_PIXELS };
    let grid_size = tile_pixel_size.into();
    let scale = settings.cell_pixels as f32 / TILE_PIXELS;
    let mut transform = get_tilemap_center_transform(&map_size, &grid_size, &map_type, 0.0);
    transform.translation.x *= scale;
    transform.translation.y = transform.translation.y * scale - HUD_HEIGHT / 2.0;
    transform.scale = Vec3::new(scale, scale, 1.0);

    commands.entity(tilemap_entity).insert((
        Name::new("Board"),
        TilemapBundle {
            grid_size,
            size: map_size,
            storage: tile_storage,
            map_type,
            texture: TilemapTexture::Single(images[&ImageKey::BoardTiles].clone_weak()),
            tile_size: tile_pixel_size,
            transform,
            ..Default::default()
        },
    ));
}

fn update_tilemap(
    session: Res<Session>,
    tilemap_query: Query<&TileStorage>,
    mut tile_query: Query<(&mut TileTextureIndex, &mut TileVisible)>,
) {
    if !session.is_changed() {
        return;
    }
    let Ok(tile_storage) = tilemap_query.get_single() else {
        return;
    };
    let state = session.render_state();
    let n = state.tile_count as usize;
    for (i, kind) in paint(&state).into_iter().enumerate() {
        let Some(tile) = tile_storage.get(&tile_pos_of(i % n, i / n, n)) else {
            continue;
        };
        let Ok((mut texture_index, mut visible)) = tile_query.get_mut(tile) else {
            continue;
        };
        let index = tile_texture_index_of_cell_kind(kind);
        if visible.0 != index.is_some() {
            visible.0 = index.is_some();
        }
        if let Some(index) = index {
            if texture_index.0 != index {
                texture_index.0 = index;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake_game::{Direction, Rules, SnakeGame};

    #[test]
    fn test_paint_marks_head_body_and_food() {
        let rules = Rules { tile_count: 4, start: GridPoint::new(1, 1), ..Rules::default() };
        let segments = [GridPoint::new(1, 1), GridPoint::new(0, 1)];
        let game = SnakeGame::from_parts(rules, segments, Some(Direction::East), GridPoint::new(3, 2), 1);
        let cells = paint(&game.render_state());
        assert_eq!(CellKind::Head, cells[4 + 1]);
        assert_eq!(CellKind::Body, cells[4]);
        assert_eq!(CellKind::Food, cells[2 * 4 + 3]);
        assert_eq!(13, cells.iter().filter(|kind| **kind == CellKind::Empty).count());
    }

    #[test]
    fn test_rows_flip() {
        assert_eq!(TilePos { x: 2, y: 3 }, tile_pos_of(2, 0, 4));
        assert_eq!(TilePos { x: 0, y: 0 }, tile_pos_of(0, 3, 4));
    }
}
